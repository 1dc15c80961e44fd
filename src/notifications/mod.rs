//! Consumer side of the notification path
//!
//! - `NotificationFeed`: connection state plus the newest-first list of received notifications
//! - `NotificationClient`: WebSocket subscriber with a bounded reconnect policy

mod client;
mod feed;

pub use client::{NotificationClient, ReconnectPolicy};
pub use feed::{ClientNotification, ConnectionState, NotificationFeed};
