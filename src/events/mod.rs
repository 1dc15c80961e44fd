//! Book change events for real-time WebSocket notifications
//!
//! This module provides:
//! - `BookEvent` — typed events emitted after every successful mutation
//! - `EventEmitter` — the fire-and-forget seam producers depend on
//! - `EventBus` — the subscriber registry that fans events out to WebSocket clients

mod bus;
mod types;

pub use bus::{ChannelId, DeliveryError, EventBus, PublishReport, Subscription, DEFAULT_CAPACITY};
pub use types::{BookEvent, EventEmitter, EventKind};
