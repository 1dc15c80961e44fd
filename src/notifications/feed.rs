//! Client-side notification feed

use crate::events::{BookEvent, EventKind};
use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;

/// Connection lifecycle as seen by the consumer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

/// One received event, as displayed to the user
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientNotification {
    /// Generated locally, unique within the feed
    pub id: String,
    pub message: String,
    pub kind: EventKind,
    pub received_at: DateTime<Utc>,
}

impl ClientNotification {
    pub fn from_event(event: &BookEvent) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            message: event.message().to_string(),
            kind: event.kind(),
            received_at: Utc::now(),
        }
    }
}

impl fmt::Display for ClientNotification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({})",
            self.kind.label(),
            self.message,
            self.received_at.with_timezone(&Local).format("%H:%M:%S")
        )
    }
}

/// Newest-first list of notifications plus the current connection state.
///
/// Notifications outlive connections: a reconnect never clears the feed.
#[derive(Debug, Default)]
pub struct NotificationFeed {
    notifications: VecDeque<ClientNotification>,
    state: ConnectionState,
    limit: Option<usize>,
}

impl NotificationFeed {
    /// Unbounded feed
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed that keeps at most `limit` notifications, dropping the oldest.
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit.max(1)),
            ..Self::default()
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn on_connecting(&mut self) {
        self.state = ConnectionState::Connecting;
    }

    pub fn on_connected(&mut self) {
        self.state = ConnectionState::Connected;
    }

    pub fn on_disconnected(&mut self) {
        self.state = ConnectionState::Disconnected;
    }

    /// Record an event at the front of the feed and return the new entry.
    pub fn receive(&mut self, event: &BookEvent) -> &ClientNotification {
        self.notifications
            .push_front(ClientNotification::from_event(event));
        if let Some(limit) = self.limit {
            self.notifications.truncate(limit);
        }
        &self.notifications[0]
    }

    /// Notifications, newest first
    pub fn notifications(&self) -> impl Iterator<Item = &ClientNotification> {
        self.notifications.iter()
    }

    pub fn len(&self) -> usize {
        self.notifications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty()
    }
}
