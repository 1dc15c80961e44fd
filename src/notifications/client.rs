//! WebSocket notification client with bounded reconnection

use super::feed::{ClientNotification, NotificationFeed};
use crate::events::BookEvent;
use anyhow::{bail, Result};
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

/// How often and how fast to retry a failed connection.
///
/// `max_attempts` counts consecutive failures; a successful connection resets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_millis(1000),
        }
    }
}

/// Subscribes to `/ws/events` and turns every event into a `ClientNotification`.
#[derive(Debug, Clone)]
pub struct NotificationClient {
    url: String,
    policy: ReconnectPolicy,
}

impl NotificationClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            policy: ReconnectPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Receive events until the reconnect policy gives up.
    ///
    /// Each event is prepended to `feed` and then handed to `on_notification`.
    /// Only returns with an error: after `max_attempts` consecutive failed
    /// connection attempts. Drop the future to stop earlier.
    pub async fn run<F>(&self, feed: &mut NotificationFeed, mut on_notification: F) -> Result<()>
    where
        F: FnMut(&ClientNotification),
    {
        let mut failures: u32 = 0;

        loop {
            feed.on_connecting();
            debug!(url = %self.url, attempt = failures + 1, "Connecting");

            let stream = match connect_async(self.url.as_str()).await {
                Ok((stream, _response)) => stream,
                Err(e) => {
                    feed.on_disconnected();
                    failures += 1;
                    warn!(
                        url = %self.url,
                        attempt = failures,
                        max_attempts = self.policy.max_attempts,
                        "Connection failed: {}",
                        e
                    );
                    if failures >= self.policy.max_attempts {
                        bail!(
                            "Giving up on {} after {} failed attempts: {}",
                            self.url,
                            failures,
                            e
                        );
                    }
                    tokio::time::sleep(self.policy.delay).await;
                    continue;
                }
            };

            failures = 0;
            feed.on_connected();
            info!(url = %self.url, "Connected to notification stream");

            let (mut write, mut read) = stream.split();
            while let Some(msg) = read.next().await {
                match msg {
                    Ok(Message::Text(text)) => {
                        match serde_json::from_str::<BookEvent>(text.as_str()) {
                            Ok(event) => on_notification(feed.receive(&event)),
                            Err(e) => warn!("Ignoring malformed event: {}", e),
                        }
                    }
                    Ok(Message::Ping(data)) => {
                        if let Err(e) = write.send(Message::Pong(data)).await {
                            warn!("Failed to answer ping: {}", e);
                            break;
                        }
                    }
                    Ok(Message::Close(_)) => {
                        debug!("Server closed the connection");
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("Notification stream error: {}", e);
                        break;
                    }
                }
            }

            feed.on_disconnected();
            info!(url = %self.url, "Disconnected, retrying in {:?}", self.policy.delay);
            tokio::time::sleep(self.policy.delay).await;
        }
    }
}
