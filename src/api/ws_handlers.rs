//! WebSocket adapter for book change notifications
//!
//! Each connection is one subscriber on the `EventBus`: registered right after
//! the upgrade, removed from the registry as soon as the connection ends.

use super::handlers::{AppError, CatalogState};
use crate::events::{BookEvent, DeliveryError, EventKind};
use axum::{
    extract::{
        ws::{Message, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    response::{IntoResponse, Response},
};
use futures::{Sink, SinkExt, StreamExt};
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;
use tokio::time::{interval, timeout};
use tracing::{debug, warn};

/// Path of the subscription endpoint
pub const WS_EVENTS_PATH: &str = "/ws/events";

/// Query parameters for filtering WebSocket events
#[derive(Debug, Deserialize, Default)]
pub struct WsQuery {
    /// Comma-separated event names to receive (e.g. "book-created,book-deleted")
    pub events: Option<String>,
}

impl WsQuery {
    /// Parse the `events` filter. `None` (absent or blank) means every kind.
    pub fn event_filter(&self) -> Result<Option<HashSet<EventKind>>, String> {
        let Some(raw) = self.events.as_deref() else {
            return Ok(None);
        };
        let kinds = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::parse::<EventKind>)
            .collect::<Result<HashSet<_>, _>>()?;
        Ok((!kinds.is_empty()).then_some(kinds))
    }
}

/// WebSocket upgrade handler for `/ws/events`
///
/// A malformed filter is rejected with 400 before any subscriber is registered.
pub async fn ws_events(
    ws: WebSocketUpgrade,
    State(state): State<CatalogState>,
    Query(query): Query<WsQuery>,
) -> Result<Response, AppError> {
    let filter = query.event_filter().map_err(AppError::BadRequest)?;
    Ok(ws
        .on_upgrade(move |socket| handle_ws(socket, state, filter))
        .into_response())
}

fn passes_filter(event: &BookEvent, filter: &Option<HashSet<EventKind>>) -> bool {
    match filter {
        Some(kinds) => kinds.contains(&event.kind()),
        None => true,
    }
}

/// Serialize one event and push it down the socket.
///
/// A client that stops reading must not pin the connection task in `send`:
/// after `send_timeout` the delivery counts as a transport failure.
async fn deliver<S>(
    sink: &mut S,
    event: &BookEvent,
    send_timeout: Duration,
) -> Result<(), DeliveryError>
where
    S: Sink<Message> + Unpin,
    S::Error: std::fmt::Display,
{
    let json = serde_json::to_string(event)?;
    match timeout(send_timeout, sink.send(Message::Text(json.into()))).await {
        Ok(result) => result.map_err(|e| DeliveryError::Transport(e.to_string())),
        Err(_) => Err(DeliveryError::Transport(format!(
            "send timed out after {:?}",
            send_timeout
        ))),
    }
}

/// Handle an individual WebSocket connection
async fn handle_ws(socket: WebSocket, state: CatalogState, filter: Option<HashSet<EventKind>>) {
    let mut subscription = state.event_bus.subscribe();
    let id = subscription.id();
    let (mut ws_sender, mut ws_receiver) = socket.split();

    let mut ping_interval = interval(state.ping_interval);
    // Skip the first immediate tick
    ping_interval.tick().await;

    debug!(
        subscriber = id,
        filter = ?filter,
        subscribers = state.event_bus.subscriber_count(),
        "WebSocket subscriber connected"
    );

    loop {
        tokio::select! {
            event = subscription.recv() => {
                let Some(event) = event else {
                    debug!(subscriber = id, "Subscription closed");
                    break;
                };
                if !passes_filter(&event, &filter) {
                    continue;
                }
                match deliver(&mut ws_sender, &event, state.ping_interval).await {
                    Ok(()) => {}
                    Err(DeliveryError::Transport(e)) => {
                        debug!(subscriber = id, "WebSocket send failed: {}", e);
                        break;
                    }
                    Err(e) => warn!(subscriber = id, "Skipping event: {}", e),
                }
            }

            _ = ping_interval.tick() => {
                if ws_sender.send(Message::Ping(vec![].into())).await.is_err() {
                    debug!(subscriber = id, "Ping failed, client disconnected");
                    break;
                }
            }

            msg = ws_receiver.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!(subscriber = id, "WebSocket client disconnected");
                        break;
                    }
                    Some(Err(e)) => {
                        debug!(subscriber = id, "WebSocket error: {}", e);
                        break;
                    }
                    // Pongs and client chatter are ignored
                    _ => {}
                }
            }
        }
    }

    state.event_bus.unsubscribe(id);
    debug!(
        subscriber = id,
        subscribers = state.event_bus.subscriber_count(),
        "WebSocket connection closed"
    );
}
