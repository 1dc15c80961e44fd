//! Event bus for broadcasting book events to connected subscribers

use super::{BookEvent, EventEmitter};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

/// Default per-subscriber queue capacity
pub const DEFAULT_CAPACITY: usize = 1024;

/// Identifier of one registered subscriber channel
pub type ChannelId = u64;

/// Why an event did not reach one subscriber.
///
/// Never propagated to producers: the bus reports it, the adapter logs it.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("subscriber {0} queue is full, event dropped")]
    Lagged(ChannelId),
    #[error("subscriber {0} is disconnected")]
    Closed(ChannelId),
    #[error("failed to serialize event: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("transport send failed: {0}")]
    Transport(String),
}

/// Outcome of one `publish` call
#[derive(Debug, Default)]
pub struct PublishReport {
    /// Number of subscriber queues the event was placed on
    pub delivered: usize,
    /// One entry per subscriber that did not get the event
    pub failures: Vec<DeliveryError>,
}

impl PublishReport {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }
}

/// A live registration: the channel id plus the receiving half of its queue.
#[derive(Debug)]
pub struct Subscription {
    id: ChannelId,
    receiver: mpsc::Receiver<BookEvent>,
}

impl Subscription {
    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// Wait for the next event. `None` once the bus has deregistered this channel
    /// and the queue is drained.
    pub async fn recv(&mut self) -> Option<BookEvent> {
        self.receiver.recv().await
    }

    /// Take the next queued event without waiting
    pub fn try_recv(&mut self) -> Option<BookEvent> {
        self.receiver.try_recv().ok()
    }
}

#[derive(Debug)]
struct Registry {
    channels: Mutex<HashMap<ChannelId, mpsc::Sender<BookEvent>>>,
    next_id: AtomicU64,
    capacity: usize,
}

/// In-process fan-out from producers to every registered subscriber.
///
/// Each subscriber owns a bounded queue; `publish` only enqueues with
/// `try_send`, so a slow or dead subscriber cannot stall producers or other
/// subscribers. The registry mutex is held for the whole of `subscribe`,
/// `unsubscribe` and `publish`, which makes registration atomic with respect
/// to fan-out and gives all publishes one total order.
///
/// Cloning shares the same registry.
///
/// ```
/// use book_catalog::events::{BookEvent, EventBus};
///
/// # tokio_test::block_on(async {
/// let bus = EventBus::default();
/// let mut sub = bus.subscribe();
///
/// let report = bus.publish(BookEvent::deleted("42"));
/// assert_eq!(report.delivered, 1);
/// assert_eq!(sub.recv().await.unwrap().book_id(), "42");
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct EventBus {
    inner: Arc<Registry>,
}

impl EventBus {
    /// Create a new EventBus whose subscriber queues hold `capacity` events
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Registry {
                channels: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                capacity: capacity.max(1),
            }),
        }
    }

    /// Register a new subscriber channel
    pub fn subscribe(&self) -> Subscription {
        let (sender, receiver) = mpsc::channel(self.inner.capacity);
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.channels.lock().insert(id, sender);
        debug!(channel = id, "Subscriber registered");
        Subscription { id, receiver }
    }

    /// Deregister a channel. Unknown or already removed ids are ignored.
    pub fn unsubscribe(&self, id: ChannelId) {
        if self.inner.channels.lock().remove(&id).is_some() {
            debug!(channel = id, "Subscriber deregistered");
        }
    }

    /// Deliver a copy of `event` to every channel registered right now.
    ///
    /// Channels found closed are deregistered on the spot.
    pub fn publish(&self, event: BookEvent) -> PublishReport {
        let mut channels = self.inner.channels.lock();
        let mut report = PublishReport::default();
        let mut closed = Vec::new();

        for (&id, sender) in channels.iter() {
            match deliver(id, sender, &event) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    if matches!(e, DeliveryError::Closed(_)) {
                        closed.push(id);
                    }
                    report.failures.push(e);
                }
            }
        }

        for id in closed {
            channels.remove(&id);
        }

        report
    }

    /// Number of registered channels
    pub fn subscriber_count(&self) -> usize {
        self.inner.channels.lock().len()
    }

    /// Whether `id` is currently registered
    pub fn is_subscribed(&self, id: ChannelId) -> bool {
        self.inner.channels.lock().contains_key(&id)
    }
}

fn deliver(
    id: ChannelId,
    sender: &mpsc::Sender<BookEvent>,
    event: &BookEvent,
) -> Result<(), DeliveryError> {
    sender.try_send(event.clone()).map_err(|e| match e {
        TrySendError::Full(_) => DeliveryError::Lagged(id),
        TrySendError::Closed(_) => DeliveryError::Closed(id),
    })
}

impl EventEmitter for EventBus {
    fn emit(&self, event: BookEvent) {
        let kind = event.kind();
        let report = self.publish(event);
        debug!(
            event = %kind,
            delivered = report.delivered,
            failed = report.failed(),
            "BookEvent emitted"
        );
        for failure in &report.failures {
            warn!(event = %kind, "Delivery failed: {}", failure);
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;
    use crate::test_helpers::test_book;

    #[test]
    fn test_publish_without_subscriber_is_noop() {
        let bus = EventBus::default();
        let report = bus.publish(BookEvent::deleted("1"));
        assert_eq!(report.delivered, 0);
        assert!(report.failures.is_empty());
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_late_subscriber_gets_no_past_events() {
        let bus = EventBus::default();
        bus.publish(BookEvent::created(test_book("1", "Dune")));

        let mut sub = bus.subscribe();
        assert!(sub.try_recv().is_none());
    }

    #[test]
    fn test_fan_out_to_every_subscriber() {
        let bus = EventBus::default();
        let mut subs: Vec<_> = (0..5).map(|_| bus.subscribe()).collect();
        assert_eq!(bus.subscriber_count(), 5);

        let report = bus.publish(BookEvent::created(test_book("1", "Dune")));
        assert_eq!(report.delivered, 5);

        for sub in subs.iter_mut() {
            let event = sub.try_recv().expect("every subscriber gets the event");
            assert_eq!(event.book().unwrap().title, "Dune");
            assert!(sub.try_recv().is_none(), "exactly one copy");
        }
    }

    #[test]
    fn test_dropped_subscriber_doesnt_affect_others() {
        let bus = EventBus::default();
        let dead = bus.subscribe();
        let dead_id = dead.id();
        let mut alive = bus.subscribe();
        drop(dead);

        let report = bus.publish(BookEvent::deleted("1"));
        assert_eq!(report.delivered, 1);
        assert_eq!(report.failed(), 1);
        assert!(matches!(report.failures[0], DeliveryError::Closed(id) if id == dead_id));
        assert!(!bus.is_subscribed(dead_id));
        assert_eq!(alive.try_recv().unwrap().book_id(), "1");

        // Subsequent events are unaffected
        let report = bus.publish(BookEvent::deleted("2"));
        assert_eq!(report.delivered, 1);
        assert!(report.failures.is_empty());
        assert_eq!(alive.try_recv().unwrap().book_id(), "2");
    }

    #[test]
    fn test_slow_subscriber_only_loses_its_own_events() {
        let bus = EventBus::new(1);
        let mut slow = bus.subscribe();
        let mut fast = bus.subscribe();

        bus.publish(BookEvent::deleted("1"));
        assert_eq!(fast.try_recv().unwrap().book_id(), "1");

        // slow never drained its queue
        let report = bus.publish(BookEvent::deleted("2"));
        assert_eq!(report.delivered, 1);
        assert!(matches!(report.failures[0], DeliveryError::Lagged(id) if id == slow.id()));
        assert_eq!(fast.try_recv().unwrap().book_id(), "2");

        // a lagging subscriber stays registered
        assert!(bus.is_subscribed(slow.id()));
        assert_eq!(slow.try_recv().unwrap().book_id(), "1");
        assert!(slow.try_recv().is_none());
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let bus = EventBus::default();
        let mut sub = bus.subscribe();
        let id = sub.id();

        bus.unsubscribe(id);
        bus.unsubscribe(id);
        bus.unsubscribe(9999);
        assert_eq!(bus.subscriber_count(), 0);

        let report = bus.publish(BookEvent::deleted("1"));
        assert_eq!(report.delivered, 0);
        assert!(report.failures.is_empty());
        assert!(sub.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_recv_ends_after_unsubscribe() {
        let bus = EventBus::default();
        let mut sub = bus.subscribe();
        bus.publish(BookEvent::deleted("1"));
        bus.unsubscribe(sub.id());

        // Already queued events are still drained, then the stream ends
        assert_eq!(sub.recv().await.unwrap().book_id(), "1");
        assert!(sub.recv().await.is_none());
    }

    #[test]
    fn test_clone_shares_registry() {
        let bus = EventBus::default();
        let bus2 = bus.clone();
        let mut sub = bus.subscribe();

        bus2.emit_created(&test_book("5", "Emma"));
        let event = sub.try_recv().unwrap();
        assert_eq!(event.kind(), EventKind::Created);
        assert_eq!(bus2.subscriber_count(), 1);
    }

    #[test]
    fn test_emit_helpers() {
        let bus = EventBus::default();
        let mut sub = bus.subscribe();

        bus.emit_created(&test_book("1", "Dune"));
        bus.emit_updated(&test_book("1", "Dune"));
        bus.emit_deleted("1");

        let kinds: Vec<_> = std::iter::from_fn(|| sub.try_recv()).map(|e| e.kind()).collect();
        assert_eq!(
            kinds,
            vec![EventKind::Created, EventKind::Updated, EventKind::Deleted]
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_publishers_share_one_order() {
        let bus = EventBus::new(4096);
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        let mut handles = Vec::new();
        for producer in 0..4 {
            let bus = bus.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..100 {
                    bus.publish(BookEvent::deleted(format!("{}-{}", producer, i)));
                    tokio::task::yield_now().await;
                }
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        let seq_a: Vec<String> = std::iter::from_fn(|| a.try_recv())
            .map(|e| e.book_id().to_string())
            .collect();
        let seq_b: Vec<String> = std::iter::from_fn(|| b.try_recv())
            .map(|e| e.book_id().to_string())
            .collect();
        assert_eq!(seq_a.len(), 400);
        assert_eq!(seq_a, seq_b);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_subscribe_unsubscribe_keeps_registry_consistent() {
        let bus = EventBus::default();

        let churn: Vec<_> = (0..8)
            .map(|_| {
                let bus = bus.clone();
                tokio::spawn(async move {
                    for _ in 0..200 {
                        let sub = bus.subscribe();
                        tokio::task::yield_now().await;
                        bus.unsubscribe(sub.id());
                    }
                })
            })
            .collect();
        let publisher = {
            let bus = bus.clone();
            tokio::spawn(async move {
                for i in 0..500 {
                    bus.publish(BookEvent::deleted(i.to_string()));
                    tokio::task::yield_now().await;
                }
            })
        };

        for h in churn {
            h.await.unwrap();
        }
        publisher.await.unwrap();
        assert_eq!(bus.subscriber_count(), 0);
    }
}
