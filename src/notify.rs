// Success/failure fan-out, decoupled from transport.
//
// Notifications are fired from whichever task observed the outcome: the
// caller's task in immediate mode, the dispatch worker in batched mode.
// They are never buffered or retried; a subscriber added after an event
// fired simply misses it.

use crate::model::Action;
use crate::sender::SendError;
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

/// Why a set of actions failed to reach the endpoint.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FailureCause {
    /// The bounded queue was full at enqueue time; the action was dropped
    /// without ever being sent.
    #[error("queue full, action dropped")]
    Backpressure,
    /// The request sender classified the submission as failed.
    #[error("transport failure: {0}")]
    Transport(#[from] SendError),
}

/// Receives per-action outcome notifications. Implementations must be
/// thread-safe: invocation may happen concurrently and on a background task.
pub trait EventSubscriber: Send + Sync {
    fn succeeded(&self, actions: &[Action]);
    fn failed(&self, actions: &[Action], cause: &FailureCause);
}

/// Handle returned by [`EventNotifier::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
pub struct EventNotifier {
    subscribers: RwLock<Vec<(u64, Arc<dyn EventSubscriber>)>>,
    next_id: AtomicU64,
}

impl EventNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, subscriber: Arc<dyn EventSubscriber>) -> SubscriptionId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers.write().push((id, subscriber));
        SubscriptionId(id)
    }

    /// Remove a subscriber. Returns false if the id was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|(sub_id, _)| *sub_id != id.0);
        subscribers.len() != before
    }

    pub fn notify_succeeded(&self, actions: &[Action]) {
        // Clone out so subscriber callbacks run outside the lock
        let subscribers = self.subscribers.read().clone();
        for (_, subscriber) in subscribers {
            subscriber.succeeded(actions);
        }
    }

    pub fn notify_failed(&self, actions: &[Action], cause: &FailureCause) {
        let subscribers = self.subscribers.read().clone();
        for (_, subscriber) in subscribers {
            subscriber.failed(actions, cause);
        }
    }
}

impl std::fmt::Debug for EventNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventNotifier")
            .field("subscribers", &self.subscribers.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Properties;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct CountingSubscriber {
        succeeded: AtomicUsize,
        failed: AtomicUsize,
    }

    impl EventSubscriber for CountingSubscriber {
        fn succeeded(&self, actions: &[Action]) {
            self.succeeded.fetch_add(actions.len(), Ordering::SeqCst);
        }

        fn failed(&self, actions: &[Action], _cause: &FailureCause) {
            self.failed.fetch_add(actions.len(), Ordering::SeqCst);
        }
    }

    fn actions(n: usize) -> Vec<Action> {
        (0..n)
            .map(|i| {
                Action::track(format!("user-{i}"), "Test Event", Properties::new(), None, None)
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn test_fan_out_to_all_subscribers() {
        let notifier = EventNotifier::new();
        let first = Arc::new(CountingSubscriber::default());
        let second = Arc::new(CountingSubscriber::default());
        notifier.subscribe(first.clone());
        notifier.subscribe(second.clone());

        notifier.notify_succeeded(&actions(3));
        notifier.notify_failed(&actions(2), &FailureCause::Backpressure);

        for subscriber in [&first, &second] {
            assert_eq!(subscriber.succeeded.load(Ordering::SeqCst), 3);
            assert_eq!(subscriber.failed.load(Ordering::SeqCst), 2);
        }
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let notifier = EventNotifier::new();
        let subscriber = Arc::new(CountingSubscriber::default());
        let id = notifier.subscribe(subscriber.clone());

        notifier.notify_succeeded(&actions(1));
        assert!(notifier.unsubscribe(id));
        notifier.notify_succeeded(&actions(1));

        assert_eq!(subscriber.succeeded.load(Ordering::SeqCst), 1);
        assert!(!notifier.unsubscribe(id));
    }

    #[test]
    fn test_no_subscribers_is_a_no_op() {
        let notifier = EventNotifier::new();
        notifier.notify_failed(&actions(1), &FailureCause::Backpressure);
    }
}
