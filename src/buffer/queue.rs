use crate::model::Action;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use thiserror::Error;
use tokio::sync::mpsc;

/// Rejected insert. Carries the action back so the caller can raise the
/// backpressure notification without cloning on the hot path.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueueError {
    #[error("queue is full")]
    Full(Action),
    #[error("queue is closed")]
    Closed(Action),
}

#[derive(Debug, Clone)]
pub struct QueueMetrics {
    pub capacity: usize,
    pub depth: usize,
    pub enqueued: u64,
    pub dequeued: u64,
    pub dropped: u64,
}

/// Atomic counters shared by both halves of the queue. Depth is tracked here
/// rather than asked of the channel so producers can read it without locks.
#[derive(Debug)]
pub struct QueueMetricsCollector {
    capacity: usize,
    depth: AtomicUsize,
    enqueued: AtomicU64,
    dequeued: AtomicU64,
    dropped: AtomicU64,
}

impl QueueMetricsCollector {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            depth: AtomicUsize::new(0),
            enqueued: AtomicU64::new(0),
            dequeued: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> QueueMetrics {
        QueueMetrics {
            capacity: self.capacity,
            depth: self.depth.load(Ordering::Relaxed),
            enqueued: self.enqueued.load(Ordering::Relaxed),
            dequeued: self.dequeued.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

/// Producer half. Cloneable; `try_enqueue` never blocks — a full queue drops
/// the action and reports `QueueError::Full` so the caller can raise the
/// backpressure notification.
#[derive(Debug, Clone)]
pub struct QueueSender {
    sender: mpsc::Sender<Action>,
    metrics: Arc<QueueMetricsCollector>,
}

impl QueueSender {
    pub fn try_enqueue(&self, action: Action) -> Result<(), QueueError> {
        match self.sender.try_send(action) {
            Ok(()) => {
                self.metrics.enqueued.fetch_add(1, Ordering::Relaxed);
                self.metrics.depth.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(mpsc::error::TrySendError::Full(action)) => {
                self.metrics.dropped.fetch_add(1, Ordering::Relaxed);
                Err(QueueError::Full(action))
            }
            Err(mpsc::error::TrySendError::Closed(action)) => Err(QueueError::Closed(action)),
        }
    }

    pub fn depth(&self) -> usize {
        self.metrics.depth.load(Ordering::Relaxed)
    }

    pub fn metrics(&self) -> QueueMetrics {
        self.metrics.snapshot()
    }
}

/// Consumer half, owned exclusively by the dispatch worker.
#[derive(Debug)]
pub struct QueueReceiver {
    receiver: mpsc::Receiver<Action>,
    metrics: Arc<QueueMetricsCollector>,
}

impl QueueReceiver {
    /// Wait for the next queued action. `None` once every sender is dropped
    /// and the queue is drained.
    pub async fn recv(&mut self) -> Option<Action> {
        let action = self.receiver.recv().await?;
        self.record_dequeue();
        Some(action)
    }

    /// Non-blocking variant used while draining for a flush.
    pub fn try_recv(&mut self) -> Option<Action> {
        let action = self.receiver.try_recv().ok()?;
        self.record_dequeue();
        Some(action)
    }

    fn record_dequeue(&self) {
        self.metrics.dequeued.fetch_add(1, Ordering::Relaxed);
        let current = self.metrics.depth.load(Ordering::Relaxed);
        if current > 0 {
            self.metrics.depth.fetch_sub(1, Ordering::Relaxed);
        }
    }

    pub fn metrics(&self) -> QueueMetrics {
        self.metrics.snapshot()
    }
}

/// Bounded action queue split into producer and consumer halves. Capacity is
/// the backpressure bound: inserts beyond it are dropped, never blocked on.
pub struct ActionQueue;

impl ActionQueue {
    pub fn bounded(capacity: usize) -> (QueueSender, QueueReceiver) {
        assert!(capacity > 0, "queue capacity must be non-zero");

        let (sender, receiver) = mpsc::channel(capacity);
        let metrics = Arc::new(QueueMetricsCollector::new(capacity));

        (
            QueueSender {
                sender,
                metrics: Arc::clone(&metrics),
            },
            QueueReceiver { receiver, metrics },
        )
    }
}
