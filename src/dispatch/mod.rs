pub mod blocking;
pub mod queued;

pub use blocking::BlockingFlushHandler;
pub use queued::QueuedFlushHandler;

use crate::buffer::QueueMetrics;
use crate::model::Action;
use crate::notify::{EventNotifier, FailureCause};
use crate::sender::BatchSender;
use crate::stats::Statistics;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// `process`/`flush` after `shutdown`: programmer error, reported to
    /// the offending call site rather than through notifications.
    #[error("dispatcher is shut down")]
    Closed,
    #[error("worker did not stop within the shutdown grace period")]
    ShutdownTimeout,
    #[error("dispatch worker is not running")]
    WorkerUnavailable,
}

/// Routes one observed batch outcome to the notifier and the statistics
/// counters. Shared by both strategies and the worker.
#[derive(Debug, Clone)]
pub struct OutcomeRouter {
    notifier: Arc<EventNotifier>,
    stats: Arc<Statistics>,
}

impl OutcomeRouter {
    pub fn new(notifier: Arc<EventNotifier>, stats: Arc<Statistics>) -> Self {
        Self { notifier, stats }
    }

    pub fn success(&self, actions: Vec<Action>) {
        self.stats.record_succeeded(actions.len() as u64);
        self.notifier.notify_succeeded(&actions);
    }

    pub fn failure(&self, actions: Vec<Action>, cause: FailureCause) {
        warn!(actions = actions.len(), %cause, "delivery failed");
        self.stats.record_failed(actions.len() as u64);
        self.notifier.notify_failed(&actions, &cause);
    }
}

/// The two interchangeable flush strategies behind one surface.
///
/// `Immediate` sends each action inline on the caller's task; `Batched`
/// buffers into a bounded queue drained by a background worker.
pub enum FlushHandler<S: BatchSender> {
    Immediate(BlockingFlushHandler<S>),
    Batched(QueuedFlushHandler),
}

impl<S: BatchSender> FlushHandler<S> {
    /// Hand one action to the pipeline. Never blocks in batched mode; in
    /// immediate mode the call lasts one network round trip.
    pub async fn process(&self, action: Action) -> Result<(), DispatchError> {
        match self {
            Self::Immediate(handler) => handler.process(action).await,
            Self::Batched(handler) => handler.process(action),
        }
    }

    /// Block until every action submitted before this call has been sent or
    /// reported failed. No-op in immediate mode.
    pub async fn flush(&self) -> Result<(), DispatchError> {
        match self {
            Self::Immediate(handler) => handler.flush(),
            Self::Batched(handler) => handler.flush().await,
        }
    }

    /// Stop accepting actions and release resources. Does not flush.
    pub async fn shutdown(&self) -> Result<(), DispatchError> {
        match self {
            Self::Immediate(handler) => handler.shutdown(),
            Self::Batched(handler) => handler.shutdown().await,
        }
    }

    /// Queue counters; `None` in immediate mode, which buffers nothing.
    pub fn queue_metrics(&self) -> Option<QueueMetrics> {
        match self {
            Self::Immediate(_) => None,
            Self::Batched(handler) => Some(handler.queue_metrics()),
        }
    }
}
