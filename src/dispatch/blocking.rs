use super::{DispatchError, OutcomeRouter};
use crate::buffer::BatchFactory;
use crate::model::Action;
use crate::notify::FailureCause;
use crate::sender::BatchSender;
use std::sync::atomic::{AtomicBool, Ordering};

/// Send-on-enqueue strategy: every action becomes a one-element batch sent
/// inline on the caller's task. Nothing is ever buffered, so `flush` is a
/// no-op and backpressure cannot occur.
pub struct BlockingFlushHandler<S> {
    factory: BatchFactory,
    sender: S,
    router: OutcomeRouter,
    closed: AtomicBool,
}

impl<S: BatchSender> BlockingFlushHandler<S> {
    pub fn new(factory: BatchFactory, sender: S, router: OutcomeRouter) -> Self {
        Self {
            factory,
            sender,
            router,
            closed: AtomicBool::new(false),
        }
    }

    /// Blocking in wall-clock terms: returns only after the send outcome
    /// (success, failure or timeout) has been observed and routed.
    pub async fn process(&self, action: Action) -> Result<(), DispatchError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(DispatchError::Closed);
        }

        let batch = self.factory.single(action);
        match self.sender.send(&batch).await {
            Ok(()) => self.router.success(batch.into_actions()),
            Err(error) => self
                .router
                .failure(batch.into_actions(), FailureCause::Transport(error)),
        }
        Ok(())
    }

    pub fn flush(&self) -> Result<(), DispatchError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(DispatchError::Closed);
        }
        Ok(())
    }

    pub fn shutdown(&self) -> Result<(), DispatchError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
