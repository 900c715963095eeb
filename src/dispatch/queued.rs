use super::{DispatchError, OutcomeRouter};
use crate::buffer::{ActionQueue, BatchFactory, QueueError, QueueMetrics, QueueReceiver, QueueSender};
use crate::model::Action;
use crate::notify::FailureCause;
use crate::sender::BatchSender;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

enum WorkerCommand {
    Flush { done: oneshot::Sender<()> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkerState {
    Idle,
    Accumulating,
    Flushing,
    Disposed,
}

/// Buffer-and-batch strategy: `process` appends to a bounded queue and
/// returns immediately; a single long-lived worker task drains the queue
/// into batches and submits them one at a time.
pub struct QueuedFlushHandler {
    queue_tx: QueueSender,
    control_tx: mpsc::UnboundedSender<WorkerCommand>,
    cancel: CancellationToken,
    worker: Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
    router: OutcomeRouter,
    shutdown_grace: Duration,
}

impl QueuedFlushHandler {
    /// Start the background worker. Must be called within a Tokio runtime.
    pub fn spawn<S>(
        factory: BatchFactory,
        sender: S,
        router: OutcomeRouter,
        max_queue_size: usize,
        max_batch_size: usize,
        flush_interval: Duration,
        shutdown_grace: Duration,
    ) -> Self
    where
        S: BatchSender + 'static,
    {
        let (queue_tx, queue_rx) = ActionQueue::bounded(max_queue_size);
        let (control_tx, control_rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        let worker = DispatchWorker {
            queue: queue_rx,
            control: control_rx,
            factory,
            sender,
            router: router.clone(),
            max_batch_size,
            flush_interval,
            cancel: cancel.clone(),
            buffer: Vec::with_capacity(max_batch_size),
            deadline: None,
            state: WorkerState::Idle,
        };
        let handle = tokio::spawn(worker.run());

        Self {
            queue_tx,
            control_tx,
            cancel,
            worker: Mutex::new(Some(handle)),
            closed: AtomicBool::new(false),
            router,
            shutdown_grace,
        }
    }

    /// Non-blocking insert. A full queue drops the action and raises the
    /// backpressure failure synchronously; the caller is never blocked and
    /// never sees an error for a drop.
    pub fn process(&self, action: Action) -> Result<(), DispatchError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(DispatchError::Closed);
        }

        match self.queue_tx.try_enqueue(action) {
            Ok(()) => Ok(()),
            Err(QueueError::Full(action)) => {
                self.router.failure(vec![action], FailureCause::Backpressure);
                Ok(())
            }
            Err(QueueError::Closed(_)) => Err(DispatchError::Closed),
        }
    }

    /// Ask the worker to drain everything already queued and send the
    /// partial buffer even below threshold, then wait for that dispatch's
    /// outcome to be routed. Actions enqueued after this call began are not
    /// guaranteed to be included.
    pub async fn flush(&self) -> Result<(), DispatchError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(DispatchError::Closed);
        }

        let (done_tx, done_rx) = oneshot::channel();
        self.control_tx
            .send(WorkerCommand::Flush { done: done_tx })
            .map_err(|_| DispatchError::WorkerUnavailable)?;
        done_rx.await.map_err(|_| DispatchError::WorkerUnavailable)
    }

    /// Stop the worker without flushing, waiting no longer than the grace
    /// period for it to exit. Idempotent; later `process` calls fail fast.
    pub async fn shutdown(&self) -> Result<(), DispatchError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        debug!("shutting down dispatch worker");
        self.cancel.cancel();

        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            match timeout(self.shutdown_grace, handle).await {
                Ok(_) => Ok(()),
                Err(_) => Err(DispatchError::ShutdownTimeout),
            }
        } else {
            Ok(())
        }
    }

    pub fn queue_metrics(&self) -> QueueMetrics {
        self.queue_tx.metrics()
    }
}

impl Drop for QueuedFlushHandler {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// The single consumer. State machine: Idle -> Accumulating -> Flushing ->
/// Idle, with Disposed terminal on cancellation. At most one batch is in
/// flight at any time, which keeps delivery attempts totally ordered.
struct DispatchWorker<S> {
    queue: QueueReceiver,
    control: mpsc::UnboundedReceiver<WorkerCommand>,
    factory: BatchFactory,
    sender: S,
    router: OutcomeRouter,
    max_batch_size: usize,
    flush_interval: Duration,
    cancel: CancellationToken,
    buffer: Vec<Action>,
    deadline: Option<Instant>,
    state: WorkerState,
}

impl<S: BatchSender> DispatchWorker<S> {
    async fn run(mut self) {
        debug!("dispatch worker started");

        loop {
            let deadline = self.deadline;
            let interval_elapsed = async move {
                match deadline {
                    Some(at) => sleep_until(at).await,
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                biased;

                () = self.cancel.cancelled() => break,

                command = self.control.recv() => {
                    match command {
                        Some(WorkerCommand::Flush { done }) => {
                            self.drain_and_dispatch().await;
                            // Flush caller may have given up; ignore
                            let _ = done.send(());
                        }
                        None => break,
                    }
                }

                action = self.queue.recv() => {
                    match action {
                        Some(action) => self.accumulate(action).await,
                        None => break,
                    }
                }

                () = interval_elapsed => {
                    trace!("flush interval elapsed");
                    self.dispatch_buffer().await;
                }
            }
        }

        self.set_state(WorkerState::Disposed);
        debug!(undelivered = self.buffer.len(), "dispatch worker stopped");
    }

    async fn accumulate(&mut self, action: Action) {
        if self.buffer.is_empty() {
            self.deadline = Some(Instant::now() + self.flush_interval);
            self.set_state(WorkerState::Accumulating);
        }

        self.buffer.push(action);

        if self.buffer.len() >= self.max_batch_size {
            self.dispatch_buffer().await;
        }
    }

    /// Everything queued strictly before the flush command is pulled into
    /// the buffer and sent, batch by batch, before acknowledging.
    async fn drain_and_dispatch(&mut self) {
        while let Some(action) = self.queue.try_recv() {
            self.buffer.push(action);
            if self.buffer.len() >= self.max_batch_size {
                self.dispatch_buffer().await;
            }
        }
        self.dispatch_buffer().await;
    }

    async fn dispatch_buffer(&mut self) {
        self.deadline = None;

        if self.buffer.is_empty() {
            self.set_state(WorkerState::Idle);
            return;
        }

        self.set_state(WorkerState::Flushing);
        let actions = std::mem::take(&mut self.buffer);

        match self.factory.create(actions) {
            Ok(batch) => match self.sender.send(&batch).await {
                Ok(()) => self.router.success(batch.into_actions()),
                Err(error) => self
                    .router
                    .failure(batch.into_actions(), FailureCause::Transport(error)),
            },
            // Empty is the only creation error and the buffer was checked
            // non-empty above, so there is nothing to route here
            Err(error) => warn!(%error, "batch creation failed, nothing dispatched"),
        }

        self.set_state(WorkerState::Idle);
    }

    fn set_state(&mut self, next: WorkerState) {
        if self.state != next {
            trace!(from = ?self.state, to = ?next, "worker state transition");
            self.state = next;
        }
    }
}
