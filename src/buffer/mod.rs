pub mod batch;
pub mod queue;

pub use batch::{Batch, BatchError, BatchFactory};
pub use queue::{ActionQueue, QueueError, QueueMetrics, QueueReceiver, QueueSender};
