pub mod client;
pub mod serialization;

pub use client::{BatchSender, HttpSender};
pub use serialization::{BatchSerializer, SerializationError, SerializedBody};

use std::time::Duration;
use thiserror::Error;

/// Outcome classification for one batch submission. Transient by design:
/// failed sends are reported through notifications and statistics, never
/// retried and never thrown back into the enqueuing call site.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SendError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
    #[error("endpoint returned HTTP {status}")]
    HttpStatus { status: u16 },
    #[error("serialization failed: {0}")]
    Serialization(String),
}
