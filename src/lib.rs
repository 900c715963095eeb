#![deny(warnings, rust_2024_compatibility)]
// Specific pedantic lints enforced (not blanket allow):
#![deny(
    clippy::explicit_iter_loop,
    clippy::manual_let_else,
    clippy::semicolon_if_nothing_returned,
    clippy::inconsistent_struct_constructor
)]
// Noisy pedantic lints suppressed with justification:
#![allow(
    clippy::cast_precision_loss,     // Acceptable for metrics/display
    clippy::missing_errors_doc,      // Internal API
    clippy::missing_panics_doc,      // Internal API
    clippy::module_name_repetitions, // e.g. QueueError in queue module
    clippy::must_use_candidate,      // Annotated selectively on critical APIs
    clippy::doc_markdown             // Internal API
)]

pub mod buffer;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod model;
pub mod notify;
pub mod sender;
pub mod stats;

// Re-export main types for easy access
pub use client::{Client, ClientError};
pub use config::{Config, ConfigError, DeliveryMode};
pub use model::{Action, ActionKind, Options, Properties, PropertyValue, Traits, ValidationError};
pub use notify::{EventSubscriber, FailureCause, SubscriptionId};
pub use sender::{BatchSender, HttpSender, SendError};
pub use stats::StatisticsSnapshot;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
