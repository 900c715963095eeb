pub mod action;
pub mod options;
pub mod value;

pub use action::{Action, ActionKind};
pub use options::Options;
pub use value::{Properties, PropertyValue, Traits};

use thiserror::Error;

/// Raised synchronously at construction time, before the pipeline ever sees
/// the action. The async path never surfaces these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("please supply a valid userId")]
    EmptyUserId,
    #[error("please supply a valid event name")]
    EmptyEventName,
    #[error("please supply a valid previousId")]
    EmptyPreviousId,
    #[error("please supply a valid writeKey")]
    EmptyWriteKey,
}
