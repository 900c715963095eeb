use crate::model::Action;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BatchError {
    #[error("cannot create a batch from zero actions")]
    Empty,
}

/// Ordered, one-shot group of actions sent in a single submission. Stamped
/// with the caller's write key and a creation timestamp; never mutated or
/// split once handed to the sender.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    message_id: String,
    write_key: String,
    sent_at: DateTime<Utc>,
    batch: Vec<Action>,
}

impl Batch {
    pub fn id(&self) -> &str {
        &self.message_id
    }

    pub fn write_key(&self) -> &str {
        &self.write_key
    }

    pub fn sent_at(&self) -> DateTime<Utc> {
        self.sent_at
    }

    pub fn len(&self) -> usize {
        self.batch.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batch.is_empty()
    }

    pub fn actions(&self) -> &[Action] {
        &self.batch
    }

    /// Hand the actions back for outcome routing after the send attempt.
    pub fn into_actions(self) -> Vec<Action> {
        self.batch
    }
}

/// Pure transform from an ordered action sequence into one outbound batch.
/// Never reorders and never mutates individual actions.
#[derive(Debug, Clone)]
pub struct BatchFactory {
    write_key: String,
}

impl BatchFactory {
    pub fn new(write_key: impl Into<String>) -> Self {
        Self {
            write_key: write_key.into(),
        }
    }

    pub fn create(&self, actions: Vec<Action>) -> Result<Batch, BatchError> {
        if actions.is_empty() {
            return Err(BatchError::Empty);
        }

        Ok(Batch {
            message_id: Uuid::new_v4().to_string(),
            write_key: self.write_key.clone(),
            sent_at: Utc::now(),
            batch: actions,
        })
    }

    /// One-element batch for immediate delivery; cannot fail.
    pub fn single(&self, action: Action) -> Batch {
        Batch {
            message_id: Uuid::new_v4().to_string(),
            write_key: self.write_key.clone(),
            sent_at: Utc::now(),
            batch: vec![action],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Properties;

    fn track(n: usize) -> Action {
        Action::track(format!("user-{n}"), "Test Event", Properties::new(), None, None).unwrap()
    }

    #[test]
    fn test_empty_input_fails() {
        let factory = BatchFactory::new("key-1");
        assert_eq!(factory.create(vec![]).unwrap_err(), BatchError::Empty);
    }

    #[test]
    fn test_batch_preserves_enqueue_order() {
        let factory = BatchFactory::new("key-1");
        let batch = factory.create((0..5).map(track).collect()).unwrap();

        assert_eq!(batch.len(), 5);
        for (n, action) in batch.actions().iter().enumerate() {
            assert_eq!(action.user_id(), format!("user-{n}"));
        }
    }

    #[test]
    fn test_batch_is_stamped() {
        let factory = BatchFactory::new("key-1");
        let before = Utc::now();
        let batch = factory.create(vec![track(0)]).unwrap();

        assert_eq!(batch.write_key(), "key-1");
        assert!(!batch.id().is_empty());
        assert!(batch.sent_at() >= before);
    }

    #[test]
    fn test_wire_shape() {
        let factory = BatchFactory::new("key-1");
        let batch = factory.create(vec![track(0), track(1)]).unwrap();
        let json = serde_json::to_value(&batch).unwrap();

        assert_eq!(json["writeKey"], "key-1");
        assert!(json["sentAt"].is_string());
        assert_eq!(json["batch"].as_array().unwrap().len(), 2);
        assert_eq!(json["batch"][0]["action"], "track");
    }

    #[test]
    fn test_distinct_batches_get_distinct_ids() {
        let factory = BatchFactory::new("key-1");
        let a = factory.create(vec![track(0)]).unwrap();
        let b = factory.create(vec![track(1)]).unwrap();
        assert_ne!(a.id(), b.id());
    }
}
