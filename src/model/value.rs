use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One trait/property value. Kept deliberately narrow: the ingestion
/// endpoint accepts strings, numbers, booleans and timestamps.
///
/// Untagged on the wire; variant order matters for deserialization
/// (timestamps are RFC-3339 strings, so they must be tried before `String`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Number(f64),
    Timestamp(DateTime<Utc>),
    String(String),
}

/// Named traits attached to an identify call (`email`, `plan`, ...).
pub type Traits = HashMap<String, PropertyValue>;

/// Named properties attached to a track call (`revenue`, `sku`, ...).
pub type Properties = HashMap<String, PropertyValue>;

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        Self::Number(value as f64)
    }
}

impl From<u32> for PropertyValue {
    fn from(value: u32) -> Self {
        Self::Number(value as f64)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<DateTime<Utc>> for PropertyValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_bare_json_values() {
        assert_eq!(
            serde_json::to_string(&PropertyValue::from("pro")).unwrap(),
            "\"pro\""
        );
        assert_eq!(
            serde_json::to_string(&PropertyValue::from(42i64)).unwrap(),
            "42.0"
        );
        assert_eq!(
            serde_json::to_string(&PropertyValue::from(true)).unwrap(),
            "true"
        );
    }

    #[test]
    fn test_timestamp_round_trip() {
        let ts: DateTime<Utc> = "2024-05-01T12:00:00Z".parse().unwrap();
        let json = serde_json::to_string(&PropertyValue::from(ts)).unwrap();
        let back: PropertyValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, PropertyValue::Timestamp(ts));
    }

    #[test]
    fn test_plain_string_stays_string() {
        let back: PropertyValue = serde_json::from_str("\"not a date\"").unwrap();
        assert_eq!(back, PropertyValue::String("not a date".to_string()));
    }
}
