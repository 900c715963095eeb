use super::value::PropertyValue;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-call delivery options: anonymous-id override, integration routing
/// flags, and a free-form context map. Defaults to empty; an `Action` never
/// carries a missing options object.
///
/// Flattened into the serialized message, so these appear as top-level
/// `anonymousId` / `integrations` / `context` fields on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Options {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub anonymous_id: Option<String>,
    #[serde(skip_serializing_if = "HashMap::is_empty", default)]
    pub integrations: HashMap<String, bool>,
    #[serde(skip_serializing_if = "HashMap::is_empty", default)]
    pub context: HashMap<String, PropertyValue>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn anonymous_id(mut self, id: impl Into<String>) -> Self {
        self.anonymous_id = Some(id.into());
        self
    }

    /// Enable or disable routing of this message to a named integration.
    pub fn integration(mut self, name: impl Into<String>, enabled: bool) -> Self {
        self.integrations.insert(name.into(), enabled);
        self
    }

    pub fn context_entry(
        mut self,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.anonymous_id.is_none() && self.integrations.is_empty() && self.context.is_empty()
    }
}
