use super::ValidationError;
use super::options::Options;
use super::value::{Properties, Traits};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One immutable telemetry event. Closed set of kinds, discriminated by the
/// `action` tag on the wire (`"identify"`, `"track"`, `"alias"`).
///
/// Construction is fail-fast: required identifiers are checked here, and the
/// dispatch pipeline never re-validates. An absent timestamp means the
/// endpoint assigns arrival time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum Action {
    Identify {
        user_id: String,
        #[serde(skip_serializing_if = "HashMap::is_empty", default)]
        traits: Traits,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        timestamp: Option<DateTime<Utc>>,
        #[serde(flatten)]
        options: Options,
    },
    Track {
        user_id: String,
        event: String,
        #[serde(skip_serializing_if = "HashMap::is_empty", default)]
        properties: Properties,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        timestamp: Option<DateTime<Utc>>,
        #[serde(flatten)]
        options: Options,
    },
    Alias {
        previous_id: String,
        user_id: String,
        #[serde(skip_serializing_if = "Option::is_none", default)]
        timestamp: Option<DateTime<Utc>>,
        #[serde(flatten)]
        options: Options,
    },
}

/// Kind discriminator, mainly for notifications and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    Identify,
    Track,
    Alias,
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Identify => write!(f, "identify"),
            Self::Track => write!(f, "track"),
            Self::Alias => write!(f, "alias"),
        }
    }
}

impl Action {
    /// Ties a visitor's actions to an identity and records traits to
    /// segment by.
    pub fn identify(
        user_id: impl Into<String>,
        traits: Traits,
        options: Option<Options>,
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<Self, ValidationError> {
        let user_id = user_id.into();
        if user_id.is_empty() {
            return Err(ValidationError::EmptyUserId);
        }

        Ok(Self::Identify {
            user_id,
            traits,
            timestamp,
            options: options.unwrap_or_default(),
        })
    }

    /// Records one named event a user triggered, with optional descriptive
    /// properties.
    pub fn track(
        user_id: impl Into<String>,
        event: impl Into<String>,
        properties: Properties,
        options: Option<Options>,
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<Self, ValidationError> {
        let user_id = user_id.into();
        if user_id.is_empty() {
            return Err(ValidationError::EmptyUserId);
        }

        let event = event.into();
        if event.is_empty() {
            return Err(ValidationError::EmptyEventName);
        }

        Ok(Self::Track {
            user_id,
            event,
            properties,
            timestamp,
            options: options.unwrap_or_default(),
        })
    }

    /// Merges an anonymous user's id into an identified user's id.
    pub fn alias(
        previous_id: impl Into<String>,
        user_id: impl Into<String>,
        options: Option<Options>,
        timestamp: Option<DateTime<Utc>>,
    ) -> Result<Self, ValidationError> {
        let previous_id = previous_id.into();
        if previous_id.is_empty() {
            return Err(ValidationError::EmptyPreviousId);
        }

        let user_id = user_id.into();
        if user_id.is_empty() {
            return Err(ValidationError::EmptyUserId);
        }

        Ok(Self::Alias {
            previous_id,
            user_id,
            timestamp,
            options: options.unwrap_or_default(),
        })
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Identify { .. } => ActionKind::Identify,
            Self::Track { .. } => ActionKind::Track,
            Self::Alias { .. } => ActionKind::Alias,
        }
    }

    pub fn user_id(&self) -> &str {
        match self {
            Self::Identify { user_id, .. }
            | Self::Track { user_id, .. }
            | Self::Alias { user_id, .. } => user_id,
        }
    }

    pub fn timestamp(&self) -> Option<&DateTime<Utc>> {
        match self {
            Self::Identify { timestamp, .. }
            | Self::Track { timestamp, .. }
            | Self::Alias { timestamp, .. } => timestamp.as_ref(),
        }
    }

    pub fn options(&self) -> &Options {
        match self {
            Self::Identify { options, .. }
            | Self::Track { options, .. }
            | Self::Alias { options, .. } => options,
        }
    }
}
