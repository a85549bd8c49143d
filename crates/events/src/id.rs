//! Strongly-typed event identifiers.

use serde::{Deserialize, Serialize};

/// Identifier of an event.
///
/// Ids are caller-chosen labels, not generated: derived events conventionally
/// extend their source id (e.g. "tradeEvt" -> "tradeEvt-riskEvt"), and the
/// engine compares ids against literal values, so this stays a free-form
/// string rather than a UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(String);

impl EventId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for EventId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl From<String> for EventId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for EventId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<EventId> for String {
    fn from(value: EventId) -> Self {
        value.0
    }
}


