//! Typed view over the payment metadata JSON blob.
//!
//! The blob is shared with the bot and admin panel, so keys this service does
//! not own are carried through untouched.
//!
//! Stored rows are read with [`PaymentMetadata::from_stored_value`]: a bad
//! value under a key that only steers retries or diagnostics is reset so the
//! row stays readable. `activationAppliedAt`, `activationProxySlots` and
//! `extraOption` stay strict; guessing them could fulfill a payment twice.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{ActivationState, ExtraOption};
use crate::domain::foundation::Timestamp;

/// Replacement for a malformed value; `None` drops the key.
type Repair = fn(&Value) -> Option<Option<Value>>;

const REPAIRABLE: [(&str, Repair); 3] = [
    ("activationInProgressAt", repair_timestamp),
    ("activationAttempts", repair_attempts),
    ("activationLastError", repair_text),
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PaymentMetadata {
    #[serde(flatten)]
    pub activation: ActivationState,

    #[serde(rename = "extraOption", default, skip_serializing_if = "Option::is_none")]
    pub extra_option: Option<ExtraOption>,

    /// Everything else, preserved verbatim.
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl PaymentMetadata {
    /// Reads metadata from a stored JSON value. `null` reads as empty.
    pub fn from_value(value: Value) -> Result<Self, serde_json::Error> {
        match value {
            Value::Null => Ok(Self::default()),
            other => serde_json::from_value(other),
        }
    }

    /// Like [`from_value`](Self::from_value), but resets malformed retry
    /// bookkeeping instead of failing. Returns the keys that were reset.
    pub fn from_stored_value(value: Value) -> Result<(Self, Vec<&'static str>), serde_json::Error> {
        let mut object = match value {
            Value::Object(object) => object,
            other => return Self::from_value(other).map(|metadata| (metadata, Vec::new())),
        };

        let mut repaired = Vec::new();
        for (key, repair) in REPAIRABLE {
            let Some(fix) = object.get(key).and_then(repair) else {
                continue;
            };
            match fix {
                Some(value) => object.insert(key.to_string(), value),
                None => object.remove(key),
            };
            repaired.push(key);
        }

        let metadata = serde_json::from_value(Value::Object(object))?;
        Ok((metadata, repaired))
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Map::new()))
    }

    /// JSON object holding only the activation keys currently set.
    ///
    /// Storage applies it as "drop all activation keys, then merge this",
    /// so a key absent here is cleared.
    pub fn activation_patch(state: &ActivationState) -> Value {
        serde_json::to_value(state).unwrap_or_else(|_| Value::Object(Map::new()))
    }

    /// Returns a copy with the activation fields replaced.
    pub fn with_activation(&self, activation: ActivationState) -> Self {
        Self {
            activation,
            extra_option: self.extra_option.clone(),
            other: self.other.clone(),
        }
    }
}

fn repair_timestamp(raw: &Value) -> Option<Option<Value>> {
    match serde_json::from_value::<Option<Timestamp>>(raw.clone()) {
        Ok(_) => None,
        Err(_) => Some(None),
    }
}

/// Counts written by hand as strings are accepted.
fn repair_attempts(raw: &Value) -> Option<Option<Value>> {
    if raw.as_u64().map_or(false, |n| u32::try_from(n).is_ok()) {
        return None;
    }
    Some(
        raw.as_str()
            .and_then(|s| s.trim().parse::<u32>().ok())
            .map(Value::from),
    )
}

fn repair_text(raw: &Value) -> Option<Option<Value>> {
    match raw {
        Value::String(_) | Value::Null => None,
        _ => Some(None),
    }
}
