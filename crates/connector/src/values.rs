//! Value types held by storage adapters.
//!
//! Session and configuration storage accept the same closed set of values:
//! booleans, numbers, strings, and structured records. An absent value is
//! expressed as `Option::None` at the call site, never as a variant here.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Initial configuration passed to [`crate::ServiceCore::new`].
///
/// Keys are written into the default config storage one by one.
pub type ConfigRecord = BTreeMap<String, StorageValue>;

/// A value stored under a key in a [`crate::StorageAdapter`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StorageValue {
    Bool(bool),
    Number(f64),
    String(String),
    /// A structured record (a JSON object).
    Record(Map<String, Value>),
}

impl StorageValue {
    /// Returns the string payload, if this is a [`StorageValue::String`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Whether this value survives a JSON round trip. Non-finite numbers
    /// serialize as `null` and would read back as nothing.
    pub fn is_storable(&self) -> bool {
        match self {
            Self::Number(n) => n.is_finite(),
            _ => true,
        }
    }

    /// Converts a JSON value into a storage value.
    ///
    /// `null` maps to `None` (absent). Arrays have no storage representation
    /// and also map to `None`. Numbers outside the `f64` range do too.
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Null | Value::Array(_) => None,
            Value::Bool(b) => Some(Self::Bool(b)),
            Value::Number(n) => n.as_f64().map(Self::Number),
            Value::String(s) => Some(Self::String(s)),
            Value::Object(map) => Some(Self::Record(map)),
        }
    }

    /// Converts this value into its JSON form.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Bool(b) => Value::Bool(*b),
            Self::Number(n) => serde_json::Number::from_f64(*n)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Self::String(s) => Value::String(s.clone()),
            Self::Record(r) => Value::Object(r.clone()),
        }
    }
}

impl From<bool> for StorageValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for StorageValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for StorageValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<&str> for StorageValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for StorageValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<Map<String, Value>> for StorageValue {
    fn from(value: Map<String, Value>) -> Self {
        Self::Record(value)
    }
}

impl std::fmt::Display for StorageValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            other => write!(f, "{}", other.to_json()),
        }
    }
}
