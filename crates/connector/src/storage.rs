//! Key-value storage port and its default in-memory implementation.
//!
//! The same capability backs two service slots: session storage and
//! configuration storage. Concrete adapters may add durability (see the
//! `storage` crate) but must keep the four-operation contract below.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use crate::values::StorageValue;

/// Key-value persistence capability.
///
/// All implementations must satisfy these invariants:
/// - Keys are unique; writing an existing key overwrites it.
/// - Reading a missing key is not an error; it yields `None`.
/// - `clear` is atomic: no partially-cleared state is observable.
///
/// Every method takes `&self`; implementations use interior mutability so a
/// shared `Arc<dyn StorageAdapter>` can be written through.
pub trait StorageAdapter: Send + Sync {
    /// Returns the value stored under `key`, or `None` when absent.
    fn get_item(&self, key: &str) -> Option<StorageValue>;

    /// Inserts or overwrites `key`.
    ///
    /// Returns whether the write happened. Callers must not assume a call
    /// always mutates state: an empty key, an absent value, or a value that
    /// is not [storable](StorageValue::is_storable) is rejected.
    fn set_item(&self, key: &str, value: Option<StorageValue>) -> bool;

    /// Removes `key`. Returns `true` if a value was removed.
    fn remove_item(&self, key: &str) -> bool;

    /// Removes every key. When this returns `true`, all previously stored
    /// keys read back as absent.
    fn clear(&self) -> bool;
}

// ---------------------------------------------------------------------------
// In-memory implementation
// ---------------------------------------------------------------------------

/// HashMap-backed storage adapter.
///
/// The default config storage of every [`crate::ServiceCore`]. Nothing
/// survives the process.
#[derive(Default)]
pub struct MemoryStorage {
    items: RwLock<HashMap<String, StorageValue>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorted list of stored keys.
    pub fn keys(&self) -> Vec<String> {
        let items = self.items.read().unwrap_or_else(PoisonError::into_inner);
        let mut keys: Vec<String> = items.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl StorageAdapter for MemoryStorage {
    fn get_item(&self, key: &str) -> Option<StorageValue> {
        let items = self.items.read().unwrap_or_else(PoisonError::into_inner);
        items.get(key).cloned()
    }

    fn set_item(&self, key: &str, value: Option<StorageValue>) -> bool {
        let Some(value) = value else {
            return false;
        };
        if key.is_empty() || !value.is_storable() {
            return false;
        }
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        items.insert(key.to_owned(), value);
        true
    }

    fn remove_item(&self, key: &str) -> bool {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        items.remove(key).is_some()
    }

    fn clear(&self) -> bool {
        self.items
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        true
    }
}

impl std::fmt::Debug for MemoryStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStorage")
            .field("item_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn set_then_get_round_trips() {
        let store = MemoryStorage::new();
        assert!(store.set_item("baseURL", Some("http://example.com".into())));
        assert_eq!(
            store.get_item("baseURL"),
            Some(StorageValue::from("http://example.com"))
        );

        let record = StorageValue::from_json(json!({"a": 1})).unwrap();
        assert!(store.set_item("headers", Some(record.clone())));
        assert_eq!(store.get_item("headers"), Some(record));
    }

    #[test]
    fn missing_key_is_absent() {
        let store = MemoryStorage::new();
        assert_eq!(store.get_item("nope"), None);
    }

    #[test]
    fn overwrite_replaces_value() {
        let store = MemoryStorage::new();
        store.set_item("k", Some(1.into()));
        store.set_item("k", Some(false.into()));
        assert_eq!(store.get_item("k"), Some(StorageValue::Bool(false)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn empty_key_is_rejected_without_mutation() {
        let store = MemoryStorage::new();
        assert!(!store.set_item("", Some("x".into())));
        assert!(store.is_empty());
        assert_eq!(store.get_item(""), None);
    }

    #[test]
    fn absent_value_is_rejected_without_mutation() {
        let store = MemoryStorage::new();
        store.set_item("k", Some("before".into()));
        assert!(!store.set_item("k", None));
        assert_eq!(store.get_item("k"), Some(StorageValue::from("before")));
    }

    #[test]
    fn non_finite_numbers_are_rejected_without_mutation() {
        let store = MemoryStorage::new();
        store.set_item("ratio", Some(0.5.into()));
        for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(!store.set_item("ratio", Some(StorageValue::Number(value))));
        }
        assert_eq!(store.get_item("ratio"), Some(StorageValue::Number(0.5)));
    }

    #[test]
    fn remove_reports_whether_anything_was_removed() {
        let store = MemoryStorage::new();
        store.set_item("k", Some("v".into()));
        assert!(store.remove_item("k"));
        assert!(!store.remove_item("k"));
        assert_eq!(store.get_item("k"), None);
    }

    #[test]
    fn clear_empties_every_key() {
        let store = MemoryStorage::new();
        for key in ["a", "b", "c"] {
            store.set_item(key, Some(key.into()));
        }
        assert!(store.clear());
        for key in ["a", "b", "c"] {
            assert_eq!(store.get_item(key), None);
        }
        assert!(store.keys().is_empty());
    }
}
