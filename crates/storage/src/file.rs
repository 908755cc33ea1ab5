//! JSON-file-backed storage adapter.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use connector::{StorageAdapter, StorageValue};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use crate::error::{StorageError, StorageResult};

type Items = BTreeMap<String, StorageValue>;

/// Durable [`StorageAdapter`] that keeps the whole mapping in one JSON file.
///
/// The file is read once at [`FileStorage::open`]. Every mutation rewrites it
/// through a temporary file in the same directory followed by a rename, so a
/// crash never leaves a half-written file behind. A mutation whose write
/// fails returns `false` and leaves the in-memory mapping untouched.
pub struct FileStorage {
    path: PathBuf,
    items: RwLock<Items>,
}

impl FileStorage {
    /// Opens (or lazily creates) the store at `path`.
    ///
    /// A missing file is an empty store; the file is created on first write.
    pub fn open(path: impl Into<PathBuf>) -> StorageResult<Self> {
        let path = path.into();
        let items = match fs::read(&path) {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Items::new(),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| StorageError::Corrupt {
                path: path.clone(),
                source,
            })?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Items::new(),
            Err(source) => {
                return Err(StorageError::Io {
                    path: path.clone(),
                    source,
                })
            }
        };
        debug!(path = %path.display(), items = items.len(), "file storage opened");
        Ok(Self {
            path,
            items: RwLock::new(items),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Applies `change` to a copy of the mapping, persists the copy, and only
    /// then swaps it in.
    fn mutate(&self, change: impl FnOnce(&mut Items) -> bool) -> bool {
        let mut items = self.items.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = items.clone();
        if !change(&mut next) {
            return false;
        }
        match persist(&self.path, &next) {
            Ok(()) => {
                *items = next;
                true
            }
            Err(err) => {
                warn!(error = %err, "file storage write failed");
                false
            }
        }
    }
}

fn persist(path: &Path, items: &Items) -> StorageResult<()> {
    let io_err = |source: std::io::Error| StorageError::Io {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(io_err)?;

    let encoded = serde_json::to_vec_pretty(items).map_err(StorageError::Encode)?;
    let mut file = NamedTempFile::new_in(dir).map_err(io_err)?;
    file.write_all(&encoded).map_err(io_err)?;
    file.as_file().sync_all().map_err(io_err)?;
    file.persist(path).map_err(|e| io_err(e.error))?;
    Ok(())
}

impl StorageAdapter for FileStorage {
    fn get_item(&self, key: &str) -> Option<StorageValue> {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set_item(&self, key: &str, value: Option<StorageValue>) -> bool {
        let Some(value) = value else {
            return false;
        };
        if key.is_empty() || !value.is_storable() {
            return false;
        }
        self.mutate(|items| {
            items.insert(key.to_owned(), value);
            true
        })
    }

    fn remove_item(&self, key: &str) -> bool {
        self.mutate(|items| items.remove(key).is_some())
    }

    fn clear(&self) -> bool {
        self.mutate(|items| {
            items.clear();
            true
        })
    }
}

impl std::fmt::Debug for FileStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStorage")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store_in(dir: &tempfile::TempDir) -> FileStorage {
        FileStorage::open(dir.path().join("session.json")).unwrap()
    }

    #[test]
    fn missing_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert_eq!(store.get_item("anything"), None);
        assert!(!store.path().exists());
    }

    #[test]
    fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert!(store.set_item("user", Some("admin".into())));
        assert!(store.set_item("remember", Some(true.into())));
        let auth = StorageValue::from_json(json!({"username": "admin"})).unwrap();
        assert!(store.set_item("auth", Some(auth.clone())));
        drop(store);

        let reopened = store_in(&dir);
        assert_eq!(reopened.get_item("user"), Some(StorageValue::from("admin")));
        assert_eq!(reopened.get_item("remember"), Some(StorageValue::Bool(true)));
        assert_eq!(reopened.get_item("auth"), Some(auth));
    }

    #[test]
    fn rejects_empty_key_and_absent_value() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert!(!store.set_item("", Some("x".into())));
        assert!(!store.set_item("k", None));
        assert_eq!(store.get_item("k"), None);
        assert!(!store.path().exists());
    }

    #[test]
    fn non_finite_number_never_reaches_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert!(store.set_item("ratio", Some(0.5.into())));
        assert!(!store.set_item("ratio", Some(StorageValue::Number(f64::NAN))));
        assert!(!store.set_item("limit", Some(StorageValue::Number(f64::INFINITY))));
        drop(store);

        let reopened = FileStorage::open(dir.path().join("session.json")).unwrap();
        assert_eq!(reopened.get_item("ratio"), Some(StorageValue::Number(0.5)));
        assert_eq!(reopened.get_item("limit"), None);
    }

    #[test]
    fn remove_and_clear_are_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.set_item("a", Some(1.into()));
        store.set_item("b", Some(2.into()));

        assert!(store.remove_item("a"));
        assert!(!store.remove_item("a"));
        assert_eq!(store_in(&dir).get_item("a"), None);
        assert_eq!(store_in(&dir).get_item("b"), Some(StorageValue::Number(2.0)));

        assert!(store.clear());
        assert_eq!(store.get_item("b"), None);
        assert_eq!(store_in(&dir).get_item("b"), None);
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{not json").unwrap();
        let err = FileStorage::open(&path).unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { .. }));
    }

    #[test]
    fn creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStorage::open(dir.path().join("nested/deeper/store.json")).unwrap();
        assert!(store.set_item("k", Some("v".into())));
        assert!(store.path().exists());
    }
}
