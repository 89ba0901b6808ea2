/// Token Storage
///
/// Persists the access/refresh token pair under the keys `accessToken` and
/// `refreshToken`. Storage backends implement [`KeyValueStorage`]; the
/// [`TokenStore`] on top degrades to no-ops when no backend is available.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Access and refresh token, always written together
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

// Tokens are credentials; keep them out of logs and panic messages.
impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// A string key-value store.
///
/// `set_many` and `remove_many` must apply all entries in one step so a
/// reader never observes half of a token pair.
pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set_many(&self, entries: &[(&str, &str)]) -> bool;
    fn remove_many(&self, keys: &[&str]) -> bool;
}

/// Process-local storage
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        let entries = self.entries.lock().ok()?;
        entries.get(key).cloned()
    }

    fn set_many(&self, new_entries: &[(&str, &str)]) -> bool {
        let Ok(mut entries) = self.entries.lock() else {
            return false;
        };
        for (key, value) in new_entries {
            entries.insert((*key).to_string(), (*value).to_string());
        }
        true
    }

    fn remove_many(&self, keys: &[&str]) -> bool {
        let Ok(mut entries) = self.entries.lock() else {
            return false;
        };
        for key in keys {
            entries.remove(*key);
        }
        true
    }
}

/// Storage persisted as one JSON object in a file.
///
/// A missing or corrupt file reads as empty. Every write replaces the whole
/// file through a temporary sibling and a rename.
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    fn read_all(&self) -> HashMap<String, String> {
        let raw = match std::fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return HashMap::new(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Token file unreadable");
                return HashMap::new();
            }
        };

        serde_json::from_slice(&raw).unwrap_or_else(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "Token file corrupt, ignoring");
            HashMap::new()
        })
    }

    /// Sibling of the target with `.tmp` appended to the full file name.
    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }

    fn write_all(&self, entries: &HashMap<String, String>) -> bool {
        let result = serde_json::to_vec_pretty(entries)
            .map_err(std::io::Error::from)
            .and_then(|bytes| {
                let tmp = self.tmp_path();
                std::fs::write(&tmp, bytes)?;
                std::fs::rename(&tmp, &self.path)
            });

        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(path = %self.path.display(), error = %e, "Failed to write token file");
                false
            }
        }
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        let _guard = self.lock.lock().ok()?;
        self.read_all().remove(key)
    }

    fn set_many(&self, new_entries: &[(&str, &str)]) -> bool {
        let Ok(_guard) = self.lock.lock() else {
            return false;
        };
        let mut entries = self.read_all();
        for (key, value) in new_entries {
            entries.insert((*key).to_string(), (*value).to_string());
        }
        self.write_all(&entries)
    }

    fn remove_many(&self, keys: &[&str]) -> bool {
        let Ok(_guard) = self.lock.lock() else {
            return false;
        };
        let mut entries = self.read_all();
        for key in keys {
            entries.remove(*key);
        }
        self.write_all(&entries)
    }
}

/// Token pair persistence.
///
/// Built without a backend (`TokenStore::unavailable()`), every operation is
/// a no-op: reads return `None`, writes return `false`.
#[derive(Clone)]
pub struct TokenStore {
    storage: Option<Arc<dyn KeyValueStorage>>,
}

impl TokenStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self {
            storage: Some(storage),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStorage::new()))
    }

    pub fn unavailable() -> Self {
        Self { storage: None }
    }

    pub fn is_available(&self) -> bool {
        self.storage.is_some()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.storage
            .as_ref()?
            .get(key)
            .filter(|value| !value.is_empty())
    }

    pub fn access_token(&self) -> Option<String> {
        self.get(ACCESS_TOKEN_KEY)
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.get(REFRESH_TOKEN_KEY)
    }

    /// Overwrite both tokens in one storage operation.
    pub(crate) fn set(&self, pair: &TokenPair) -> bool {
        match &self.storage {
            Some(storage) => storage.set_many(&[
                (ACCESS_TOKEN_KEY, pair.access_token.as_str()),
                (REFRESH_TOKEN_KEY, pair.refresh_token.as_str()),
            ]),
            None => false,
        }
    }

    /// Remove both tokens.
    pub(crate) fn clear(&self) -> bool {
        match &self.storage {
            Some(storage) => storage.remove_many(&[ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY]),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_set_get_clear() {
        let store = TokenStore::in_memory();
        assert!(store.access_token().is_none());

        assert!(store.set(&TokenPair::new("A1", "R1")));
        assert_eq!(store.access_token().as_deref(), Some("A1"));
        assert_eq!(store.refresh_token().as_deref(), Some("R1"));
        assert_eq!(store.get(ACCESS_TOKEN_KEY).as_deref(), Some("A1"));

        assert!(store.set(&TokenPair::new("A2", "R2")));
        assert_eq!(store.access_token().as_deref(), Some("A2"));
        assert_eq!(store.refresh_token().as_deref(), Some("R2"));

        assert!(store.clear());
        assert!(store.access_token().is_none());
        assert!(store.refresh_token().is_none());
    }

    #[test]
    fn test_unavailable_store_is_a_no_op() {
        let store = TokenStore::unavailable();
        assert!(!store.is_available());
        assert!(!store.set(&TokenPair::new("A1", "R1")));
        assert!(store.access_token().is_none());
        assert!(!store.clear());
    }

    #[test]
    fn test_empty_values_read_as_absent() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set_many(&[(ACCESS_TOKEN_KEY, "")]);
        let store = TokenStore::new(storage);
        assert!(store.access_token().is_none());
    }

    #[test]
    fn test_file_storage_persists_across_instances() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("tokens.json");

        let store = TokenStore::new(Arc::new(FileStorage::new(&path)));
        assert!(store.access_token().is_none());
        assert!(store.set(&TokenPair::new("A1", "R1")));

        let reopened = TokenStore::new(Arc::new(FileStorage::new(&path)));
        assert_eq!(reopened.access_token().as_deref(), Some("A1"));
        assert_eq!(reopened.refresh_token().as_deref(), Some("R1"));

        let on_disk: HashMap<String, String> =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(on_disk.len(), 2);
        assert_eq!(on_disk["accessToken"], "A1");

        assert!(reopened.clear());
        assert!(store.refresh_token().is_none());
    }

    #[test]
    fn test_file_storage_with_tmp_extension() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("tokens.tmp");
        let storage = Arc::new(FileStorage::new(&path));
        assert_eq!(storage.tmp_path(), dir.path().join("tokens.tmp.tmp"));

        let store = TokenStore::new(storage);
        assert!(store.set(&TokenPair::new("A1", "R1")));
        assert!(path.is_file());
        assert!(!dir.path().join("tokens.tmp.tmp").exists());

        let reopened = TokenStore::new(Arc::new(FileStorage::new(&path)));
        assert_eq!(reopened.access_token().as_deref(), Some("A1"));
        assert_eq!(reopened.refresh_token().as_deref(), Some("R1"));
    }

    #[test]
    fn test_corrupt_file_reads_as_empty() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("tokens.json");
        std::fs::write(&path, b"{ not json").unwrap();

        let store = TokenStore::new(Arc::new(FileStorage::new(&path)));
        assert!(store.access_token().is_none());
        assert!(store.set(&TokenPair::new("A1", "R1")));
        assert_eq!(store.access_token().as_deref(), Some("A1"));
    }

    #[test]
    fn test_token_pair_debug_is_redacted() {
        let pair = TokenPair::new("secret-access", "secret-refresh");
        let debug = format!("{:?}", pair);
        assert!(!debug.contains("secret"));
    }

    #[test]
    fn test_token_pair_wire_format() {
        let pair: TokenPair =
            serde_json::from_str(r#"{"accessToken":"A","refreshToken":"R"}"#).unwrap();
        assert_eq!(pair, TokenPair::new("A", "R"));
    }
}
