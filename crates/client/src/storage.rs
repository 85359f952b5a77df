//! Key-value storage tiers.
//!
//! The engine persists into two tiers with the same interface: a durable tier
//! that survives restarts ("remember me", carts, order logs) and a session
//! tier scoped to one browsing session (wishlists, reviews, short-lived
//! sign-ins). Values are JSON strings.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::StorageError;

/// A string key-value store.
///
/// Every call is atomic with respect to other calls on the same tier. There
/// is no cross-call transaction: two writers racing on one key end with
/// whichever wrote last.
pub trait StorageTier: Send + Sync {
    /// Value stored under `key`, or `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the tier cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the tier cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`. Deleting an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the tier cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Every key currently stored, in ascending order.
    ///
    /// # Errors
    ///
    /// Returns an error if the tier cannot be read.
    fn keys(&self) -> Result<Vec<String>, StorageError>;
}

/// In-memory tier.
///
/// Clones share the same entries, so two [`Shop`](crate::Shop) instances
/// built from clones behave like two browser tabs over one storage area.
#[derive(Debug, Clone, Default)]
pub struct MemoryTier {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryTier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageTier for MemoryTier {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let entries = self.entries.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(entries.keys().cloned().collect())
    }
}

/// Tier backed by a single JSON object file.
///
/// Each call reads the whole file and each write replaces it through a
/// temporary sibling file and a rename. A missing file is an empty tier.
#[derive(Debug)]
pub struct JsonFileTier {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileTier {
    /// Use `path` as the backing file. The file is created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(StorageError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&raw).map_err(|source| StorageError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let io_err = |source| StorageError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(entries)?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)
    }

    fn modify(
        &self,
        f: impl FnOnce(&mut BTreeMap<String, String>),
    ) -> Result<(), StorageError> {
        let _guard = self.lock.lock().map_err(|_| StorageError::Poisoned)?;
        let mut entries = self.load()?;
        f(&mut entries);
        self.save(&entries)
    }
}

impl StorageTier for JsonFileTier {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.modify(|entries| {
            entries.insert(key.to_owned(), value.to_owned());
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.modify(|entries| {
            entries.remove(key);
        })
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let _guard = self.lock.lock().map_err(|_| StorageError::Poisoned)?;
        Ok(self.load()?.into_keys().collect())
    }
}

/// Read and decode the JSON value under `key`.
///
/// A missing key or a value that no longer parses yields `T::default()`;
/// the latter is logged, since it means the stored shape drifted.
///
/// # Errors
///
/// Returns an error only if the tier itself cannot be read.
pub fn read_json<T>(tier: &dyn StorageTier, key: &str) -> Result<T, StorageError>
where
    T: DeserializeOwned + Default,
{
    let Some(raw) = tier.get(key)? else {
        return Ok(T::default());
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "Discarding unparseable stored value");
            Ok(T::default())
        }
    }
}

/// Encode `value` as JSON and store it under `key`.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn write_json<T: Serialize + ?Sized>(
    tier: &dyn StorageTier,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value)?;
    tier.set(key, &raw)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_tier_clones_share_entries() {
        let a = MemoryTier::new();
        let b = a.clone();
        a.set("k", "v").unwrap();
        assert_eq!(b.get("k").unwrap().as_deref(), Some("v"));
        b.remove("k").unwrap();
        assert_eq!(a.get("k").unwrap(), None);
        // Removing again is fine.
        a.remove("k").unwrap();
    }

    #[test]
    fn test_file_tier_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("local.json");

        let tier = JsonFileTier::new(&path);
        assert_eq!(tier.get("cart_guest").unwrap(), None);
        tier.set("cart_guest", "[]").unwrap();
        tier.set("token", "abc").unwrap();

        let reopened = JsonFileTier::new(&path);
        assert_eq!(reopened.get("token").unwrap().as_deref(), Some("abc"));
        assert_eq!(reopened.keys().unwrap(), ["cart_guest", "token"]);

        reopened.remove("token").unwrap();
        assert_eq!(tier.get("token").unwrap(), None);
    }

    #[test]
    fn test_file_tier_reports_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("local.json");
        fs::write(&path, "not json").unwrap();

        let tier = JsonFileTier::new(&path);
        assert!(matches!(tier.get("k"), Err(StorageError::Corrupt { .. })));
    }

    #[test]
    fn test_read_json_defaults_on_missing_or_garbage() {
        let tier = MemoryTier::new();
        let missing: Vec<u32> = read_json(&tier, "nums").unwrap();
        assert!(missing.is_empty());

        tier.set("nums", "{oops").unwrap();
        let garbage: Vec<u32> = read_json(&tier, "nums").unwrap();
        assert!(garbage.is_empty());

        write_json(&tier, "nums", &[1, 2, 3]).unwrap();
        let stored: Vec<u32> = read_json(&tier, "nums").unwrap();
        assert_eq!(stored, [1, 2, 3]);
    }
}
