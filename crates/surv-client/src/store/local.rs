/*
[INPUT]:  String keys/values and an optional backing file
[OUTPUT]: Browser-style local storage persisted as a JSON map
[POS]:    Store layer - persistence for tokens, user and Lemma credentials
[UPDATE]: When storage keys or the file format change
*/

use std::collections::BTreeMap;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::http::Result;

/// Application bearer token
pub const ACCESS_TOKEN: &str = "access_token";
/// Current user as JSON
pub const USER: &str = "user";
/// Identity returned by the wallet (PPID + scopes)
pub const LEMMA_USER: &str = "lemma_user";
/// Cached credential used for local scope checks
pub const LEMMA_CREDENTIALS: &str = "lemma_credentials";
/// Session-scoped marker set before leaving for a redirect unlock
pub const LEMMA_REDIRECT_PENDING: &str = "lemma_redirect_pending";

/// Key-value store with `localStorage` semantics.
///
/// Values are plain strings. With a backing file every mutation is written
/// through (temp file + rename); without one the store lives in memory, which
/// is also how session-scoped storage is modelled.
#[derive(Debug, Clone)]
pub struct LocalStore {
    inner: Arc<RwLock<StoreInner>>,
}

#[derive(Debug)]
struct StoreInner {
    path: Option<PathBuf>,
    items: BTreeMap<String, String>,
}

impl LocalStore {
    /// Create an empty, non-persistent store
    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(RwLock::new(StoreInner {
                path: None,
                items: BTreeMap::new(),
            })),
        }
    }

    /// Open (or create on first write) a store backed by `path`.
    ///
    /// A corrupt file is logged and treated as empty, matching how a browser
    /// client recovers from unparsable storage.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let items = if path.exists() {
            let content = fs::read_to_string(&path)?;
            match serde_json::from_str(&content) {
                Ok(items) => items,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "discarding unreadable local store");
                    BTreeMap::new()
                }
            }
        } else {
            BTreeMap::new()
        };

        Ok(Self {
            inner: Arc::new(RwLock::new(StoreInner {
                path: Some(path),
                items,
            })),
        })
    }

    pub fn get_item(&self, key: &str) -> Option<String> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        guard.items.get(key).cloned()
    }

    pub fn set_item(&self, key: &str, value: impl Into<String>) -> Result<()> {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        guard.items.insert(key.to_string(), value.into());
        guard.persist()
    }

    pub fn remove_item(&self, key: &str) -> Result<()> {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if guard.items.remove(key).is_some() {
            guard.persist()?;
        }
        Ok(())
    }

    /// Remove several keys with a single write
    pub fn remove_items(&self, keys: &[&str]) -> Result<()> {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let mut changed = false;
        for key in keys {
            changed |= guard.items.remove(*key).is_some();
        }
        if changed {
            guard.persist()?;
        }
        Ok(())
    }

    pub fn keys(&self) -> Vec<String> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        guard.items.keys().cloned().collect()
    }

    pub fn contains(&self, key: &str) -> bool {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        guard.items.contains_key(key)
    }

    /// Read and parse a JSON value; missing or unparsable entries yield `None`
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.get_item(key)?;
        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(key, error = %err, "stored value is not valid JSON");
                None
            }
        }
    }

    pub fn set_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.set_item(key, raw)
    }

    /// Backing file, if any
    pub fn path(&self) -> Option<PathBuf> {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        guard.path.clone()
    }
}

impl Default for LocalStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl StoreInner {
    fn persist(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string_pretty(&self.items)?;
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, content)?;

        let mut perms = fs::metadata(&temp_path)?.permissions();
        perms.set_mode(0o600);
        fs::set_permissions(&temp_path, perms)?;

        fs::rename(&temp_path, path)?;
        Ok(())
    }
}
