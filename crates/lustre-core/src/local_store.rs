//! File-backed key/value store for client-held state (cart, favorites).
//!
//! Each key maps to one JSON document `<dir>/<key>.json`. Loading never fails:
//! a missing file yields the default value and a corrupt one is logged and
//! treated as empty.

use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

pub const CART_STORAGE_KEY: &str = "lustre_cart";
pub const FAVORITES_STORAGE_KEY: &str = "lustre_favs";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize value for key {key}: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid storage key {0:?}")]
    InvalidKey(String),
}

#[derive(Debug, Clone)]
pub struct LocalStore {
    dir: PathBuf,
}

impl LocalStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Loads the value stored under `key`, falling back to `T::default()`.
    #[must_use]
    pub fn load<T>(&self, key: &str) -> T
    where
        T: DeserializeOwned + Default,
    {
        let Ok(path) = self.path_for(key) else {
            tracing::warn!(key, "ignoring load for invalid storage key");
            return T::default();
        };

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return T::default(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to read local state");
                return T::default();
            }
        };

        serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "discarding corrupt local state");
            T::default()
        })
    }

    /// Persists `value` under `key`, replacing any previous document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the key is invalid, the value cannot be
    /// serialized, or the file cannot be written.
    pub fn save<T>(&self, key: &str, value: &T) -> Result<(), StoreError>
    where
        T: Serialize,
    {
        let path = self.path_for(key)?;
        let body = serde_json::to_vec_pretty(value).map_err(|source| StoreError::Serialize {
            key: key.to_string(),
            source,
        })?;

        std::fs::create_dir_all(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.display().to_string(),
            source,
        })?;

        // Write-then-rename keeps the previous document intact if we crash mid-write.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, body).map_err(|source| StoreError::Io {
            path: tmp.display().to_string(),
            source,
        })?;
        std::fs::rename(&tmp, &path).map_err(|source| StoreError::Io {
            path: path.display().to_string(),
            source,
        })?;

        Ok(())
    }

    /// Deletes the document stored under `key`. Missing documents are not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the key is invalid or the file cannot be removed.
    pub fn remove(&self, key: &str) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io {
                path: path.display().to_string(),
                source,
            }),
        }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}
