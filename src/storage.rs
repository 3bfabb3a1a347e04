//! Scoped key/value persistence with JSON encoding.
//!
//! Stores above this layer never touch a [`StorageMedium`] directly; they go
//! through [`PersistentStore`], which owns no semantics of its own.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub const SESSION_KEY: &str = "session";
pub const USERS_KEY: &str = "users";
pub const TICKETS_KEY: &str = "tickets";
pub const ACTIVITIES_KEY: &str = "activities";

/// A string-keyed, string-valued storage medium.
pub trait StorageMedium: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
    fn keys(&self) -> Result<Vec<String>>;
}

#[derive(Debug, Default)]
pub struct MemoryMedium {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryMedium {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StorageMedium for MemoryMedium {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries().keys().cloned().collect())
    }
}

pub struct PersistentStore {
    medium: Arc<dyn StorageMedium>,
    namespace: String,
}

impl PersistentStore {
    pub fn new(medium: Arc<dyn StorageMedium>, namespace: &str) -> Self {
        Self {
            medium,
            namespace: namespace.to_string(),
        }
    }

    pub fn in_memory(namespace: &str) -> Self {
        Self::new(Arc::new(MemoryMedium::new()), namespace)
    }

    pub fn scoped_key(&self, name: &str) -> String {
        format!("{}_{}", self.namespace, name)
    }

    /// Decode the value under `name`.
    ///
    /// Absent, unreadable and undecodable values all come back as `None`.
    /// An undecodable value is removed so it cannot fail again.
    pub fn load<T: DeserializeOwned>(&self, name: &str) -> Option<T> {
        let key = self.scoped_key(name);
        let raw = match self.medium.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "failed to read key, treating as absent");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "corrupt value, clearing key");
                if let Err(e) = self.medium.remove(&key) {
                    tracing::warn!(key = %key, error = %e, "failed to clear corrupt key");
                }
                None
            }
        }
    }

    pub fn save<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<()> {
        let key = self.scoped_key(name);
        let json = serde_json::to_string(value).with_context(|| format!("Failed to encode {}", key))?;
        self.medium
            .set(&key, &json)
            .with_context(|| format!("Failed to write {}", key))?;
        tracing::debug!(key = %key, bytes = json.len(), "persisted");
        Ok(())
    }

    pub fn remove(&self, name: &str) -> Result<()> {
        let key = self.scoped_key(name);
        self.medium
            .remove(&key)
            .with_context(|| format!("Failed to remove {}", key))
    }

    /// The stored text under `name`, undecoded.
    pub fn raw(&self, name: &str) -> Result<Option<String>> {
        self.medium.get(&self.scoped_key(name))
    }

    /// Names of every key in this namespace.
    pub fn names(&self) -> Result<Vec<String>> {
        let prefix = format!("{}_", self.namespace);
        Ok(self
            .medium
            .keys()?
            .into_iter()
            .filter_map(|k| k.strip_prefix(&prefix).map(str::to_string))
            .collect())
    }
}
