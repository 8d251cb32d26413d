use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::DomainError;

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// Expiring key/value store holding offers, idle-claim locks, last-known
/// location samples and field-indexed float counters. Values are stored as
/// JSON strings; expiry is lazy, so a read of an expired entry drops it and
/// reports absence. Absence after TTL is a normal state, not an error.
pub struct EphemeralStore {
    entries: DashMap<String, Entry>,
    counters: DashMap<(String, String), f64>,
}

impl EphemeralStore {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            counters: DashMap::new(),
        }
    }

    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), DomainError> {
        self.store(key, value, None)
    }

    pub fn set_ex<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<(), DomainError> {
        self.store(key, value, Some(ttl))
    }

    fn store<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<(), DomainError> {
        let value = serde_json::to_string(value).map_err(|err| {
            DomainError::Internal(format!("failed to serialize cache value for {key}: {err}"))
        })?;
        self.entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: ttl.map(|ttl| Instant::now() + ttl),
            },
        );
        Ok(())
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, DomainError> {
        let Some(entry) = self.entries.get(key) else {
            return Ok(None);
        };
        if entry.expired() {
            drop(entry);
            self.entries.remove_if(key, |_, entry| entry.expired());
            return Ok(None);
        }
        serde_json::from_str(&entry.value)
            .map(Some)
            .map_err(|err| DomainError::Internal(format!("corrupt cache value for {key}: {err}")))
    }

    pub fn exists(&self, key: &str) -> bool {
        let live = match self.entries.get(key) {
            Some(entry) => !entry.expired(),
            None => return false,
        };
        if !live {
            self.entries.remove_if(key, |_, entry| entry.expired());
        }
        live
    }

    pub fn remove(&self, key: &str) {
        self.entries.remove(key);
    }

    /// Atomic read-modify-write on a field-indexed float counter. The entry
    /// lock covers the whole increment, so concurrent samples for the same
    /// key/field never lose an update.
    pub fn incr_by_float(&self, key: &str, field: &str, delta: f64) -> f64 {
        let mut total = self
            .counters
            .entry((key.to_string(), field.to_string()))
            .or_insert(0.0);
        *total += delta;
        *total
    }

    pub fn counter(&self, key: &str, field: &str) -> Option<f64> {
        self.counters
            .get(&(key.to_string(), field.to_string()))
            .map(|total| *total)
    }
}

impl Default for EphemeralStore {
    fn default() -> Self {
        Self::new()
    }
}
