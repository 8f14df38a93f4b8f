// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory config store fake for testing without filesystem I/O.

use decoy::{ConfigError, ConfigStore};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// In-memory implementation of [`ConfigStore`] for testing.
///
/// Lets tests load a [`RegistryConfig`](decoy::RegistryConfig) without
/// touching the filesystem, and counts loads and saves for verification.
///
/// # Example
///
/// ```
/// use decoy::RegistryConfig;
/// use decoy_dry_tests::InMemoryConfigStore;
///
/// let store = InMemoryConfigStore::new();
/// let config = RegistryConfig { restore_on_drop: true, ..RegistryConfig::default() };
/// config.save(&store, "registry").unwrap();
///
/// assert_eq!(RegistryConfig::load(&store, "registry").unwrap(), config);
/// assert_eq!(store.load_count(), 1);
/// assert_eq!(store.save_count(), 1);
/// ```
#[derive(Clone, Default)]
pub struct InMemoryConfigStore {
    inner: Arc<Mutex<InMemoryConfigStoreInner>>,
}

#[derive(Default)]
struct InMemoryConfigStoreInner {
    data: HashMap<String, Vec<u8>>,
    load_count: usize,
    save_count: usize,
    fail_on_load: bool,
}

impl InMemoryConfigStore {
    /// Create a new empty in-memory config store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `data` under `key`.
    pub fn with_entry(key: &str, data: &[u8]) -> Self {
        let store = Self::new();
        store
            .inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .data
            .insert(key.to_string(), data.to_vec());
        store
    }

    /// Configure the store to fail on load operations.
    pub fn set_fail_on_load(&self, fail: bool) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.fail_on_load = fail;
    }

    /// Number of `load_raw` attempts, failed ones included.
    pub fn load_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .load_count
    }

    /// Number of `save_raw` calls.
    pub fn save_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .save_count
    }

    /// Check if a key exists in the store.
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .data
            .contains_key(key)
    }
}

impl ConfigStore for InMemoryConfigStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.load_count += 1;

        if inner.fail_on_load {
            return Err(ConfigError::Other("simulated load failure".into()));
        }

        inner.data.get(key).cloned().ok_or(ConfigError::NotFound)
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.save_count += 1;
        inner.data.insert(key.to_string(), data.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use decoy::RegistryConfig;

    #[test]
    fn missing_key_loads_defaults() {
        let store = InMemoryConfigStore::new();
        let config = RegistryConfig::load(&store, "registry").unwrap();
        assert_eq!(config, RegistryConfig::default());
        assert_eq!(store.load_count(), 1);
    }

    #[test]
    fn stored_json_is_parsed() {
        let json = serde_json::json!({ "restore_on_drop": true, "warn_on_leak": false });
        let store = InMemoryConfigStore::with_entry("registry", json.to_string().as_bytes());
        let config = RegistryConfig::load(&store, "registry").unwrap();
        assert!(config.restore_on_drop);
        assert!(!config.warn_on_leak);
    }

    #[test]
    fn load_failure_propagates() {
        let store = InMemoryConfigStore::new();
        store.set_fail_on_load(true);
        let result = RegistryConfig::load(&store, "registry");
        assert!(matches!(result, Err(ConfigError::Other(_))));
    }

    #[test]
    fn clone_shares_state_between_instances() {
        let store1 = InMemoryConfigStore::new();
        let store2 = store1.clone();

        RegistryConfig::default().save(&store1, "shared").unwrap();

        assert!(store2.contains_key("shared"));
        assert_eq!(store2.save_count(), 1);
    }
}
