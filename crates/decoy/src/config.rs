// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Registry configuration and the storage port it is loaded from.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Environment variable toggling [`RegistryConfig::restore_on_drop`].
pub const RESTORE_ON_DROP_ENV: &str = "DECOY_RESTORE_ON_DROP";
/// Environment variable toggling [`RegistryConfig::warn_on_leak`].
pub const WARN_ON_LEAK_ENV: &str = "DECOY_WARN_ON_LEAK";

/// Storage port for raw config blobs (keyed by logical name).
pub trait ConfigStore {
    /// Load a raw config blob. Returns `NotFound` when missing.
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError>;
    /// Persist a raw config blob.
    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError>;
}

/// Behavior of a [`PatchRegistry`](crate::PatchRegistry) when its last
/// handle is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Restore every live patch when the registry is dropped.
    pub restore_on_drop: bool,
    /// Log a warning for patches still live when the registry is dropped
    /// without restoring them.
    pub warn_on_leak: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            restore_on_drop: false,
            warn_on_leak: true,
        }
    }
}

impl RegistryConfig {
    /// Parse a JSON document. Missing fields take their defaults; an empty
    /// document yields the default config.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, ConfigError> {
        if bytes.is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Serialize as pretty JSON.
    pub fn to_json(&self) -> Result<Vec<u8>, ConfigError> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    /// Load from `store` under `key`; a missing key yields the default config.
    pub fn load<S>(store: &S, key: &str) -> Result<Self, ConfigError>
    where
        S: ConfigStore + ?Sized,
    {
        match store.load_raw(key) {
            Ok(bytes) => Self::from_json_slice(&bytes),
            Err(ConfigError::NotFound) => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    /// Persist to `store` under `key`.
    pub fn save<S>(&self, store: &S, key: &str) -> Result<(), ConfigError>
    where
        S: ConfigStore + ?Sized,
    {
        store.save_raw(key, &self.to_json()?)
    }

    /// Defaults overridden by [`RESTORE_ON_DROP_ENV`] and [`WARN_ON_LEAK_ENV`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(value) = lookup(RESTORE_ON_DROP_ENV) {
            config.restore_on_drop = parse_flag(RESTORE_ON_DROP_ENV, &value)?;
        }
        if let Some(value) = lookup(WARN_ON_LEAK_ENV) {
            config.warn_on_leak = parse_flag(WARN_ON_LEAK_ENV, &value)?;
        }
        Ok(config)
    }
}

fn parse_flag(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidEnv {
            var,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_warn_but_do_not_restore() {
        let config = RegistryConfig::default();
        assert!(!config.restore_on_drop);
        assert!(config.warn_on_leak);
        assert_eq!(RegistryConfig::from_json_slice(b"").unwrap(), config);
    }

    #[test]
    fn json_fills_missing_fields_with_defaults() {
        let config = RegistryConfig::from_json_slice(br#"{"restore_on_drop": true}"#).unwrap();
        assert!(config.restore_on_drop);
        assert!(config.warn_on_leak);
    }

    #[test]
    fn malformed_json_is_a_serde_error() {
        let result = RegistryConfig::from_json_slice(b"{not json");
        assert!(matches!(result, Err(ConfigError::Serde(_))));
    }

    #[test]
    fn lookup_parses_flags() {
        let vars: HashMap<&str, &str> =
            HashMap::from([(RESTORE_ON_DROP_ENV, " YES "), (WARN_ON_LEAK_ENV, "0")]);
        let config = RegistryConfig::from_lookup(|var| vars.get(var).map(ToString::to_string)).unwrap();
        assert!(config.restore_on_drop);
        assert!(!config.warn_on_leak);
    }

    #[test]
    fn lookup_rejects_garbage() {
        let result = RegistryConfig::from_lookup(|var| {
            (var == WARN_ON_LEAK_ENV).then(|| "maybe".to_string())
        });
        match result {
            Err(ConfigError::InvalidEnv { var, value }) => {
                assert_eq!(var, WARN_ON_LEAK_ENV);
                assert_eq!(value, "maybe");
            }
            other => panic!("expected InvalidEnv, got {other:?}"),
        }
    }
}
