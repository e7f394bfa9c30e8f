// SPDX-License-Identifier: MIT

//! Typed access over the plain string map configuration is defined as.
//!
//! Text parsing (JSON/TOML/HCL/...) into this map is explicitly an external
//! collaborator's job; this module only offers typed getters on top of it.

use std::collections::HashMap;

use crate::error::ConfigError;

/// A component's parsed configuration: string keys to string values.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ConfigMap(HashMap<String, String>);

impl ConfigMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(map: HashMap<String, String>) -> Self {
        Self(map)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn require_str(&self, key: &str) -> Result<&str, ConfigError> {
        self.get(key)
            .ok_or_else(|| ConfigError::MissingKey(key.to_string()))
    }

    pub fn get_u64(&self, key: &str) -> Result<Option<u64>, ConfigError> {
        self.parse_opt(key, "u64")
    }

    pub fn require_u64(&self, key: &str) -> Result<u64, ConfigError> {
        self.get_u64(key)?
            .ok_or_else(|| ConfigError::MissingKey(key.to_string()))
    }

    pub fn get_i64(&self, key: &str) -> Result<Option<i64>, ConfigError> {
        self.parse_opt(key, "i64")
    }

    pub fn get_bool(&self, key: &str) -> Result<Option<bool>, ConfigError> {
        self.parse_opt(key, "bool")
    }

    fn parse_opt<T: std::str::FromStr>(
        &self,
        key: &str,
        expected: &'static str,
    ) -> Result<Option<T>, ConfigError> {
        match self.0.get(key) {
            None => Ok(None),
            Some(raw) => raw
                .parse()
                .map(Some)
                .map_err(|_| ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: raw.clone(),
                    expected,
                }),
        }
    }
}

/// Loads configuration text for a named instance from some external source.
///
/// Parsing the returned text into a [`ConfigMap`] is the caller's job;
/// this trait only moves bytes, matching the scope boundary configuration
/// file loading is given.
pub trait ConfigLoader: Send + Sync {
    fn load(&self, name: &str, uri: &str) -> Option<String>;
}

/// Persists configuration text for a named instance, if the container was
/// given a saver. Saving is best-effort: implementations should not panic on
/// I/O failure.
pub trait ConfigSaver: Send + Sync {
    fn save(&self, name: &str, uri: &str, text: &str);
}

#[cfg(any(test, feature = "test-support"))]
pub mod test_support {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap as Map;

    /// In-memory loader/saver double: keyed by `name`, matching how a
    /// container actually calls it (the `uri` is one shared handle to a
    /// config source across every call; `name` is what picks an entry out
    /// of it). No text parsing happens here at all.
    #[derive(Default)]
    pub struct MapConfigLoader {
        entries: Mutex<Map<String, String>>,
    }

    impl MapConfigLoader {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
            self.entries.get_mut().insert(name.into(), text.into());
            self
        }

        pub fn set(&self, name: impl Into<String>, text: impl Into<String>) {
            self.entries.lock().insert(name.into(), text.into());
        }
    }

    impl ConfigLoader for MapConfigLoader {
        fn load(&self, name: &str, _uri: &str) -> Option<String> {
            self.entries.lock().get(name).cloned()
        }
    }

    impl ConfigSaver for MapConfigLoader {
        fn save(&self, name: &str, _uri: &str, text: &str) {
            self.entries.lock().insert(name.to_string(), text.to_string());
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
