//! Configuration
//!
//! [`SignalConfig`] is the structured configuration the signal bundle reads from
//! the host application's configuration. [`ConfigService`] is a flat key/value
//! store, seeded from the process environment, for hosts that configure the
//! bundle through environment variables instead of a config file.

mod signal;

pub use signal::{ConfigError, HasSignalConfig, SignalConfig, env_keys};

use dashmap::DashMap;
use std::env;
use std::sync::Arc;

/// Configuration service
#[derive(Clone, Default)]
pub struct ConfigService {
    config: Arc<DashMap<String, String>>,
}

impl ConfigService {
    /// Create a config service holding every variable of the current process environment.
    pub fn from_env() -> Self {
        Self::from_pairs(env::vars())
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let service = Self::default();
        for (key, value) in pairs {
            service.config.insert(key.into(), value.into());
        }
        service
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.config.get(key).map(|v| v.clone())
    }

    /// Like [`get`](Self::get), but treats blank values as unset.
    pub fn get_non_blank(&self, key: &str) -> Option<String> {
        self.get(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Parse a boolean flag. Missing or blank keys yield `Ok(None)`.
    pub fn get_bool(&self, key: &str) -> Result<Option<bool>, ConfigError> {
        match self.get_non_blank(key) {
            None => Ok(None),
            Some(raw) => match raw.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(Some(true)),
                "false" | "0" | "no" => Ok(Some(false)),
                _ => Err(ConfigError::invalid_value(key, raw)),
            },
        }
    }

    pub fn set(&self, key: &str, value: &str) {
        self.config.insert(key.to_string(), value.to_string());
    }
}
