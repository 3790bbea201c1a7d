//! TOML-based application configuration.
//!
//! Stored at `data_dir()/config.toml`. Holds the session defaults, the
//! active user profile and notification preferences. Keys are addressed
//! with dot paths (`session.default_target_min`) by the CLI.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConfigError;
use crate::storage::data_dir;

/// Session defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Target duration in minutes when a start gives none.
    #[serde(default = "default_target_min")]
    pub default_target_min: u64,
    /// Tick cadence for the session runner, in milliseconds.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

/// The user whose ledger gets credited. Always explicit; nothing in the
/// core reads it from a global.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileConfig {
    #[serde(default = "default_user_id")]
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    /// Whether completion and abandonment events should be surfaced.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub profile: ProfileConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
}

fn default_target_min() -> u64 {
    25
}

fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_user_id() -> String {
    "default".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_target_min: default_target_min(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

impl Default for ProfileConfig {
    fn default() -> Self {
        Self {
            user_id: default_user_id(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            session: SessionConfig::default(),
            profile: ProfileConfig::default(),
            notifications: NotificationsConfig::default(),
        }
    }
}

impl Config {
    fn path() -> Result<PathBuf, std::io::Error> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load the configuration, writing defaults on first run.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path().map_err(|e| ConfigError::LoadFailed {
            path: PathBuf::from("config.toml"),
            message: e.to_string(),
        })?;

        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path,
                message: e.to_string(),
            }),
            Err(_) => {
                let config = Self::default();
                config.save()?;
                Ok(config)
            }
        }
    }

    /// Load, falling back to defaults if the file is unreadable or broken.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path().map_err(|e| ConfigError::SaveFailed {
            path: PathBuf::from("config.toml"),
            message: e.to_string(),
        })?;
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })
    }

    /// Read a value by dot path, rendered as a plain string.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let mut current = &json;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(match current {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    /// Set a value by dot path, parsing `raw` against the existing type.
    /// Does not persist; call [`Config::save`] afterwards.
    pub fn set(&mut self, key: &str, raw: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| {
            ConfigError::ParseFailed(e.to_string())
        })?;
        set_path(&mut json, key, raw)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }
}

fn set_path(root: &mut Value, key: &str, raw: &str) -> Result<(), ConfigError> {
    let mut current = root;
    let mut parts = key.split('.').peekable();
    while let Some(part) = parts.next() {
        let Some(next) = current.get_mut(part) else {
            return Err(ConfigError::UnknownKey(key.to_string()));
        };
        if parts.peek().is_none() {
            *next = parse_as_existing(next, key, raw)?;
            return Ok(());
        }
        current = next;
    }
    Err(ConfigError::UnknownKey(key.to_string()))
}

fn parse_as_existing(existing: &Value, key: &str, raw: &str) -> Result<Value, ConfigError> {
    match existing {
        Value::Bool(_) => raw
            .parse::<bool>()
            .map(Value::Bool)
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("expected true or false, got '{raw}'"),
            }),
        Value::Number(_) => {
            if let Ok(n) = raw.parse::<u64>() {
                Ok(Value::from(n))
            } else if let Ok(n) = raw.parse::<i64>() {
                Ok(Value::from(n))
            } else if let Ok(n) = raw.parse::<f64>() {
                Ok(Value::from(n))
            } else {
                Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("expected a number, got '{raw}'"),
                })
            }
        }
        Value::String(_) => Ok(Value::String(raw.to_string())),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: "not a settable value".to_string(),
        }),
    }
}
