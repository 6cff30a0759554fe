//! TOML-based host settings.
//!
//! Stores settings that are not part of the mute schedule itself:
//! - Time table provider endpoint and request timeout
//! - Logging level, event journal switch and journal size
//!
//! Settings are stored at `~/.config/prayermute/config.toml`. Schedule
//! preferences (location, offsets, mute mode) live in the state store.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::ConfigError;

/// Time table provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Country used by `location list` when none is given.
    #[serde(default = "default_country")]
    pub default_country: String,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogSettings {
    /// Default tracing level when RUST_LOG is unset.
    #[serde(default = "default_level")]
    pub level: String,
    /// Record core events in the SQLite journal.
    #[serde(default = "default_true")]
    pub journal: bool,
    /// Journal rows kept; older rows are pruned on insert.
    #[serde(default = "default_journal_limit")]
    pub journal_limit: usize,
}

/// Host settings.
///
/// Serialized to/from TOML at `~/.config/prayermute/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub provider: ProviderSettings,
    #[serde(default)]
    pub log: LogSettings,
}

// Default functions
fn default_base_url() -> String {
    "https://prayertimes.api.abdus.dev/".into()
}
fn default_timeout_secs() -> u64 {
    15
}
fn default_country() -> String {
    "Turkey".into()
}
fn default_level() -> String {
    "info".into()
}
fn default_true() -> bool {
    true
}
fn default_journal_limit() -> usize {
    super::database::JOURNAL_LIMIT
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            default_country: default_country(),
        }
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_level(),
            journal: true,
            journal_limit: default_journal_limit(),
        }
    }
}

impl Settings {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        let n = value
                            .parse::<u64>()
                            .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?;
                        serde_json::Value::Number(n.into())
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from disk or return default.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    /// Load from an explicit path, writing defaults there if it is missing.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without persisting it.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown or the value cannot be parsed.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        Ok(())
    }

    /// Load from disk, falling back to defaults on error.
    ///
    /// Runs before logging is set up, so the error goes straight to stderr.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            eprintln!("warning: {e}; using default settings");
            Self::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Settings::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Settings = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.provider.timeout_secs, 15);
        assert!(parsed.log.journal);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Settings = toml::from_str(indoc! {r#"
            [provider]
            base_url = "http://localhost:8080/"
        "#})
        .unwrap();
        assert_eq!(parsed.provider.base_url, "http://localhost:8080/");
        assert_eq!(parsed.provider.default_country, "Turkey");
        assert_eq!(parsed.log.level, "info");
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Settings::default();
        assert_eq!(cfg.get("log.journal").as_deref(), Some("true"));
        assert_eq!(cfg.get("provider.timeout_secs").as_deref(), Some("15"));
        assert!(cfg.get("provider.missing_key").is_none());
    }

    #[test]
    fn set_updates_nested_values() {
        let mut cfg = Settings::default();
        cfg.set("log.journal", "false").unwrap();
        cfg.set("provider.timeout_secs", "30").unwrap();
        cfg.set("log.level", "debug").unwrap();
        assert!(!cfg.log.journal);
        assert_eq!(cfg.provider.timeout_secs, 30);
        assert_eq!(cfg.log.level, "debug");
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Settings::default();
        assert!(matches!(
            cfg.set("log.nonexistent_key", "value"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(cfg.set("", "value").is_err());
    }

    #[test]
    fn set_rejects_invalid_type() {
        let mut cfg = Settings::default();
        assert!(matches!(
            cfg.set("log.journal", "not_a_bool"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(cfg.set("provider.timeout_secs", "soon").is_err());
    }

    #[test]
    fn load_from_missing_file_writes_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Settings::load_from(&path).unwrap();
        assert_eq!(cfg.provider.timeout_secs, 15);
        assert!(path.exists());

        let mut cfg = cfg;
        cfg.set("provider.default_country", "Germany").unwrap();
        cfg.save_to(&path).unwrap();
        let reloaded = Settings::load_from(&path).unwrap();
        assert_eq!(reloaded.provider.default_country, "Germany");
    }

    #[test]
    fn load_from_rejects_broken_toml() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[provider\nbase_url = ").unwrap();
        assert!(matches!(
            Settings::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
    }
}
