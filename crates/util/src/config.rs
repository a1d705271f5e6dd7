//! Keynav configuration file.
//!
//! A small JSON document controlling which attributes mark lists, items and
//! hotkeys, how long live item queries are cached, and which keys trigger
//! each list operation. The file lives at `~/.config/keynav/config.json` on
//! most platforms; `KEYNAV_CONFIG_PATH` overrides the location. A missing file
//! yields defaults, and so does an unparsable one (with a warning).

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use dirs_next::{config_dir, home_dir};
use indexmap::IndexMap;
use keynav_types::{KeyChord, attributes};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Environment variable allowing callers to override the config file path.
pub const CONFIG_PATH_ENV: &str = "KEYNAV_CONFIG_PATH";

/// Default filename for the JSON payload.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Default lifetime of a cached live item query.
pub const DEFAULT_CACHE_TTL_MS: u64 = 5_000;

/// Error surfaced when reading or writing the configuration fails.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Selectors used to discover lists, items and hotkeys in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Selector matching list containers.
    pub list: String,
    /// Selector matching items inside a list container.
    pub list_item: String,
    /// Attribute carrying a hotkey declaration.
    pub hotkey_attribute: String,
    /// Attribute carrying a selector for a separate hotkey trigger.
    pub hotkey_target_attribute: String,
    /// Overrides the focus-trap activatable selector when set.
    pub activatable: Option<String>,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            list: format!("[{}]", attributes::LIST),
            list_item: format!("[{}]", attributes::LIST_ITEM),
            hotkey_attribute: attributes::HOTKEY_KEY.to_string(),
            hotkey_target_attribute: attributes::HOTKEY_TARGET.to_string(),
            activatable: None,
        }
    }
}

/// Persisted keynav settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeynavConfig {
    pub selectors: SelectorConfig,
    /// Cache lifetime for live item queries in milliseconds; `0` disables it.
    pub cache_ttl_ms: u64,
    /// Replacement key sets per operation name (`NEXT`, `PREV`, ...).
    pub key_overrides: IndexMap<String, Vec<KeyChord>>,
}

impl Default for KeynavConfig {
    fn default() -> Self {
        Self {
            selectors: SelectorConfig::default(),
            cache_ttl_ms: DEFAULT_CACHE_TTL_MS,
            key_overrides: IndexMap::new(),
        }
    }
}

impl KeynavConfig {
    /// Loads the configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&default_config_path())
    }

    /// Loads the configuration from `path`, falling back to defaults when the
    /// file does not exist or cannot be parsed.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match fs::read_to_string(path) {
            Ok(data) => match serde_json::from_str(&data) {
                Ok(config) => {
                    debug!(path = %path.display(), "loaded keynav config");
                    Ok(config)
                }
                Err(error) => {
                    warn!(
                        path = %path.display(),
                        error = %error,
                        "Failed to parse keynav config; using defaults"
                    );
                    Ok(Self::default())
                }
            },
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(error) => Err(ConfigError::Io(error)),
        }
    }

    /// Writes the configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(self)?;
        fs::write(path, data)?;
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }
}

/// Resolves the config file path, honoring `KEYNAV_CONFIG_PATH`.
pub fn default_config_path() -> PathBuf {
    if let Ok(path) = env::var(CONFIG_PATH_ENV)
        && !path.trim().is_empty()
    {
        return expand_tilde(&path);
    }

    config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("keynav")
        .join(CONFIG_FILE_NAME)
}

/// Expands a leading `~` to the home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    let trimmed = path.trim();
    let home = || home_dir().unwrap_or_else(|| PathBuf::from("~"));
    if trimmed == "~" {
        return home();
    }
    match trimmed.strip_prefix("~/").or_else(|| trimmed.strip_prefix("~\\")) {
        Some(rest) => home().join(rest),
        None => PathBuf::from(trimmed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keynav_types::CanonicalKey;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = KeynavConfig::load_from(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, KeynavConfig::default());
        assert_eq!(config.cache_ttl(), Duration::from_secs(5));
        assert_eq!(config.selectors.list, "[data-knw-list]");
    }

    #[test]
    fn unparsable_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();
        let config = KeynavConfig::load_from(&path).unwrap();
        assert_eq!(config, KeynavConfig::default());
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"cache_ttl_ms": 0, "key_overrides": {"NEXT": ["j", "ArrowDown"]}}"#).unwrap();
        let config = KeynavConfig::load_from(&path).unwrap();
        assert_eq!(config.cache_ttl_ms, 0);
        assert_eq!(config.selectors, SelectorConfig::default());
        let next = config.key_overrides.get("NEXT").expect("NEXT override");
        assert_eq!(next[0].key, CanonicalKey::Char('j'));
        assert_eq!(next[1].key, CanonicalKey::ArrowDown);
    }

    #[test]
    fn save_then_load_preserves_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let mut config = KeynavConfig::default();
        config.selectors.activatable = Some("[data-extra]".into());
        config.save_to(&path).unwrap();
        assert_eq!(KeynavConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn env_var_overrides_path() {
        temp_env::with_var(CONFIG_PATH_ENV, Some("/tmp/keynav-test/config.json"), || {
            assert_eq!(default_config_path(), PathBuf::from("/tmp/keynav-test/config.json"));
        });
        temp_env::with_var(CONFIG_PATH_ENV, Some("   "), || {
            assert!(default_config_path().ends_with("keynav/config.json"));
        });
    }
}
