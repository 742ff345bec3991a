use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};

use crate::model::SourceMode;

pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";
pub const DEFAULT_UNITS: &str = "metric";
pub const DEFAULT_LANG: &str = "es";
pub const DEFAULT_MAX_HISTORY: usize = 10;

/// Upstream URLs. Overridable so tests and proxies can point elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    /// Legacy API root; `/weather` and `/forecast` are appended.
    pub base_url: String,
    pub one_call_url: String,
    pub geocoding_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            base_url: "https://api.openweathermap.org/data/2.5".to_string(),
            one_call_url: "https://api.openweathermap.org/data/3.0/onecall".to_string(),
            geocoding_url: "https://api.openweathermap.org/geo/1.0/direct".to_string(),
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// mode = "legacy"
///
/// [endpoints]
/// base_url = "https://api.openweathermap.org/data/2.5"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,

    /// Mode each request starts in, "extended" or "legacy".
    pub mode: Option<String>,

    pub units: String,
    pub lang: String,
    pub max_history: usize,
    pub endpoints: Endpoints,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            mode: None,
            units: DEFAULT_UNITS.to_string(),
            lang: DEFAULT_LANG.to_string(),
            max_history: DEFAULT_MAX_HISTORY,
            endpoints: Endpoints::default(),
        }
    }
}

impl Config {
    /// Starting mode as a strongly-typed value; Extended when unset.
    pub fn source_mode(&self) -> Result<SourceMode> {
        match self.mode.as_deref() {
            None => Ok(SourceMode::default()),
            Some(s) => SourceMode::try_from(s).map_err(|e| {
                anyhow!("{e}\nHint: set `mode` to \"extended\" or \"legacy\" in the config file.")
            }),
        }
    }

    pub fn set_source_mode(&mut self, mode: SourceMode) {
        self.mode = Some(mode.as_str().to_string());
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }

    /// API key from the environment if set, otherwise from the file.
    pub fn resolved_api_key(&self) -> Option<String> {
        std::env::var(API_KEY_ENV)
            .ok()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| self.api_key.clone().filter(|k| !k.trim().is_empty()))
    }

    pub fn is_configured(&self) -> bool {
        self.resolved_api_key().is_some()
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn config_file_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }

    /// Where favorites and search history are kept.
    pub fn store_file_path() -> Result<PathBuf> {
        Ok(project_dirs()?.data_dir().join("store.json"))
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("dev", "clima", "clima")
        .ok_or_else(|| anyhow!("Could not determine platform config directory"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_mode_is_extended() {
        let cfg = Config::default();
        assert_eq!(cfg.source_mode().expect("default mode"), SourceMode::Extended);
    }

    #[test]
    fn unknown_mode_has_hint() {
        let cfg = Config { mode: Some("onecall".into()), ..Config::default() };
        let err = cfg.source_mode().unwrap_err();

        assert!(err.to_string().contains("Unknown source mode"));
        assert!(err.to_string().contains("Hint"));
    }

    #[test]
    fn set_source_mode_overrides_default() {
        let mut cfg = Config::default();
        cfg.set_source_mode(SourceMode::Legacy);
        assert_eq!(cfg.source_mode().expect("mode"), SourceMode::Legacy);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = Config::from_toml_str(
            r#"
            api_key = "abc"

            [endpoints]
            base_url = "http://localhost:8080/data/2.5"
            "#,
        )
        .expect("valid toml");

        assert_eq!(cfg.api_key.as_deref(), Some("abc"));
        assert_eq!(cfg.units, DEFAULT_UNITS);
        assert_eq!(cfg.lang, DEFAULT_LANG);
        assert_eq!(cfg.max_history, DEFAULT_MAX_HISTORY);
        assert_eq!(cfg.endpoints.base_url, "http://localhost:8080/data/2.5");
        assert_eq!(cfg.endpoints.one_call_url, Endpoints::default().one_call_url);
    }

    #[test]
    fn toml_roundtrip_preserves_key_and_mode() {
        let mut cfg = Config::default();
        cfg.set_api_key("KEY".into());
        cfg.set_source_mode(SourceMode::Legacy);

        let text = toml::to_string_pretty(&cfg).expect("serialize");
        let back = Config::from_toml_str(&text).expect("parse");

        assert_eq!(back.api_key.as_deref(), Some("KEY"));
        assert_eq!(back.source_mode().expect("mode"), SourceMode::Legacy);
    }

    #[test]
    fn blank_stored_key_is_not_a_key() {
        let cfg = Config { api_key: Some("   ".into()), ..Config::default() };
        if std::env::var(API_KEY_ENV).is_err() {
            assert!(!cfg.is_configured());
        }
    }
}
