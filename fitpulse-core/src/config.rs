//! Configuration management
//!
//! Settings live in `settings.json` in the data directory:
//! ```json
//! {
//!   "app": { "demoMode": false, "activeUser": "2f1c..." }
//! }
//! ```
//! Keys this crate does not manage are preserved when saving.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::result::{Error, Result};

pub const SETTINGS_FILE: &str = "settings.json";
pub const DATA_DIR_ENV: &str = "FITPULSE_DIR";
pub const DEMO_MODE_ENV: &str = "FITPULSE_DEMO_MODE";
pub const USER_ENV: &str = "FITPULSE_USER";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    app: AppSettings,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppSettings {
    #[serde(default)]
    demo_mode: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    active_user: Option<Uuid>,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

/// FitPulse configuration (the subset of settings the core uses)
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub demo_mode: bool,
    pub active_user: Option<Uuid>,
}

/// Parse a boolean-ish env value; None for anything unrecognised
fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

fn read_settings(path: &Path) -> Result<SettingsFile> {
    if !path.exists() {
        return Ok(SettingsFile::default());
    }
    let content = std::fs::read_to_string(path)?;
    match serde_json::from_str(&content) {
        Ok(settings) => Ok(settings),
        Err(e) => {
            tracing::warn!(path = %path.display(), "ignoring unreadable settings: {}", e);
            Ok(SettingsFile::default())
        }
    }
}

impl Config {
    /// Load config from the data directory
    ///
    /// `FITPULSE_DEMO_MODE` overrides `app.demoMode` and `FITPULSE_USER`
    /// overrides `app.activeUser`.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let raw = read_settings(&data_dir.join(SETTINGS_FILE))?;

        let demo_mode = std::env::var(DEMO_MODE_ENV)
            .ok()
            .and_then(|v| parse_flag(&v))
            .unwrap_or(raw.app.demo_mode);

        let active_user = match std::env::var(USER_ENV) {
            Ok(v) if !v.trim().is_empty() => Some(
                Uuid::parse_str(v.trim())
                    .map_err(|_| Error::Config(format!("{} is not a valid user id: {}", USER_ENV, v)))?,
            ),
            _ => raw.app.active_user,
        };

        Ok(Self {
            demo_mode,
            active_user,
        })
    }

    /// Save config, preserving settings this crate doesn't manage
    pub fn save(&self, data_dir: &Path) -> Result<()> {
        std::fs::create_dir_all(data_dir)?;
        let settings_path = data_dir.join(SETTINGS_FILE);

        let mut settings = read_settings(&settings_path)?;
        settings.app.demo_mode = self.demo_mode;
        settings.app.active_user = self.active_user;

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)?;
        Ok(())
    }

    pub fn enable_demo_mode(&mut self) {
        self.demo_mode = true;
    }

    pub fn disable_demo_mode(&mut self) {
        self.demo_mode = false;
    }

    /// Database file for the current mode
    pub fn database_path(&self, data_dir: &Path) -> PathBuf {
        if self.demo_mode {
            data_dir.join("demo.duckdb")
        } else {
            data_dir.join("fitpulse.duckdb")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("YES"), Some(true));
        assert_eq!(parse_flag(" 1 "), Some(true));
        assert_eq!(parse_flag("no"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }

    #[test]
    fn test_defaults_without_file() {
        let dir = TempDir::new().unwrap();
        let raw = read_settings(&dir.path().join(SETTINGS_FILE)).unwrap();
        assert!(!raw.app.demo_mode);
        assert!(raw.app.active_user.is_none());
    }

    #[test]
    fn test_save_preserves_unknown_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(
            &path,
            r#"{"app": {"demoMode": false, "theme": "dark"}, "plugins": {"x": 1}}"#,
        )
        .unwrap();

        let user = Uuid::new_v4();
        let config = Config {
            demo_mode: true,
            active_user: Some(user),
        };
        config.save(dir.path()).unwrap();

        let saved: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["app"]["demoMode"], true);
        assert_eq!(saved["app"]["activeUser"], user.to_string());
        assert_eq!(saved["app"]["theme"], "dark");
        assert_eq!(saved["plugins"]["x"], 1);
    }

    #[test]
    fn test_unreadable_settings_fall_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(SETTINGS_FILE), "not json").unwrap();
        let raw = read_settings(&dir.path().join(SETTINGS_FILE)).unwrap();
        assert!(!raw.app.demo_mode);
    }

    #[test]
    fn test_database_path_follows_mode() {
        let dir = Path::new("/data");
        let mut config = Config::default();
        assert_eq!(config.database_path(dir), dir.join("fitpulse.duckdb"));
        config.enable_demo_mode();
        assert_eq!(config.database_path(dir), dir.join("demo.duckdb"));
    }
}
