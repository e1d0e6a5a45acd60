//! Engine configuration stored in `~/.service-insights/config.json`.
//!
//! Every field has a default, so a missing file or a partial file is valid.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::alerts::AlertWindowConfig;
use crate::error::ConfigError;
use crate::metrics::AggregateOptions;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Alert window for users who never saved their own.
    pub default_alert_window: AlertWindowConfig,
    pub aggregation: AggregateOptions,
    /// SQLite file for layouts and alert windows. Defaults next to this file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,
}

impl EngineConfig {
    pub fn database_path(&self) -> Option<PathBuf> {
        self.database_path
            .clone()
            .or_else(crate::db::default_db_path)
    }
}

pub fn config_path() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::HomeDirNotFound)?;
    Ok(home.join(".service-insights").join("config.json"))
}

/// Load the config from its default location.
pub fn load_config() -> Result<EngineConfig, ConfigError> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(path: &Path) -> Result<EngineConfig, ConfigError> {
    if !path.exists() {
        log::info!("No config at {}, using defaults", path.display());
        return Ok(EngineConfig::default());
    }

    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config: EngineConfig =
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

    config.default_alert_window.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.default_alert_window.short_term_days, 30);
        assert_eq!(config.aggregation.recent_days, 7);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"defaultAlertWindow": {"shortTermDays": 15, "longTermDays": 45},
                "aggregation": {"topValuesLimit": 3},
                "databasePath": "/tmp/insights.db"}"#,
        )
        .unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.default_alert_window, AlertWindowConfig::new(15, 45).unwrap());
        assert_eq!(config.aggregation.top_values_limit, 3);
        assert_eq!(config.aggregation.recent_activity_limit, 10);
        assert_eq!(config.database_path(), Some(PathBuf::from("/tmp/insights.db")));
    }

    #[test]
    fn invalid_window_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(
            &path,
            r#"{"defaultAlertWindow": {"shortTermDays": 60, "longTermDays": 30}}"#,
        )
        .unwrap();
        let err = load_config_from(&path).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn malformed_json_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{").unwrap();
        assert!(matches!(
            load_config_from(&path),
            Err(ConfigError::Parse { .. })
        ));
    }
}
