use std::fs;
use std::path::{Path, PathBuf};

use clearance_core::{CatalogError, RankCatalog};
use contracts::{EnforcementConfig, Rank};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid rank catalog: {0}")]
    Catalog(#[from] CatalogError),
}

/// Enforcement tuning plus rank definitions. Every field is optional in the
/// file; missing ones take the built-in defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SimulationConfig {
    pub enforcement: EnforcementConfig,
    pub ranks: Vec<Rank>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            enforcement: EnforcementConfig::default(),
            ranks: RankCatalog::default_catalog().ranks().to_vec(),
        }
    }
}

impl SimulationConfig {
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn catalog(&self) -> Result<RankCatalog, ConfigError> {
        Ok(RankCatalog::new(self.ranks.clone())?)
    }
}

#[cfg(test)]
mod tests {
    use contracts::ClearanceLevel;

    use super::*;

    #[test]
    fn empty_object_uses_defaults() {
        let config = SimulationConfig::from_json("{}").expect("defaults");
        assert_eq!(config, SimulationConfig::default());
        assert_eq!(config.catalog().expect("catalog").ranks().len(), 5);
    }

    #[test]
    fn custom_ranks_replace_defaults() {
        let config = SimulationConfig::from_json(
            r#"{
                "enforcement": {"notice_cooldown_ticks": 60},
                "ranks": [
                    {"name": "Cadet", "label": "Cadet", "seniority": 1},
                    {"name": "Captain", "label": "Captain", "seniority": 9,
                     "clearances": ["command", "research"]}
                ]
            }"#,
        )
        .expect("custom config");
        assert_eq!(config.enforcement.notice_cooldown_ticks, 60);
        assert_eq!(config.enforcement.patrol_interval_ticks, 120);
        let catalog = config.catalog().expect("catalog");
        assert_eq!(catalog.entry_rank().name, "Cadet");
        assert!(catalog.get("Captain").unwrap().has_clearance(ClearanceLevel::Command));
    }

    #[test]
    fn empty_rank_list_is_rejected() {
        let config = SimulationConfig::from_json(r#"{"ranks": []}"#).expect("parses");
        assert!(matches!(config.catalog(), Err(ConfigError::Catalog(CatalogError::Empty))));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = SimulationConfig::load("/nonexistent/clearance.json").unwrap_err();
        assert!(err.to_string().contains("/nonexistent/clearance.json"));
    }
}
