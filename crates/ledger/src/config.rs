use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Everything the engine needs to find its journals, drive the ledger
/// binary, and tune the detectors. All fields have working defaults, so an
/// empty config file (or none at all) is valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Explicit ledger binary path. When unset, `hledger` is resolved from
    /// the PATH at spawn time.
    pub binary: Option<PathBuf>,
    /// The read-only journal holding the user's existing records.
    pub base_journal: PathBuf,
    /// The journal this tool appends imported transactions to.
    pub uploaded_journal: PathBuf,
    /// Subprocess deadline per ledger invocation.
    pub timeout_secs: u64,
    /// Currency symbol used when rendering journal entries and matching
    /// posting amounts.
    pub currency: String,
    /// Root account that expense reports and category listings query.
    pub expenses_account: String,
    pub detection: DetectionSettings,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let data_dir = default_data_dir();
        EngineConfig {
            binary: None,
            base_journal: data_dir.join("base.journal"),
            uploaded_journal: data_dir.join("uploaded.journal"),
            timeout_secs: 30,
            currency: "£".to_string(),
            expenses_account: "expenses".to_string(),
            detection: DetectionSettings::default(),
        }
    }
}

/// Detector thresholds, one table for both analyzers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionSettings {
    /// Minimum occurrences before a description group can recur.
    pub min_occurrences: usize,
    /// Maximum gap coefficient of variation for a recurring group.
    pub max_gap_cv: f64,
    /// Trailing amounts carried on each recurring pattern.
    pub recent_amounts: usize,
    /// Minimum non-zero months before a category is judged for anomalies.
    pub min_months: usize,
    /// Absolute z-score at which a month gets flagged.
    pub flag_z: f64,
    /// Absolute z-score at which a flagged month reads high severity.
    pub high_z: f64,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        DetectionSettings {
            min_occurrences: 3,
            max_gap_cv: 0.5,
            recent_amounts: 5,
            min_months: 3,
            flag_z: 1.5,
            high_z: 2.0,
        }
    }
}

impl EngineConfig {
    /// Loads from an explicit path, or from the platform config dir when
    /// one exists there, or falls back to defaults. An explicit path that
    /// cannot be read is an error; a missing default location is not.
    pub fn load(explicit: Option<&Path>) -> Result<Self, LedgerError> {
        if let Some(path) = explicit {
            let text = std::fs::read_to_string(path)?;
            return Ok(toml::from_str(&text)?);
        }
        if let Some(path) = default_config_path() {
            if path.exists() {
                let text = std::fs::read_to_string(&path)?;
                return Ok(toml::from_str(&text)?);
            }
        }
        Ok(EngineConfig::default())
    }
}

fn default_data_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "anomalyco", "quid")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("com", "anomalyco", "quid")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_is_all_defaults() {
        let config: EngineConfig = toml::from_str("").unwrap();
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.currency, "£");
        assert_eq!(config.expenses_account, "expenses");
        assert!(config.binary.is_none());
        assert_eq!(config.detection.min_occurrences, 3);
    }

    #[test]
    fn partial_toml_keeps_unnamed_defaults() {
        let text = r#"
currency = "$"
timeout_secs = 5

[detection]
flag_z = 1.8
"#;
        let config: EngineConfig = toml::from_str(text).unwrap();
        assert_eq!(config.currency, "$");
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.detection.flag_z, 1.8);
        assert_eq!(config.detection.high_z, 2.0);
        assert_eq!(config.detection.min_months, 3);
    }

    #[test]
    fn load_explicit_missing_path_errors() {
        let err = EngineConfig::load(Some(Path::new("/nonexistent/quid.toml")));
        assert!(matches!(err, Err(LedgerError::Io(_))));
    }

    #[test]
    fn load_explicit_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "currency = \"€\"\n").unwrap();
        let config = EngineConfig::load(Some(&path)).unwrap();
        assert_eq!(config.currency, "€");
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn config_round_trips_through_toml() {
        let mut config = EngineConfig::default();
        config.binary = Some(PathBuf::from("/usr/local/bin/hledger"));
        let text = toml::to_string(&config).unwrap();
        let back: EngineConfig = toml::from_str(&text).unwrap();
        assert_eq!(back.binary, config.binary);
        assert_eq!(back.base_journal, config.base_journal);
    }
}
