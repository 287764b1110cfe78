//! Configuration types for taskrank
//!
//! Loaded from `taskrank.toml`:
//!
//! ```toml
//! default_strategy = "deadline_driven"
//!
//! [scoring]
//! horizon_days = 30
//! undated_urgency = 0.3
//! materiality = 0.05
//! ```

use crate::strategy::Strategy;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// File name looked up in the working directory when no path is given.
pub const CONFIG_FILE_NAME: &str = "taskrank.toml";

/// Main configuration structure for taskrank
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Strategy used when a request does not name one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_strategy: Option<Strategy>,

    /// Scoring parameters
    pub scoring: ScoringConfig,
}

/// Tunable constants of the scoring formulas.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ScoringConfig {
    /// Days until due at which urgency reaches zero.
    pub horizon_days: u32,
    /// Urgency of a task without a due date.
    pub undated_urgency: f64,
    /// Smallest weighted contribution (fraction of the full scale) that is
    /// worth explaining.
    pub materiality: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            horizon_days: 30,
            undated_urgency: 0.3,
            materiality: 0.05,
        }
    }
}

impl ScoringConfig {
    /// Check that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] naming the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.horizon_days == 0 {
            return Err(Error::configuration_with_help(
                "scoring.horizon_days must be at least 1",
                "The default horizon is 30 days",
            ));
        }
        for (name, value) in [
            ("scoring.undated_urgency", self.undated_urgency),
            ("scoring.materiality", self.materiality),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::configuration_with_help(
                    format!("{name} must be between 0 and 1, got {value}"),
                    "Sub-scores and contributions are fractions of the full scale",
                ));
            }
        }
        Ok(())
    }
}

impl Config {
    /// Parse and validate a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Configuration`] if the document does not parse or a
    /// value is out of range.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source).map_err(|e| {
            Error::configuration_with_help(
                e.message().to_string(),
                format!("Check {CONFIG_FILE_NAME} against the documented keys"),
            )
        })?;
        config.scoring.validate()?;
        Ok(config)
    }

    /// Load configuration from a file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the file cannot be read, or
    /// [`Error::Configuration`] if its contents are invalid.
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .map_err(|e| Error::io(e, Some(path.to_path_buf()), "read configuration"))?;
        let config = Self::from_toml_str(&source)?;
        debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Load `taskrank.toml` from `dir` if it exists, otherwise the defaults.
    ///
    /// # Errors
    ///
    /// Same as [`Config::load`] when the file exists.
    pub fn discover(dir: &Path) -> Result<Self> {
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            Self::load(&candidate)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.default_strategy, None);
        assert_eq!(config.scoring.horizon_days, 30);
        assert!((config.scoring.undated_urgency - 0.3).abs() < f64::EPSILON);
        assert!((config.scoring.materiality - 0.05).abs() < f64::EPSILON);
        assert!(config.scoring.validate().is_ok());
    }

    #[test]
    fn test_parse_full_document() {
        let config = Config::from_toml_str(
            r#"
            default_strategy = "critical_path"

            [scoring]
            horizon_days = 14
            undated_urgency = 0.1
            "#,
        )
        .unwrap();

        assert_eq!(config.default_strategy, Some(Strategy::CriticalPath));
        assert_eq!(config.scoring.horizon_days, 14);
        assert!((config.scoring.undated_urgency - 0.1).abs() < f64::EPSILON);
        // Unset keys keep their defaults
        assert!((config.scoring.materiality - 0.05).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unknown_strategy_is_a_config_error() {
        let err = Config::from_toml_str(r#"default_strategy = "smart""#).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_unknown_key_is_a_config_error() {
        let err = Config::from_toml_str("colour = \"blue\"").unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        let err = Config::from_toml_str("[scoring]\nhorizon_days = 0").unwrap_err();
        assert!(err.to_string().contains("horizon_days"));

        let err = Config::from_toml_str("[scoring]\nmateriality = 1.5").unwrap_err();
        assert!(err.to_string().contains("scoring.materiality"));
    }

    #[test]
    fn test_load_and_discover() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(Config::discover(dir.path()).unwrap(), Config::default());

        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "default_strategy = \"deadline_driven\"\n",
        )
        .unwrap();
        let config = Config::discover(dir.path()).unwrap();
        assert_eq!(config.default_strategy, Some(Strategy::DeadlineDriven));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
