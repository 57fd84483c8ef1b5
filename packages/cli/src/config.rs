//! TOML analysis configuration.
//!
//! ```toml
//! strategy = "vertex-index"
//! cell_size = 250.0
//!
//! [suggestions]
//! feasibility_floor = 0.85
//! area_normalizer = 1000.0
//! ```
//!
//! Every key is optional. The adjacency tolerance and the graph key
//! resolution are fixed and not configurable here.

use std::path::Path;

use landswap_adjacency::DetectionStrategy;
use landswap_exchange::SuggestionParams;
use landswap_spatial::DEFAULT_CELL_SIZE;
use serde::{Deserialize, Serialize};

/// Errors from loading or validating an [`AnalysisConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path that caused the error.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The config file is not valid TOML for this schema.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("Invalid config: {message}")]
    Invalid {
        /// Description of what went wrong.
        message: String,
    },
}

/// Parameters for one analysis run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Adjacency candidate strategy.
    pub strategy: DetectionStrategy,
    /// Grid cell size for [`DetectionStrategy::Grid`].
    pub cell_size: f64,
    /// Exchange scoring parameters.
    pub suggestions: SuggestionParams,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            strategy: DetectionStrategy::default(),
            cell_size: DEFAULT_CELL_SIZE,
            suggestions: SuggestionParams::default(),
        }
    }
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Overrides {
    pub strategy: Option<DetectionStrategy>,
    pub cell_size: Option<f64>,
    pub feasibility_floor: Option<f64>,
}

impl AnalysisConfig {
    /// Replaces every value `overrides` sets and validates the result.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if an override is out of range.
    pub fn with_overrides(mut self, overrides: Overrides) -> Result<Self, ConfigError> {
        if let Some(strategy) = overrides.strategy {
            self.strategy = strategy;
        }
        if let Some(cell_size) = overrides.cell_size {
            self.cell_size = cell_size;
        }
        if let Some(floor) = overrides.feasibility_floor {
            self.suggestions.feasibility_floor = floor;
        }

        self.validate()?;
        Ok(self)
    }

    /// Reads and validates a TOML config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read, is not valid
    /// TOML, or holds out-of-range values.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        log::debug!("Loaded analysis config from {}: {config:?}", path.display());
        Ok(config)
    }

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] or [`ConfigError::Invalid`].
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every value is in range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: String| Err(ConfigError::Invalid { message });

        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return invalid(format!("cell_size must be positive, got {}", self.cell_size));
        }
        let floor = self.suggestions.feasibility_floor;
        if !(0.0..=1.0).contains(&floor) {
            return invalid(format!("feasibility_floor must be in [0, 1], got {floor}"));
        }
        let normalizer = self.suggestions.area_normalizer;
        if !(normalizer.is_finite() && normalizer > 0.0) {
            return invalid(format!("area_normalizer must be positive, got {normalizer}"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = AnalysisConfig::from_toml_str("").unwrap();
        assert_eq!(config, AnalysisConfig::default());
        assert_eq!(config.strategy, DetectionStrategy::VertexIndex);
        assert!((config.cell_size - 250.0).abs() < f64::EPSILON);
        assert!((config.suggestions.feasibility_floor - 0.85).abs() < f64::EPSILON);
    }

    #[test]
    fn partial_document_overrides_keys() {
        let config = AnalysisConfig::from_toml_str(
            "strategy = \"grid\"\ncell_size = 100.0\n[suggestions]\nfeasibility_floor = 0.9\n",
        )
        .unwrap();
        assert_eq!(config.strategy, DetectionStrategy::Grid);
        assert!((config.cell_size - 100.0).abs() < f64::EPSILON);
        assert!((config.suggestions.feasibility_floor - 0.9).abs() < f64::EPSILON);
        assert!((config.suggestions.area_normalizer - 1000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = AnalysisConfig::from_toml_str("tolerance = 0.5").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)), "{err}");
    }

    #[test]
    fn misspelled_suggestion_key_is_rejected() {
        let err = AnalysisConfig::from_toml_str("[suggestions]\nfeasability_floor = 0.5")
            .unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)), "{err}");
    }

    #[test]
    fn overrides_replace_file_values() {
        let file = AnalysisConfig::from_toml_str(
            "strategy = \"grid\"\ncell_size = 100.0\n[suggestions]\nfeasibility_floor = 0.9\n",
        )
        .unwrap();
        let config = file
            .with_overrides(Overrides {
                strategy: Some(DetectionStrategy::Naive),
                cell_size: Some(40.0),
                feasibility_floor: Some(0.5),
            })
            .unwrap();
        assert_eq!(config.strategy, DetectionStrategy::Naive);
        assert!((config.cell_size - 40.0).abs() < f64::EPSILON);
        assert!((config.suggestions.feasibility_floor - 0.5).abs() < f64::EPSILON);
        assert!((config.suggestions.area_normalizer - 1000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unset_overrides_keep_file_values() {
        let file =
            AnalysisConfig::from_toml_str("strategy = \"grid\"\ncell_size = 100.0").unwrap();
        assert_eq!(file.with_overrides(Overrides::default()).unwrap(), file);

        let config = file
            .with_overrides(Overrides {
                cell_size: Some(10.0),
                ..Overrides::default()
            })
            .unwrap();
        assert_eq!(config.strategy, DetectionStrategy::Grid);
        assert!((config.cell_size - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn out_of_range_overrides_are_rejected() {
        let config = AnalysisConfig::default();
        for overrides in [
            Overrides {
                cell_size: Some(0.0),
                ..Overrides::default()
            },
            Overrides {
                feasibility_floor: Some(1.2),
                ..Overrides::default()
            },
        ] {
            let err = config.with_overrides(overrides).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { .. }), "{overrides:?}: {err}");
        }
    }

    #[test]
    fn unknown_strategy_is_rejected() {
        assert!(AnalysisConfig::from_toml_str("strategy = \"quadtree\"").is_err());
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        for doc in [
            "cell_size = 0.0",
            "cell_size = -3.0",
            "[suggestions]\nfeasibility_floor = 1.5",
            "[suggestions]\narea_normalizer = 0.0",
        ] {
            let err = AnalysisConfig::from_toml_str(doc).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { .. }), "{doc}: {err}");
        }
    }
}
