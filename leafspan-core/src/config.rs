//! Run configuration
//!
//! Everything a lifespan sweep needs apart from the photosynthesis model
//! itself, loadable from TOML. Missing tables and keys take the reference
//! values, so an empty file describes the reference run.
//!
//! ```toml
//! maintenance_fraction = 0.6
//!
//! [environment]
//! ci = 280.0
//! tleaf = 298.15
//! par = 1800.0
//!
//! [sweep]
//! start = 0.0
//! stop = 6000.0
//! points = 30
//! ```

use crate::accumulator::{DaylightSchedule, UnitConversions};
use crate::errors::LeafspanError;
use crate::leaf::{EnvironmentalState, PhysiologicalParameters};
use crate::objective::{CostParameters, DEFAULT_MAINTENANCE_FRACTION};
use crate::optimizer::OptimizerSettings;
use crate::sweep::CostGrid;
use crate::FloatValue;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Error raised while loading or checking a run configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("Could not parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Could not serialise configuration: {0}")]
    Serialise(#[from] toml::ser::Error),
    #[error(transparent)]
    Invalid(#[from] LeafspanError),
}

/// Cost sweep definition: an even grid, or an explicit list of costs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepSpec {
    /// unit: g C m⁻²
    pub start: FloatValue,
    /// unit: g C m⁻²
    pub stop: FloatValue,
    pub points: usize,
    /// Overrides the grid when present
    #[serde(skip_serializing_if = "Option::is_none")]
    pub costs: Option<Vec<FloatValue>>,
}

impl Default for SweepSpec {
    fn default() -> Self {
        let grid = CostGrid::default();
        Self {
            start: grid.start,
            stop: grid.stop,
            points: grid.points,
            costs: None,
        }
    }
}

impl SweepSpec {
    pub fn grid(&self) -> CostGrid {
        CostGrid {
            start: self.start,
            stop: self.stop,
            points: self.points,
        }
    }

    pub fn costs(&self) -> Result<Vec<FloatValue>, LeafspanError> {
        match &self.costs {
            Some(costs) => Ok(costs.clone()),
            None => self.grid().values(),
        }
    }
}

/// Full description of a sweep run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// default: 0.6
    pub maintenance_fraction: FloatValue,
    pub environment: EnvironmentalState,
    pub physiology: PhysiologicalParameters,
    pub daylight: DaylightSchedule,
    pub conversions: UnitConversions,
    pub optimizer: OptimizerSettings,
    pub sweep: SweepSpec,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            maintenance_fraction: DEFAULT_MAINTENANCE_FRACTION,
            environment: EnvironmentalState::default(),
            physiology: PhysiologicalParameters::default(),
            daylight: DaylightSchedule::default(),
            conversions: UnitConversions::default(),
            optimizer: OptimizerSettings::default(),
            sweep: SweepSpec::default(),
        }
    }
}

impl RunConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: RunConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every section without running anything.
    pub fn validate(&self) -> Result<(), LeafspanError> {
        self.environment.validate()?;
        self.physiology.validate()?;
        self.daylight.validate()?;
        self.optimizer.validate()?;
        CostParameters::new(0.0)
            .with_maintenance_fraction(self.maintenance_fraction)
            .validate()?;
        self.sweep.costs()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_reference_run() {
        let config = RunConfig::from_toml_str("").unwrap();
        assert_eq!(config, RunConfig::default());
        assert_eq!(config.sweep.costs().unwrap().len(), 30);
        assert_eq!(config.optimizer.initial_guess, 50.0);
        assert_eq!(config.optimizer.upper, 1095.0);
    }

    #[test]
    fn test_partial_sections() {
        let config = RunConfig::from_toml_str(
            r#"
            maintenance_fraction = 0.5

            [environment]
            par = 900

            [optimizer.minimizer]
            max_evaluations = 50

            [sweep]
            costs = [0.0, 250.0, 500.0]
            "#,
        )
        .unwrap();

        assert_eq!(config.maintenance_fraction, 0.5);
        assert_eq!(config.environment.par, 900.0);
        assert_eq!(config.environment.ci, EnvironmentalState::default().ci);
        assert_eq!(config.optimizer.minimizer.max_evaluations, 50);
        assert_eq!(config.optimizer.minimizer.xatol, 1e-3);
        assert_eq!(config.sweep.costs().unwrap(), vec![0.0, 250.0, 500.0]);
    }

    #[test]
    fn test_round_trip_through_toml() {
        let config = RunConfig::default();
        let text = config.to_toml_string().unwrap();
        assert_eq!(RunConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_invalid_values_are_reported() {
        let err = RunConfig::from_toml_str("maintenance_fraction = 2.0").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid(LeafspanError::InvalidInput(_))
        ));

        let err = RunConfig::from_toml_str("[optimizer]\ninitial_guess = 5000.0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = RunConfig::from_toml_str("maintenance_fraction = \"high\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
