//! Optimal leaf lifespan under carbon costs
//!
//! Wires the Farquhar C3 model from `leafspan-components` into the sweep
//! engine from `leafspan-core`. An [`Experiment`] is one TOML file: the core
//! run configuration plus an optional `[farquhar]` table.

use leafspan_core::accumulator::CarbonAccumulator;
use leafspan_core::config::{ConfigError, RunConfig};
use leafspan_core::errors::LeafspanResult;
use leafspan_core::optimizer::LifespanOptimizer;
use leafspan_core::sweep::{SweepDriver, SweepResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::Arc;

pub use leafspan_components::{FarquharC3, FarquharParameters};
pub use leafspan_core;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct ModelSection {
    farquhar: FarquharParameters,
}

/// A sweep run together with the photosynthesis model it uses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Experiment {
    pub run: RunConfig,
    pub farquhar: FarquharParameters,
}

impl Experiment {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let run = RunConfig::from_toml_str(s)?;
        let model: ModelSection = toml::from_str(s)?;
        Ok(Self {
            run,
            farquhar: model.farquhar,
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        let model = ModelSection {
            farquhar: self.farquhar,
        };
        Ok(format!(
            "{}\n{}",
            self.run.to_toml_string()?,
            toml::to_string_pretty(&model)?
        ))
    }

    pub fn driver(&self) -> LeafspanResult<SweepDriver> {
        let model = Arc::new(FarquharC3::from_parameters(self.farquhar));
        let accumulator =
            CarbonAccumulator::new(model, self.run.daylight, self.run.conversions)?;
        let optimizer = LifespanOptimizer::new(accumulator, self.run.optimizer)?
            .with_maintenance_fraction(self.run.maintenance_fraction);
        SweepDriver::new(optimizer, self.run.environment, self.run.physiology)
    }

    /// Run the configured cost sweep.
    pub fn run(&self, parallel: bool) -> LeafspanResult<SweepResult> {
        let driver = self.driver()?;
        let costs = self.run.sweep.costs()?;
        Ok(if parallel {
            driver.run_parallel(&costs)
        } else {
            driver.run(&costs)
        })
    }
}
