//! Construction cost sweeps
//!
//! Runs the optimiser once per construction cost with the same leaf state and
//! starting guess. Points are independent: a failure at one cost is recorded
//! in place and the remaining points still run.

use crate::errors::{require_finite, LeafspanError, LeafspanResult};
use crate::leaf::{EnvironmentalState, PhysiologicalParameters};
use crate::optimizer::{LifespanOptimizer, LifespanOptimum};
use crate::FloatValue;
use ndarray::Array1;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Evenly spaced construction costs, both ends included.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostGrid {
    /// unit: g C m⁻²
    /// default: 0.0
    pub start: FloatValue,
    /// unit: g C m⁻²
    /// default: 6000.0
    pub stop: FloatValue,
    /// default: 30
    pub points: usize,
}

impl Default for CostGrid {
    fn default() -> Self {
        Self {
            start: 0.0,
            stop: 6000.0,
            points: 30,
        }
    }
}

impl CostGrid {
    pub fn values(&self) -> LeafspanResult<Vec<FloatValue>> {
        require_finite("start", self.start)?;
        require_finite("stop", self.stop)?;
        if self.points == 0 {
            return Err(LeafspanError::InvalidInput(
                "cost grid needs at least one point".to_string(),
            ));
        }
        Ok(Array1::linspace(self.start, self.stop, self.points).to_vec())
    }
}

/// Outcome of one sweep point.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepPoint {
    pub construction_cost: FloatValue,
    pub outcome: LeafspanResult<LifespanOptimum>,
}

impl SweepPoint {
    /// Optimal lifespan, or NaN if the point failed.
    pub fn optimal_days(&self) -> FloatValue {
        self.outcome
            .as_ref()
            .map_or(FloatValue::NAN, |optimum| optimum.optimal_days)
    }

    /// Annualised carbon gain, or NaN if the point failed.
    pub fn annual_carbon_gain(&self) -> FloatValue {
        self.outcome
            .as_ref()
            .map_or(FloatValue::NAN, |optimum| optimum.annual_carbon_gain)
    }

    pub fn record(&self) -> SweepRecord {
        match &self.outcome {
            Ok(optimum) => SweepRecord {
                construction_cost: self.construction_cost,
                lifespan_days: Some(optimum.optimal_days),
                annual_carbon_gain: Some(optimum.annual_carbon_gain),
                status: optimum.location.as_str().to_string(),
            },
            Err(e) => SweepRecord {
                construction_cost: self.construction_cost,
                lifespan_days: None,
                annual_carbon_gain: None,
                status: e.to_string(),
            },
        }
    }
}

/// Flat row for tabular or JSON output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepRecord {
    pub construction_cost: FloatValue,
    pub lifespan_days: Option<FloatValue>,
    pub annual_carbon_gain: Option<FloatValue>,
    pub status: String,
}

/// Sweep points in the order the costs were given.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SweepResult {
    pub points: Vec<SweepPoint>,
}

impl SweepResult {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SweepPoint> {
        self.points.iter()
    }

    pub fn lifespans(&self) -> Vec<FloatValue> {
        self.points.iter().map(SweepPoint::optimal_days).collect()
    }

    pub fn annual_carbon_gains(&self) -> Vec<FloatValue> {
        self.points
            .iter()
            .map(SweepPoint::annual_carbon_gain)
            .collect()
    }

    pub fn failures(&self) -> usize {
        self.points.iter().filter(|p| p.outcome.is_err()).count()
    }

    pub fn records(&self) -> Vec<SweepRecord> {
        self.points.iter().map(SweepPoint::record).collect()
    }
}

/// Optimises lifespan across a sequence of construction costs.
#[derive(Debug, Clone)]
pub struct SweepDriver {
    optimizer: LifespanOptimizer,
    environment: EnvironmentalState,
    physiology: PhysiologicalParameters,
}

impl SweepDriver {
    pub fn new(
        optimizer: LifespanOptimizer,
        environment: EnvironmentalState,
        physiology: PhysiologicalParameters,
    ) -> LeafspanResult<Self> {
        environment.validate()?;
        physiology.validate()?;
        Ok(Self {
            optimizer,
            environment,
            physiology,
        })
    }

    pub fn optimizer(&self) -> &LifespanOptimizer {
        &self.optimizer
    }

    fn solve_point(&self, construction_cost: FloatValue) -> SweepPoint {
        let outcome = self
            .optimizer
            .optimize(&self.environment, &self.physiology, construction_cost);
        if let Err(e) = &outcome {
            warn!(construction_cost, error = %e, "sweep point failed");
        }
        SweepPoint {
            construction_cost,
            outcome,
        }
    }

    fn finish(points: Vec<SweepPoint>) -> SweepResult {
        let result = SweepResult { points };
        info!(
            points = result.len(),
            failures = result.failures(),
            "construction cost sweep finished"
        );
        result
    }

    /// Run each cost in turn.
    pub fn run(&self, costs: &[FloatValue]) -> SweepResult {
        Self::finish(costs.iter().map(|&c| self.solve_point(c)).collect())
    }

    /// Run costs across the rayon thread pool. Output order matches `costs`.
    pub fn run_parallel(&self, costs: &[FloatValue]) -> SweepResult {
        Self::finish(costs.par_iter().map(|&c| self.solve_point(c)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accumulator::CarbonAccumulator;
    use crate::minimize::MinimizerSettings;
    use crate::optimizer::{OptimizerSettings, MAX_LIFESPAN_DAYS};
    use crate::photosynthesis::ConstantRate;
    use std::sync::Arc;

    fn driver(settings: OptimizerSettings) -> SweepDriver {
        let optimizer = LifespanOptimizer::new(
            CarbonAccumulator::with_defaults(Arc::new(ConstantRate::new(10.0))),
            settings,
        )
        .unwrap();
        SweepDriver::new(
            optimizer,
            EnvironmentalState::default(),
            PhysiologicalParameters::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_default_grid() {
        let costs = CostGrid::default().values().unwrap();
        assert_eq!(costs.len(), 30);
        assert_eq!(costs[0], 0.0);
        assert!((costs[29] - 6000.0).abs() < 1e-9);
        assert!((costs[1] - 6000.0 / 29.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_grid_is_invalid() {
        let grid = CostGrid {
            points: 0,
            ..CostGrid::default()
        };
        assert!(matches!(grid.values(), Err(LeafspanError::InvalidInput(_))));
    }

    #[test]
    fn test_failed_point_does_not_abort_sweep() {
        let driver = driver(OptimizerSettings::default());
        let result = driver.run(&[0.0, FloatValue::NAN, -5.0, 100.0]);

        assert_eq!(result.len(), 4);
        assert_eq!(result.failures(), 2);
        assert!(result.points[0].outcome.is_ok());
        assert!(matches!(
            result.points[1].outcome,
            Err(LeafspanError::InvalidInput(_))
        ));
        assert!(result.points[2].outcome.is_err());
        assert_eq!(result.points[3].optimal_days(), MAX_LIFESPAN_DAYS);

        let lifespans = result.lifespans();
        assert!(lifespans[1].is_nan());
        assert!(lifespans[2].is_nan());

        let record = result.points[1].record();
        assert_eq!(record.lifespan_days, None);
        assert!(record.status.starts_with("Invalid input"));
    }

    #[test]
    fn test_non_convergence_recorded_per_point() {
        let driver = driver(OptimizerSettings {
            minimizer: MinimizerSettings {
                xatol: 1e-3,
                max_evaluations: 2,
            },
            ..OptimizerSettings::default()
        });
        let result = driver.run(&[0.0, 10.0]);
        assert_eq!(result.failures(), 2);
        assert!(result
            .iter()
            .all(|p| p.outcome.as_ref().unwrap_err().is_non_convergence()));
    }

    #[test]
    fn test_parallel_matches_serial() {
        let driver = driver(OptimizerSettings::default());
        let costs = CostGrid {
            start: 0.0,
            stop: 500.0,
            points: 6,
        }
        .values()
        .unwrap();

        let serial = driver.run(&costs);
        let parallel = driver.run_parallel(&costs);
        assert_eq!(serial, parallel);
        for (point, cost) in parallel.iter().zip(&costs) {
            assert_eq!(point.construction_cost, *cost);
        }
    }

    #[test]
    fn test_records_serialise_missing_values_as_null() {
        let driver = driver(OptimizerSettings::default());
        let result = driver.run(&[FloatValue::NAN]);
        let json = serde_json::to_value(result.records()).unwrap();
        assert!(json[0]["lifespan_days"].is_null());
        assert!(json[0]["construction_cost"].is_null());
    }
}
