//! Lifespan optimisation
//!
//! Finds the lifespan that maximises marginal carbon gain for one
//! construction cost. The interior search is [`minimize_bounded`]; because
//! that never probes the bounds, the objective is also evaluated at both
//! bounds afterwards and a bound wins if it is strictly better. Optima on a
//! bound are reported as such rather than as a point a tolerance away.

pub use crate::accumulator::MAX_LIFESPAN_DAYS;

use crate::accumulator::CarbonAccumulator;
use crate::errors::{require_positive, LeafspanError, LeafspanResult};
use crate::leaf::{EnvironmentalState, PhysiologicalParameters};
use crate::minimize::{minimize_bounded, MinimizerSettings};
use crate::objective::{CostParameters, LifespanObjective, DEFAULT_MAINTENANCE_FRACTION};
use crate::{FloatValue, DAYS_PER_YEAR};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Shortest lifespan considered
pub const MIN_LIFESPAN_DAYS: FloatValue = 1.0;

/// Search settings for [`LifespanOptimizer`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerSettings {
    /// Starting lifespan for the search
    /// unit: days
    /// default: 50.0
    pub initial_guess: FloatValue,
    /// unit: days
    /// default: 1.0
    pub lower: FloatValue,
    /// unit: days
    /// default: 1095.0
    pub upper: FloatValue,
    pub minimizer: MinimizerSettings,
}

impl Default for OptimizerSettings {
    fn default() -> Self {
        Self {
            initial_guess: 50.0,
            lower: MIN_LIFESPAN_DAYS,
            upper: MAX_LIFESPAN_DAYS,
            minimizer: MinimizerSettings::default(),
        }
    }
}

impl OptimizerSettings {
    pub fn validate(&self) -> LeafspanResult<()> {
        require_positive("lower", self.lower)?;
        require_positive("upper", self.upper)?;
        if self.lower < MIN_LIFESPAN_DAYS || self.upper > MAX_LIFESPAN_DAYS {
            return Err(LeafspanError::InvalidInput(format!(
                "bounds ({}, {}) must lie within ({MIN_LIFESPAN_DAYS}, {MAX_LIFESPAN_DAYS}) days",
                self.lower, self.upper
            )));
        }
        if self.lower >= self.upper {
            return Err(LeafspanError::InvalidInput(format!(
                "lower bound {} must be below upper bound {}",
                self.lower, self.upper
            )));
        }
        if !(self.lower..=self.upper).contains(&self.initial_guess) {
            return Err(LeafspanError::InvalidInput(format!(
                "initial guess {} lies outside bounds ({}, {})",
                self.initial_guess, self.lower, self.upper
            )));
        }
        self.minimizer.validate()
    }
}

/// Where the optimum sits within the search bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OptimumLocation {
    Interior,
    LowerBound,
    UpperBound,
}

impl OptimumLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptimumLocation::Interior => "interior",
            OptimumLocation::LowerBound => "lower-bound",
            OptimumLocation::UpperBound => "upper-bound",
        }
    }

    pub fn is_pinned(&self) -> bool {
        !matches!(self, OptimumLocation::Interior)
    }
}

/// Optimal lifespan for one construction cost.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LifespanOptimum {
    /// unit: g C m⁻²
    pub construction_cost: FloatValue,
    /// unit: days
    pub optimal_days: FloatValue,
    /// Carbon gain over the optimal lifespan
    /// unit: g C m⁻²
    pub carbon_gain: FloatValue,
    /// `carbon_gain` divided by 365
    /// unit: g C m⁻² yr⁻¹
    pub annual_carbon_gain: FloatValue,
    /// unit: g C m⁻² day⁻¹
    pub marginal_gain: FloatValue,
    pub location: OptimumLocation,
    /// Objective evaluations used by the interior search
    pub evaluations: usize,
}

/// Searches the lifespan maximising marginal carbon gain.
#[derive(Debug, Clone)]
pub struct LifespanOptimizer {
    accumulator: CarbonAccumulator,
    settings: OptimizerSettings,
    maintenance_fraction: FloatValue,
}

impl LifespanOptimizer {
    pub fn new(accumulator: CarbonAccumulator, settings: OptimizerSettings) -> LeafspanResult<Self> {
        settings.validate()?;
        Ok(Self {
            accumulator,
            settings,
            maintenance_fraction: DEFAULT_MAINTENANCE_FRACTION,
        })
    }

    pub fn with_maintenance_fraction(mut self, maintenance_fraction: FloatValue) -> Self {
        self.maintenance_fraction = maintenance_fraction;
        self
    }

    pub fn accumulator(&self) -> &CarbonAccumulator {
        &self.accumulator
    }

    pub fn settings(&self) -> &OptimizerSettings {
        &self.settings
    }

    pub fn maintenance_fraction(&self) -> FloatValue {
        self.maintenance_fraction
    }

    /// Optimal lifespan for a construction cost.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for malformed leaf state or costs
    /// - `NonConvergence` if the interior search runs out of evaluations
    /// - any accumulator or photosynthesis model error
    pub fn optimize(
        &self,
        environment: &EnvironmentalState,
        physiology: &PhysiologicalParameters,
        construction_cost: FloatValue,
    ) -> LeafspanResult<LifespanOptimum> {
        let costs = CostParameters::new(construction_cost)
            .with_maintenance_fraction(self.maintenance_fraction);
        let objective = LifespanObjective::new(&self.accumulator, environment, physiology, costs)?;

        let settings = &self.settings;
        let interior = minimize_bounded(
            |days| objective.evaluate(days),
            (settings.lower, settings.upper),
            settings.initial_guess,
            &settings.minimizer,
        )?;

        let mut optimal_days = interior.x;
        let mut optimal_value = interior.fx;
        let mut location = OptimumLocation::Interior;
        for (bound, bound_location) in [
            (settings.lower, OptimumLocation::LowerBound),
            (settings.upper, OptimumLocation::UpperBound),
        ] {
            let value = objective.evaluate(bound)?;
            if value < optimal_value {
                optimal_days = bound;
                optimal_value = value;
                location = bound_location;
            }
        }

        let balance = objective.balance(optimal_days)?;

        debug!(
            construction_cost,
            optimal_days,
            evaluations = interior.evaluations,
            location = location.as_str(),
            "optimised leaf lifespan"
        );

        Ok(LifespanOptimum {
            construction_cost,
            optimal_days,
            carbon_gain: balance.carbon_gain,
            annual_carbon_gain: balance.carbon_gain / DAYS_PER_YEAR,
            marginal_gain: balance.marginal_gain,
            location,
            evaluations: interior.evaluations,
        })
    }
}
