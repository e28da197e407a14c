//! Marginal carbon gain objective
//!
//! Following Kikuzawa (1991), a leaf's carbon return per day of life is
//!
//! $$ g(L) = \frac{G(L) - M(L) - C}{L} $$
//!
//! where $G$ is cumulative gain, $M = f_m \bar{G} L$ the maintenance cost for
//! a maintenance fraction $f_m$ of the daily mean gain $\bar{G} = G/L$, and
//! $C$ the construction cost. The objective is $-g$ so that it can be handed
//! to a minimiser.

use crate::accumulator::CarbonAccumulator;
use crate::errors::{require_non_negative, LeafspanError, LeafspanResult};
use crate::leaf::{EnvironmentalState, PhysiologicalParameters};
use crate::FloatValue;
use serde::{Deserialize, Serialize};

/// Default fraction of daily gain spent on maintenance
pub const DEFAULT_MAINTENANCE_FRACTION: FloatValue = 0.6;

/// Carbon costs of building and keeping a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostParameters {
    /// One-off cost of building the leaf
    /// unit: g C m⁻²
    pub construction_cost: FloatValue,

    /// Fraction of the daily mean gain spent on maintenance
    /// unit: dimensionless
    /// default: 0.6
    pub maintenance_fraction: FloatValue,
}

impl CostParameters {
    pub fn new(construction_cost: FloatValue) -> Self {
        Self {
            construction_cost,
            maintenance_fraction: DEFAULT_MAINTENANCE_FRACTION,
        }
    }

    pub fn with_maintenance_fraction(mut self, maintenance_fraction: FloatValue) -> Self {
        self.maintenance_fraction = maintenance_fraction;
        self
    }

    pub fn validate(&self) -> LeafspanResult<()> {
        require_non_negative("construction_cost", self.construction_cost)?;
        require_non_negative("maintenance_fraction", self.maintenance_fraction)?;
        if self.maintenance_fraction > 1.0 {
            return Err(LeafspanError::InvalidInput(format!(
                "maintenance_fraction cannot exceed 1, got {}",
                self.maintenance_fraction
            )));
        }
        Ok(())
    }
}

/// Breakdown of a leaf's carbon budget at one lifespan.
///
/// unit: g C m⁻² (marginal gain in g C m⁻² day⁻¹)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CarbonBalance {
    pub lifespan_days: FloatValue,
    pub carbon_gain: FloatValue,
    pub maintenance_cost: FloatValue,
    pub construction_cost: FloatValue,
    pub marginal_gain: FloatValue,
}

/// Objective for a single construction cost.
#[derive(Debug, Clone, Copy)]
pub struct LifespanObjective<'a> {
    accumulator: &'a CarbonAccumulator,
    environment: &'a EnvironmentalState,
    physiology: &'a PhysiologicalParameters,
    costs: CostParameters,
}

impl<'a> LifespanObjective<'a> {
    pub fn new(
        accumulator: &'a CarbonAccumulator,
        environment: &'a EnvironmentalState,
        physiology: &'a PhysiologicalParameters,
        costs: CostParameters,
    ) -> LeafspanResult<Self> {
        environment.validate()?;
        physiology.validate()?;
        costs.validate()?;
        Ok(Self {
            accumulator,
            environment,
            physiology,
            costs,
        })
    }

    pub fn costs(&self) -> &CostParameters {
        &self.costs
    }

    /// Full carbon budget at `lifespan_days`.
    pub fn balance(&self, lifespan_days: FloatValue) -> LeafspanResult<CarbonBalance> {
        if lifespan_days.is_nan() || lifespan_days < FloatValue::EPSILON {
            return Err(LeafspanError::NumericalDegeneracy(format!(
                "lifespan of {lifespan_days} days is too small to average over"
            )));
        }

        let carbon_gain =
            self.accumulator
                .accumulate_gain(lifespan_days, self.environment, self.physiology)?;

        let daily_average_gain = carbon_gain / lifespan_days;
        let maintenance_cost =
            daily_average_gain * self.costs.maintenance_fraction * lifespan_days;
        let marginal_gain =
            (carbon_gain - maintenance_cost - self.costs.construction_cost) / lifespan_days;

        Ok(CarbonBalance {
            lifespan_days,
            carbon_gain,
            maintenance_cost,
            construction_cost: self.costs.construction_cost,
            marginal_gain,
        })
    }

    /// Negated marginal gain, for minimisation.
    pub fn evaluate(&self, lifespan_days: FloatValue) -> LeafspanResult<FloatValue> {
        let balance = self.balance(lifespan_days)?;
        let value = -balance.marginal_gain;
        if !value.is_finite() {
            return Err(LeafspanError::NumericalDegeneracy(format!(
                "objective is {value} at {lifespan_days} days"
            )));
        }
        Ok(value)
    }
}
