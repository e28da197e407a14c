//! Carbon gain accumulator
//!
//! Integrates net assimilation over a leaf's life. Every day has the same
//! daylight period split into equal intervals, and every interval sees the
//! same environment, so the model is re-evaluated under identical conditions
//! throughout.

use crate::errors::{require_positive, LeafspanError, LeafspanResult};
use crate::leaf::{EnvironmentalState, PhysiologicalParameters};
use crate::photosynthesis::PhotosynthesisModel;
use crate::{FloatValue, DAYS_PER_YEAR};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const SECONDS_PER_HOUR: FloatValue = 3600.0;

/// Longest lifespan considered: three years
pub const MAX_LIFESPAN_DAYS: FloatValue = 3.0 * DAYS_PER_YEAR;

/// Unit conversion factors applied to each interval's assimilation rate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnitConversions {
    /// Micromoles to moles
    /// unit: mol µmol⁻¹
    /// default: 1e-6
    pub umol_to_mol: FloatValue,
    /// Molar mass of carbon
    /// unit: g mol⁻¹
    /// default: 12.0
    pub mol_c_to_grams_c: FloatValue,
}

impl Default for UnitConversions {
    fn default() -> Self {
        Self {
            umol_to_mol: 1e-6,
            mol_c_to_grams_c: 12.0,
        }
    }
}

/// Split of each day's light period into integration intervals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaylightSchedule {
    /// unit: hours
    /// default: 12.0
    pub daylight_hours: FloatValue,
    /// default: 24 (half-hourly)
    pub intervals_per_day: usize,
}

impl Default for DaylightSchedule {
    fn default() -> Self {
        Self {
            daylight_hours: 12.0,
            intervals_per_day: 24,
        }
    }
}

impl DaylightSchedule {
    /// Length of one integration interval in seconds.
    pub fn seconds_per_interval(&self) -> FloatValue {
        self.daylight_hours * SECONDS_PER_HOUR / self.intervals_per_day as FloatValue
    }

    pub fn validate(&self) -> LeafspanResult<()> {
        require_positive("daylight_hours", self.daylight_hours)?;
        if self.daylight_hours > 24.0 {
            return Err(LeafspanError::InvalidInput(format!(
                "daylight_hours cannot exceed 24, got {}",
                self.daylight_hours
            )));
        }
        if self.intervals_per_day == 0 {
            return Err(LeafspanError::InvalidInput(
                "intervals_per_day must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Sums carbon fixed by a leaf over whole days of its life.
#[derive(Debug, Clone)]
pub struct CarbonAccumulator {
    model: Arc<dyn PhotosynthesisModel>,
    schedule: DaylightSchedule,
    conversions: UnitConversions,
}

impl CarbonAccumulator {
    pub fn new(
        model: Arc<dyn PhotosynthesisModel>,
        schedule: DaylightSchedule,
        conversions: UnitConversions,
    ) -> LeafspanResult<Self> {
        schedule.validate()?;
        require_positive("umol_to_mol", conversions.umol_to_mol)?;
        require_positive("mol_c_to_grams_c", conversions.mol_c_to_grams_c)?;
        Ok(Self {
            model,
            schedule,
            conversions,
        })
    }

    /// Half-hourly integration over a 12 hour day.
    pub fn with_defaults(model: Arc<dyn PhotosynthesisModel>) -> Self {
        Self {
            model,
            schedule: DaylightSchedule::default(),
            conversions: UnitConversions::default(),
        }
    }

    pub fn schedule(&self) -> &DaylightSchedule {
        &self.schedule
    }

    pub fn conversions(&self) -> &UnitConversions {
        &self.conversions
    }

    /// Total carbon gain over a lifespan.
    ///
    /// Days `1..floor(lifespan_days)` are integrated, so the final partial
    /// day never contributes and any lifespan below two days gains nothing.
    ///
    /// # Arguments
    ///
    /// * `lifespan_days` - Leaf lifespan (days), positive and at most
    ///   [`MAX_LIFESPAN_DAYS`]
    /// * `environment` - Leaf environment, identical for every interval
    /// * `physiology` - Leaf capacities, identical for every interval
    ///
    /// # Returns
    ///
    /// Carbon gain in g C m⁻²
    pub fn accumulate_gain(
        &self,
        lifespan_days: FloatValue,
        environment: &EnvironmentalState,
        physiology: &PhysiologicalParameters,
    ) -> LeafspanResult<FloatValue> {
        require_positive("lifespan_days", lifespan_days)?;
        if lifespan_days > MAX_LIFESPAN_DAYS {
            return Err(LeafspanError::InvalidInput(format!(
                "lifespan_days cannot exceed {MAX_LIFESPAN_DAYS}, got {lifespan_days}"
            )));
        }

        let whole_days = lifespan_days.floor() as u64;
        let seconds = self.schedule.seconds_per_interval();

        let mut carbon_gain = 0.0;
        for _day in 1..whole_days {
            let mut day_gain = 0.0;
            for _interval in 0..self.schedule.intervals_per_day {
                let rates = self.model.assimilation(environment, physiology)?;
                day_gain += rates.net
                    * self.conversions.umol_to_mol
                    * self.conversions.mol_c_to_grams_c
                    * seconds;
            }
            carbon_gain += day_gain;
        }

        Ok(carbon_gain)
    }
}
