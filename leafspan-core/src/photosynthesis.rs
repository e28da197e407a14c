//! Photosynthesis rate models
//!
//! The accumulator only needs a net assimilation rate for a given leaf state.
//! Concrete biochemical models live in `leafspan-components`; this module
//! defines the seam and a constant-rate model for testing.

use crate::errors::LeafspanResult;
use crate::leaf::{EnvironmentalState, PhysiologicalParameters};
use crate::FloatValue;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Assimilation rates returned by a photosynthesis model.
///
/// unit: µmol m⁻² s⁻¹
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AssimilationRates {
    /// Net assimilation after dark respiration
    pub net: FloatValue,
    /// Gross rate limited by Rubisco carboxylation
    pub rubisco_limited: FloatValue,
    /// Gross rate limited by RuBP regeneration (electron transport)
    pub light_limited: FloatValue,
}

/// A leaf-level photosynthesis model.
///
/// Implementations must be deterministic and free of side effects: the
/// accumulator calls `assimilation` once per daylight interval with identical
/// arguments and relies on getting the same answer every time.
pub trait PhotosynthesisModel: Debug + Send + Sync {
    fn assimilation(
        &self,
        environment: &EnvironmentalState,
        physiology: &PhysiologicalParameters,
    ) -> LeafspanResult<AssimilationRates>;
}

/// Returns the same net rate regardless of leaf state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConstantRate {
    /// unit: µmol m⁻² s⁻¹
    pub net: FloatValue,
}

impl ConstantRate {
    pub fn new(net: FloatValue) -> Self {
        Self { net }
    }
}

impl PhotosynthesisModel for ConstantRate {
    fn assimilation(
        &self,
        _environment: &EnvironmentalState,
        _physiology: &PhysiologicalParameters,
    ) -> LeafspanResult<AssimilationRates> {
        Ok(AssimilationRates {
            net: self.net,
            rubisco_limited: self.net,
            light_limited: self.net,
        })
    }
}
