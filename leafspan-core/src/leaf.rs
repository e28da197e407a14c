//! Leaf environment and physiology
//!
//! Both structs are held fixed for every evaluation within a lifespan search.
//! Their defaults reproduce the reference run: a sunlit leaf at 25 °C with
//! Ci = 0.7 Ca under ambient CO2 of 400 ppm.

use crate::errors::{require_non_negative, require_positive, LeafspanResult};
use crate::FloatValue;
use serde::{Deserialize, Serialize};

/// Offset between degrees Celsius and Kelvin
pub const DEG_TO_KELVIN: FloatValue = 273.15;

/// Environmental state seen by the leaf.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentalState {
    /// Intercellular CO2 concentration
    /// unit: µmol mol⁻¹
    /// default: 280.0
    pub ci: FloatValue,

    /// Leaf temperature
    /// unit: K
    /// default: 298.15
    pub tleaf: FloatValue,

    /// Photosynthetically active radiation
    /// unit: µmol m⁻² s⁻¹
    /// default: 1800.0
    pub par: FloatValue,
}

impl Default for EnvironmentalState {
    fn default() -> Self {
        Self::from_ambient(400.0, 0.7, 25.0, 1800.0)
    }
}

impl EnvironmentalState {
    pub fn new(ci: FloatValue, tleaf: FloatValue, par: FloatValue) -> Self {
        Self { ci, tleaf, par }
    }

    /// Build the state from ambient CO2, a Ci:Ca ratio and a leaf temperature in °C.
    pub fn from_ambient(
        ca: FloatValue,
        ci_ratio: FloatValue,
        tleaf_celsius: FloatValue,
        par: FloatValue,
    ) -> Self {
        Self {
            ci: ca * ci_ratio,
            tleaf: tleaf_celsius + DEG_TO_KELVIN,
            par,
        }
    }

    pub fn validate(&self) -> LeafspanResult<()> {
        require_non_negative("ci", self.ci)?;
        require_positive("tleaf", self.tleaf)?;
        require_non_negative("par", self.par)
    }
}

/// Leaf physiological capacities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysiologicalParameters {
    /// Dark (day) respiration
    /// unit: µmol m⁻² s⁻¹
    /// default: 0.75
    pub rd: FloatValue,

    /// Maximum Rubisco carboxylation rate
    /// unit: µmol m⁻² s⁻¹
    /// default: 50.0
    pub vcmax: FloatValue,

    /// Maximum electron transport rate
    /// unit: µmol m⁻² s⁻¹
    /// default: 83.5
    pub jmax: FloatValue,
}

impl Default for PhysiologicalParameters {
    fn default() -> Self {
        Self::from_vcmax(50.0, 1.67, 0.015)
    }
}

impl PhysiologicalParameters {
    pub fn new(rd: FloatValue, vcmax: FloatValue, jmax: FloatValue) -> Self {
        Self { rd, vcmax, jmax }
    }

    /// Derive Jmax and Rd from Vcmax using a J:V ratio and a respiration fraction.
    pub fn from_vcmax(vcmax: FloatValue, jv_ratio: FloatValue, rd_fraction: FloatValue) -> Self {
        Self {
            rd: vcmax * rd_fraction,
            vcmax,
            jmax: vcmax * jv_ratio,
        }
    }

    pub fn validate(&self) -> LeafspanResult<()> {
        require_non_negative("rd", self.rd)?;
        require_non_negative("vcmax", self.vcmax)?;
        require_non_negative("jmax", self.jmax)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use is_close::is_close;

    #[test]
    fn test_reference_environment() {
        let env = EnvironmentalState::default();
        assert!(is_close!(env.ci, 280.0));
        assert!(is_close!(env.tleaf, 298.15));
        assert!(is_close!(env.par, 1800.0));
        assert!(env.validate().is_ok());
    }

    #[test]
    fn test_reference_physiology() {
        let phys = PhysiologicalParameters::default();
        assert!(is_close!(phys.vcmax, 50.0));
        assert!(is_close!(phys.jmax, 83.5));
        assert!(is_close!(phys.rd, 0.75));
        assert!(phys.validate().is_ok());
    }

    #[test]
    fn test_malformed_state_is_rejected() {
        assert!(EnvironmentalState::new(280.0, 0.0, 1800.0).validate().is_err());
        assert!(EnvironmentalState::new(FloatValue::NAN, 298.15, 1800.0)
            .validate()
            .is_err());
        assert!(PhysiologicalParameters::new(0.75, -1.0, 83.5)
            .validate()
            .is_err());
        assert!(PhysiologicalParameters::new(FloatValue::INFINITY, 50.0, 83.5)
            .validate()
            .is_err());
    }
}
