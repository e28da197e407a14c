//! Farquhar C3 photosynthesis model
//!
//! Leaf-level net assimilation from the Farquhar, von Caemmerer & Berry (1980)
//! biochemical model, with the limiting rates combined by a non-rectangular
//! hyperbola so the transition between them is smooth.
//!
//! # Inputs
//!
//! - Ci (µmol mol⁻¹), leaf temperature (K), PAR (µmol m⁻² s⁻¹)
//! - Vcmax, Jmax and Rd (µmol m⁻² s⁻¹) already at leaf temperature
//!
//! # Differences from a full leaf model
//!
//! - **No temperature scaling of capacities**: Vcmax, Jmax and Rd are used as
//!   given. Only the Rubisco kinetic constants and Γ* follow leaf temperature.
//! - **No stomatal coupling**: Ci is prescribed, there is no gs model.
//!
//! # References
//!
//! Farquhar, G. D., von Caemmerer, S., & Berry, J. A. (1980). A biochemical
//! model of photosynthetic CO2 assimilation in leaves of C3 species. Planta,
//! 149, 78-90.
//!
//! Bernacchi, C. J. et al. (2001). Improved temperature response functions
//! for models of Rubisco-limited photosynthesis. Plant, Cell & Environment,
//! 24, 253-259.

use leafspan_core::errors::{LeafspanError, LeafspanResult};
use leafspan_core::leaf::{EnvironmentalState, PhysiologicalParameters};
use leafspan_core::photosynthesis::{AssimilationRates, PhotosynthesisModel};
use leafspan_core::FloatValue;
use serde::{Deserialize, Serialize};

/// Universal gas constant
/// unit: J mol⁻¹ K⁻¹
pub const RGAS: FloatValue = 8.314;

/// Reference temperature for the kinetic constants
/// unit: K
pub const TREF: FloatValue = 298.15;

/// Parameters for the Farquhar C3 model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FarquharParameters {
    /// Intercellular O2 concentration
    /// unit: mmol mol⁻¹
    /// default: 210.0
    pub oi: FloatValue,

    /// CO2 compensation point in the absence of day respiration at 25 °C
    /// unit: µmol mol⁻¹
    /// default: 42.75 (Bernacchi et al. 2001)
    pub gamstar25: FloatValue,

    /// Michaelis-Menten constant for carboxylation at 25 °C
    /// unit: µmol mol⁻¹
    /// default: 404.9
    pub kc25: FloatValue,

    /// Michaelis-Menten constant for oxygenation at 25 °C
    /// unit: mmol mol⁻¹
    /// default: 278.4
    pub ko25: FloatValue,

    /// Activation energy of Kc
    /// unit: J mol⁻¹
    /// default: 79430.0
    pub ec: FloatValue,

    /// Activation energy of Ko
    /// unit: J mol⁻¹
    /// default: 36380.0
    pub eo: FloatValue,

    /// Activation energy of Γ*
    /// unit: J mol⁻¹
    /// default: 37830.0
    pub eag: FloatValue,

    /// Curvature of the Rubisco/RuBP co-limitation hyperbola
    /// unit: dimensionless
    /// default: 0.9999
    pub theta_hyperbol: FloatValue,

    /// Curvature of the light response of electron transport
    /// unit: dimensionless
    /// default: 0.7
    pub theta_j: FloatValue,

    /// Quantum yield of electron transport
    /// unit: mol mol⁻¹
    /// default: 0.3
    pub quantum_yield: FloatValue,

    /// Fraction of incident PAR absorbed by the leaf
    /// unit: dimensionless
    /// default: 0.8
    pub absorptance: FloatValue,
}

impl Default for FarquharParameters {
    fn default() -> Self {
        Self {
            oi: 210.0,
            gamstar25: 42.75,
            kc25: 404.9,
            ko25: 278.4,
            ec: 79430.0,
            eo: 36380.0,
            eag: 37830.0,
            theta_hyperbol: 0.9999,
            theta_j: 0.7,
            quantum_yield: 0.3,
            absorptance: 0.8,
        }
    }
}

impl FarquharParameters {
    /// Initial slope of the electron transport light response.
    pub fn alpha(&self) -> FloatValue {
        self.quantum_yield * self.absorptance
    }
}

/// Farquhar C3 leaf photosynthesis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FarquharC3 {
    parameters: FarquharParameters,
}

/// Which root of a quadratic to take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Root {
    Smaller,
    Larger,
}

impl FarquharC3 {
    pub fn new() -> Self {
        Self::from_parameters(FarquharParameters::default())
    }

    pub fn from_parameters(parameters: FarquharParameters) -> Self {
        Self { parameters }
    }

    pub fn parameters(&self) -> &FarquharParameters {
        &self.parameters
    }

    /// Arrhenius temperature response relative to 25 °C.
    ///
    /// $$k(T) = k_{25} \exp\left(\frac{E_a (T - 298.15)}{298.15 R T}\right)$$
    pub fn arrhenius(k25: FloatValue, ea: FloatValue, tleaf: FloatValue) -> FloatValue {
        k25 * ((ea * (tleaf - TREF)) / (TREF * RGAS * tleaf)).exp()
    }

    /// Effective Michaelis-Menten constant for CO2 in the presence of O2.
    ///
    /// $$K_m = K_c (1 + O_i / K_o)$$
    pub fn michaelis_menten(&self, tleaf: FloatValue) -> FloatValue {
        let p = &self.parameters;
        let kc = Self::arrhenius(p.kc25, p.ec, tleaf);
        let ko = Self::arrhenius(p.ko25, p.eo, tleaf);
        kc * (1.0 + p.oi / ko)
    }

    /// CO2 compensation point in the absence of day respiration.
    pub fn gamma_star(&self, tleaf: FloatValue) -> FloatValue {
        Self::arrhenius(self.parameters.gamstar25, self.parameters.eag, tleaf)
    }

    /// Potential electron transport rate at a given PAR.
    ///
    /// Smaller root of $\theta_J J^2 - (\alpha I + J_{max}) J + \alpha I J_{max} = 0$.
    pub fn electron_transport(
        &self,
        par: FloatValue,
        jmax: FloatValue,
    ) -> LeafspanResult<FloatValue> {
        let light = self.parameters.alpha() * par;
        quadratic(
            self.parameters.theta_j,
            -(light + jmax),
            light * jmax,
            Root::Smaller,
        )
    }
}

impl PhotosynthesisModel for FarquharC3 {
    fn assimilation(
        &self,
        environment: &EnvironmentalState,
        physiology: &PhysiologicalParameters,
    ) -> LeafspanResult<AssimilationRates> {
        let ci = environment.ci;
        let km = self.michaelis_menten(environment.tleaf);
        let gamma_star = self.gamma_star(environment.tleaf);

        let j = self.electron_transport(environment.par, physiology.jmax)?;
        // Four electrons per carboxylation
        let vj = j / 4.0;

        let rubisco_limited = physiology.vcmax * (ci - gamma_star) / (ci + km);
        let light_limited = vj * (ci - gamma_star) / (ci + 2.0 * gamma_star);

        // Co-limited gross rate is the negated larger root
        let gross = -quadratic(
            self.parameters.theta_hyperbol,
            rubisco_limited + light_limited,
            rubisco_limited * light_limited,
            Root::Larger,
        )?;

        Ok(AssimilationRates {
            net: gross - physiology.rd,
            rubisco_limited,
            light_limited,
        })
    }
}

/// Real root of $a x^2 + b x + c = 0$.
///
/// Falls back to the linear solution when `a` is zero.
fn quadratic(
    a: FloatValue,
    b: FloatValue,
    c: FloatValue,
    root: Root,
) -> LeafspanResult<FloatValue> {
    if a.abs() < FloatValue::EPSILON {
        if b.abs() < FloatValue::EPSILON {
            return if c.abs() < FloatValue::EPSILON {
                Ok(0.0)
            } else {
                Err(LeafspanError::Photosynthesis(format!(
                    "degenerate quadratic with constant term {c}"
                )))
            };
        }
        return Ok(-c / b);
    }

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return Err(LeafspanError::Photosynthesis(format!(
            "imaginary root found (a={a}, b={b}, c={c})"
        )));
    }

    let sqrt_d = discriminant.sqrt();
    Ok(match root {
        Root::Larger => (-b + sqrt_d) / (2.0 * a),
        Root::Smaller => (-b - sqrt_d) / (2.0 * a),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use is_close::is_close;

    fn reference_rates(model: &FarquharC3) -> AssimilationRates {
        model
            .assimilation(
                &EnvironmentalState::default(),
                &PhysiologicalParameters::default(),
            )
            .unwrap()
    }

    #[test]
    fn test_arrhenius_is_identity_at_25c() {
        assert!(is_close!(FarquharC3::arrhenius(404.9, 79430.0, TREF), 404.9));
        assert!(FarquharC3::arrhenius(404.9, 79430.0, TREF + 10.0) > 404.9);
    }

    #[test]
    fn test_reference_leaf() {
        let rates = reference_rates(&FarquharC3::new());

        assert_relative_eq!(rates.rubisco_limited, 11.978448, max_relative = 1e-6);
        assert_relative_eq!(rates.light_limited, 12.706333, max_relative = 1e-6);
        assert_relative_eq!(rates.net, 11.209302, max_relative = 1e-6);
    }

    #[test]
    fn test_co_limitation_below_both_limits() {
        let rates = reference_rates(&FarquharC3::new());
        let gross = rates.net + PhysiologicalParameters::default().rd;
        assert!(gross <= rates.rubisco_limited.min(rates.light_limited));
    }

    #[test]
    fn test_dark_leaf_respires() {
        let model = FarquharC3::new();
        let physiology = PhysiologicalParameters::default();
        let rates = model
            .assimilation(&EnvironmentalState::new(280.0, 298.15, 0.0), &physiology)
            .unwrap();
        assert_relative_eq!(rates.light_limited, 0.0, epsilon = 1e-12);
        assert_relative_eq!(rates.net, -physiology.rd, epsilon = 1e-9);
    }

    #[test]
    fn test_more_light_more_carbon() {
        let model = FarquharC3::new();
        let physiology = PhysiologicalParameters::default();
        let mut previous = FloatValue::NEG_INFINITY;
        for par in [0.0, 100.0, 400.0, 800.0, 1800.0] {
            let rates = model
                .assimilation(&EnvironmentalState::new(280.0, 298.15, par), &physiology)
                .unwrap();
            assert!(rates.net > previous, "net fell at PAR {par}");
            previous = rates.net;
        }
    }

    #[test]
    fn test_quadratic_roots() {
        // x^2 - 3x + 2 = (x - 1)(x - 2)
        assert!(is_close!(quadratic(1.0, -3.0, 2.0, Root::Smaller).unwrap(), 1.0));
        assert!(is_close!(quadratic(1.0, -3.0, 2.0, Root::Larger).unwrap(), 2.0));
        assert!(is_close!(quadratic(0.0, 2.0, -4.0, Root::Larger).unwrap(), 2.0));
        assert!(matches!(
            quadratic(1.0, 0.0, 1.0, Root::Larger),
            Err(LeafspanError::Photosynthesis(_))
        ));
    }
}
