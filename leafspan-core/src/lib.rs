//! Core engine for leaf lifespan optimisation
//!
//! A leaf pays a one-off construction cost and an ongoing maintenance cost
//! out of the carbon it fixes. This crate integrates a photosynthesis model
//! over a leaf's life and searches the lifespan that maximises the net
//! carbon return per day (Kikuzawa 1991).
//!
//! # Module Organisation
//!
//! - `leaf`: environmental and physiological state held fixed during a search
//! - `photosynthesis`: the rate model trait and a constant-rate stub
//! - `accumulator`: day-by-day integration of assimilation
//! - `objective`: marginal carbon gain as a function of lifespan
//! - `minimize`: bounded scalar minimisation
//! - `optimizer`: lifespan search around the objective
//! - `sweep`: repeated searches across construction costs
//! - `config`: TOML run configuration

pub mod accumulator;
pub mod config;
pub mod errors;
pub mod leaf;
pub mod minimize;
pub mod objective;
pub mod optimizer;
pub mod photosynthesis;
pub mod sweep;

/// Floating point type used throughout the engine
pub type FloatValue = f64;

/// Days per year used to annualise carbon gain
pub const DAYS_PER_YEAR: FloatValue = 365.0;
