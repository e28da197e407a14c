//! Photosynthesis models for leafspan
//!
//! Concrete implementations of [`leafspan_core::photosynthesis::PhotosynthesisModel`].

pub mod farquhar;

pub use farquhar::{FarquharC3, FarquharParameters};
