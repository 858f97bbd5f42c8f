//! Probability building blocks for rootformula.
//!
//! This crate hosts the special-function math the formula engine dispatches
//! to at evaluation time:
//! - the Landau density (location/scale wrapper included)
//! - small combinatorial helpers (binomial coefficient)

pub mod landau;
pub mod math;

pub use landau::{landau, landau_pdf};
pub use math::binomial;
