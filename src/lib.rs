//! Rodsim is a geometrically exact (Cosserat) rod core
//!
//! The crate implements the constitutive and kinematic engine of a
//! Simo-Reissner rod finite element:
//!
//! * SO(3) rotation algebra (skew/unskew, exponential and logarithm maps)
//! * the rod shape field with Crisfield-Jelenic rotation interpolation
//! * linear elastic and elasto-plastic cross-section materials
//! * the rod element model computing residual, tangent, mass and energies
//!
//! Global sparse assembly, solvers and time integration belong to the caller.
//! The [fem::RodModel] exposes dense element contributions and dense global
//! assembly helpers that are sufficient for small problems and testing.
//!
//! # References
//!
//! * Simo JC (1985) A finite strain beam formulation. The three-dimensional dynamic problem.
//!   Part I. Computer Methods in Applied Mechanics and Engineering, 49(1):55-70
//! * Crisfield MA, Jelenic G (1999) Objectivity of strain measures in the geometrically exact
//!   three-dimensional beam theory and its finite-element implementation,
//!   Proc. R. Soc. Lond. A, 455:1125-1147

/// Defines a type alias for the error type as a static string
pub type StrError = &'static str;

pub mod base;
pub mod fem;
pub mod material;

pub use crate::base::{Error, RodResult};
