//! Implements the rod finite element: shape field, element model, and a static driver

mod rod_model;
mod rod_shape;
mod solver_static;
pub use crate::fem::rod_model::*;
pub use crate::fem::rod_shape::*;
pub use crate::fem::solver_static::*;
