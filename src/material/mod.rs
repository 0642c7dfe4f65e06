//! Implements the cross-section materials of rods

/// Defines the number of strain (and stress) components: γ (3) and κ (3)
pub const N_STRAIN: usize = 6;

mod cross_section;
mod linear_elastic;
mod material;
mod plastic;
mod state;
mod yield_function;
pub use crate::material::cross_section::*;
pub use crate::material::linear_elastic::*;
pub use crate::material::material::*;
pub use crate::material::plastic::*;
pub use crate::material::state::*;
pub use crate::material::yield_function::*;
