//! Implements the base structures: errors, parameters, and the rotation algebra

mod assembly;
mod dofs;
mod error;
mod parameters;
pub mod rotation;
mod sample_meshes;
mod sample_params;
mod table;
pub use crate::base::assembly::*;
pub use crate::base::dofs::*;
pub use crate::base::error::*;
pub use crate::base::parameters::*;
pub use crate::base::sample_meshes::*;
pub use crate::base::sample_params::*;
pub use crate::base::table::*;
