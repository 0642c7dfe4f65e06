use super::{Error, RodResult};

/// Holds the names of the degrees of freedom (DOFs) of a rod point
///
/// A rod point has three translational and three rotational DOFs. The names
/// are used to label the arguments of the yield function and the columns of
/// the output tables.
#[derive(Clone, Debug)]
pub struct DofCatalog {
    /// Names of the translational DOFs
    pub trans: Vec<String>,

    /// Names of the rotational DOFs
    pub rot: Vec<String>,
}

impl DofCatalog {
    /// Allocates a new instance
    pub fn new(trans: &[String], rot: &[String]) -> RodResult<Self> {
        if trans.len() != 3 || rot.len() != 3 {
            return Err(Error::config(
                "DOF catalog",
                format!(
                    "rods require 3 translational and 3 rotational DOFs; got {} and {}",
                    trans.len(),
                    rot.len()
                ),
            ));
        }
        let mut all = trans.to_vec();
        all.extend_from_slice(rot);
        for i in 0..all.len() {
            if all[i].is_empty() || all[(i + 1)..].contains(&all[i]) {
                return Err(Error::config("DOF catalog", format!("invalid or repeated DOF name '{}'", all[i])));
            }
        }
        Ok(DofCatalog {
            trans: trans.to_vec(),
            rot: rot.to_vec(),
        })
    }

    /// Returns the number of DOFs per point (translational + rotational)
    pub fn ndof(&self) -> usize {
        self.trans.len() + self.rot.len()
    }

    /// Returns all DOF names (translational first)
    pub fn names(&self) -> Vec<String> {
        let mut all = self.trans.clone();
        all.extend_from_slice(&self.rot);
        all
    }

    /// Returns the argument names of the yield function
    ///
    /// The stress arguments are the DOF names. They are followed by `h_iso` if
    /// isotropic hardening is active, and by `h_<dof>` for each DOF if
    /// kinematic hardening is active.
    pub fn yield_arg_names(&self, isotropic: bool, kinematic: bool) -> Vec<String> {
        let mut args = self.names();
        if isotropic {
            args.push("h_iso".to_string());
        }
        if kinematic {
            for name in self.names() {
                args.push(format!("h_{}", name));
            }
        }
        args
    }
}

impl Default for DofCatalog {
    fn default() -> Self {
        DofCatalog {
            trans: vec!["trans_0".to_string(), "trans_1".to_string(), "trans_2".to_string()],
            rot: vec!["rot_0".to_string(), "rot_1".to_string(), "rot_2".to_string()],
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
