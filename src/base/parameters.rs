use serde::{Deserialize, Serialize};

/// Holds parameters for the cross section of a rod (linear elastic part)
///
/// The cross section is given either explicitly (`area` and `area_moment`) or
/// by a `cross_section` kind with its dimensions:
///
/// * `"square"` -- requires `side_length` with one value
/// * `"rectangle"` -- requires `side_length` with two values
/// * `"circle"` -- requires `radius`
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ParamRod {
    /// Young's modulus E
    pub young: f64,

    /// Shear modulus G (computed from `poisson_ratio` if None)
    #[serde(default)]
    pub shear_modulus: Option<f64>,

    /// Poisson's coefficient ν (only used if `shear_modulus` is None)
    #[serde(default)]
    pub poisson_ratio: Option<f64>,

    /// Cross-sectional area A (explicit section)
    #[serde(default)]
    pub area: Option<f64>,

    /// Area moments of inertia (explicit section; one or two values)
    #[serde(default)]
    pub area_moment: Option<Vec<f64>>,

    /// Polar moment of inertia J (default = sum of the area moments)
    #[serde(default)]
    pub polar_moment: Option<f64>,

    /// Shear correction factor (default = 5/6, or 9/10 for circles)
    #[serde(default)]
    pub shear_correction: Option<f64>,

    /// Cross-section kind: "rectangle", "square", or "circle"
    #[serde(default)]
    pub cross_section: Option<String>,

    /// Side lengths of a square (one value) or rectangle (two values)
    #[serde(default)]
    pub side_length: Option<Vec<f64>>,

    /// Radius of a circular section
    #[serde(default)]
    pub radius: Option<f64>,

    /// Intrinsic (real) density
    #[serde(default)]
    pub density: f64,

    /// Multiplier applied to the rotational inertia entries of the mass matrix
    #[serde(default)]
    pub inertia_correct: Option<f64>,

    /// Stiffening factor of the elements at both ends of the chain
    #[serde(default)]
    pub edge_factor: Option<f64>,

    /// Number of stiffened elements at each end of the chain
    #[serde(default)]
    pub edge_elements: usize,

    /// Number of elements in the chain (default = number of elements of the model)
    #[serde(default, rename = "elemCount")]
    pub elem_count: Option<usize>,
}

/// Holds parameters for the plastic part of an elasto-plastic rod
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ParamPlastic {
    /// Name of the registered yield function f(σ, h)
    #[serde(rename = "yieldCond")]
    pub yield_cond: String,

    /// Names of the registered derivatives ∂f/∂xᵢ (one per argument of f)
    #[serde(default, rename = "yieldDeriv")]
    pub yield_deriv: Option<Vec<String>>,

    /// Isotropic hardening coefficient (enables isotropic hardening)
    #[serde(default, rename = "isotropicCoefficient")]
    pub isotropic_coefficient: Option<f64>,

    /// Kinematic hardening tensor given by 1 (scalar), N (diagonal) or N×N values
    #[serde(default, rename = "kinematicTensor")]
    pub kinematic_tensor: Option<Vec<f64>>,

    /// Max number of return-mapping iterations
    #[serde(default = "default_max_iter")]
    pub max_iter: usize,

    /// Tolerance on the yield function
    #[serde(default = "default_precision")]
    pub precision: f64,
}

fn default_max_iter() -> usize {
    20
}

fn default_precision() -> f64 {
    1e-5
}

/// Holds material parameters of rods
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(tag = "type")]
pub enum ParamMaterial {
    /// Linear elastic cross section
    ElasticRod(ParamRod),

    /// Elasto-plastic cross section (return mapping around the elastic predictor)
    ElastoPlasticRod {
        #[serde(flatten)]
        rod: ParamRod,

        #[serde(flatten)]
        plastic: ParamPlastic,
    },
}

impl ParamMaterial {
    /// Returns the parameters of the elastic part
    pub fn rod(&self) -> &ParamRod {
        match self {
            ParamMaterial::ElasticRod(rod) => rod,
            ParamMaterial::ElastoPlasticRod { rod, .. } => rod,
        }
    }
}

/// Holds parameters of the rod element model
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ParamRodModel {
    /// Name identifying the model in error messages
    #[serde(default = "default_model_name")]
    pub name: String,

    /// Names of the translational DOFs
    #[serde(default = "default_dof_names_trans", rename = "dofNamesTrans")]
    pub dof_names_trans: Vec<String>,

    /// Names of the rotational DOFs
    #[serde(default = "default_dof_names_rot", rename = "dofNamesRot")]
    pub dof_names_rot: Vec<String>,

    /// Drops the (non-symmetric) geometric stiffness from the tangent
    #[serde(default)]
    pub symmetric_tangent_stiffness: bool,

    /// Uses a lumped (instead of consistent) translational mass
    #[serde(default, rename = "lumpedMass")]
    pub lumped_mass: bool,

    /// Material ê_y direction used to build the reference triads
    #[serde(default)]
    pub material_ey: Option<[f64; 3]>,

    /// Points with a prescribed reference tangent direction
    #[serde(default)]
    pub given_dir_nodes: Vec<usize>,

    /// Reference tangent directions of `given_dir_nodes`
    #[serde(default)]
    pub given_dirs: Vec<[f64; 3]>,

    /// Number of integration points (default = reduced, nnode - 1)
    #[serde(default)]
    pub ngauss: Option<usize>,

    /// Material of the cross section
    pub material: ParamMaterial,
}

fn default_model_name() -> String {
    "rod".to_string()
}

fn default_dof_names_trans() -> Vec<String> {
    vec!["trans_0".to_string(), "trans_1".to_string(), "trans_2".to_string()]
}

fn default_dof_names_rot() -> Vec<String> {
    vec!["rot_0".to_string(), "rot_1".to_string(), "rot_2".to_string()]
}

impl ParamRodModel {
    /// Allocates a new instance with default options
    pub fn new(material: ParamMaterial) -> Self {
        ParamRodModel {
            name: default_model_name(),
            dof_names_trans: default_dof_names_trans(),
            dof_names_rot: default_dof_names_rot(),
            symmetric_tangent_stiffness: false,
            lumped_mass: false,
            material_ey: None,
            given_dir_nodes: Vec::new(),
            given_dirs: Vec::new(),
            ngauss: None,
            material,
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
