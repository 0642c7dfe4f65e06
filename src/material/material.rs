use super::{ElastoPlasticRod, FunctionRegistry, IpIndex, LinearElasticRod, N_STRAIN};
use crate::base::{DofCatalog, Error, ParamMaterial, RodResult, Table};
use russell_lab::{Matrix, Vector};
use serde_json::{Map, Value};
use tracing::warn;

/// Returns the column names of the strain components
pub fn strain_names() -> [&'static str; N_STRAIN] {
    ["gamma_0", "gamma_1", "gamma_2", "kappa_0", "kappa_1", "kappa_2"]
}

/// Returns the column names of the stress components
pub fn stress_names() -> [&'static str; N_STRAIN] {
    ["n_0", "n_1", "n_2", "m_0", "m_1", "m_2"]
}

/// Holds the material of a rod cross section
///
/// The plastic variant owns an elastic predictor and delegates the linear
/// law, the stiffness, and the mass to it.
pub enum Material {
    /// Linear elastic cross section
    Elastic(LinearElasticRod),

    /// Elasto-plastic cross section
    Plastic(ElastoPlasticRod),
}

impl Material {
    /// Allocates a new instance
    ///
    /// # Input
    ///
    /// * `param` -- the material parameters
    /// * `name` -- identifies the instance in error messages
    /// * `n_element` -- number of elements of the rod model
    /// * `n_ip` -- number of integration points per element
    /// * `dofs` -- DOF names labelling the yield function arguments
    /// * `registry` -- registered yield functions (unused by elastic materials)
    pub fn new(
        param: &ParamMaterial,
        name: &str,
        n_element: usize,
        n_ip: usize,
        dofs: &DofCatalog,
        registry: &FunctionRegistry,
    ) -> RodResult<Self> {
        match param {
            ParamMaterial::ElasticRod(rod) => Ok(Material::Elastic(LinearElasticRod::new(rod, name, n_element, n_ip)?)),
            ParamMaterial::ElastoPlasticRod { rod, plastic } => Ok(Material::Plastic(ElastoPlasticRod::new(
                rod, plastic, name, n_element, n_ip, dofs, registry,
            )?)),
        }
    }

    /// Returns the elastic part
    pub fn elastic(&self) -> &LinearElasticRod {
        match self {
            Material::Elastic(m) => m,
            Material::Plastic(m) => &m.elastic,
        }
    }

    /// Calculates the elastic stress σ = K ε (pure; no state is touched)
    pub fn stress(&self, strain: &Vector) -> RodResult<Vector> {
        self.elastic().stress(strain)
    }

    /// Calculates the stress of an integration point and updates its trial state
    ///
    /// `inelastic = false` requests the elastic predictor only.
    pub fn update_stress(&mut self, strain: &Vector, idx: IpIndex, inelastic: bool) -> RodResult<Vector> {
        match self {
            Material::Elastic(m) => m.update_stress(strain, idx),
            Material::Plastic(m) => m.update_stress(strain, idx, inelastic),
        }
    }

    /// Calculates the stress of an integration point without updating its state
    ///
    /// Plastic materials subtract the plastic strain of the trial state.
    pub fn stress_at_state(&self, strain: &Vector, idx: IpIndex) -> RodResult<Vector> {
        match self {
            Material::Elastic(m) => m.stress_at(strain, idx.element),
            Material::Plastic(m) => {
                let eps_p = m.plastic_strains().current(idx);
                let mut eps_e = Vector::new(N_STRAIN);
                for i in 0..N_STRAIN {
                    eps_e[i] = strain[i] - eps_p[i];
                }
                m.elastic.stress_at(&eps_e, idx.element)
            }
        }
    }

    /// Returns the material stiffness K
    pub fn stiffness(&self) -> &Matrix {
        self.elastic().stiffness()
    }

    /// Returns the material stiffness of an element
    pub fn stiffness_at(&self, element: usize) -> &Matrix {
        self.elastic().stiffness_at(element)
    }

    /// Returns the material mass per unit length M
    pub fn mass(&self) -> &Matrix {
        self.elastic().mass()
    }

    /// Returns the lumped mass of a segment of an element
    pub fn lumped_mass(&self, length: f64, element: usize) -> Matrix {
        self.elastic().lumped_mass(length, element)
    }

    /// Commits the trial state of all integration points
    pub fn apply_deform(&mut self) -> RodResult<()> {
        match self {
            Material::Elastic(m) => m.apply_deform(),
            Material::Plastic(m) => m.apply_deform(),
        }
    }

    /// Discards the trial state of all integration points
    pub fn reject_deform(&mut self) {
        match self {
            Material::Elastic(m) => m.reject_deform(),
            Material::Plastic(m) => m.reject_deform(),
        }
    }

    /// Returns the elastic potential energy (per unit length) of an integration point
    pub fn potential_energy(&self, idx: IpIndex) -> f64 {
        self.elastic().potential(idx)
    }

    /// Returns the dissipated energy (per unit length) of an integration point
    pub fn dissipated_energy(&self, idx: IpIndex) -> f64 {
        match self {
            Material::Elastic(_) => 0.0,
            Material::Plastic(m) => m.dissipated(idx),
        }
    }

    /// Returns the hardening potential (per unit length) of an integration point
    pub fn hardening_potential(&self, idx: IpIndex) -> f64 {
        match self {
            Material::Elastic(_) => 0.0,
            Material::Plastic(m) => m.hardening_potential(idx),
        }
    }

    /// Writes a per-integration-point field into a table
    ///
    /// The table rows are `element * n_ip + ip`. Supported names are "strain"
    /// and, for plastic materials, "plast_strain" and "hard_params". Other
    /// names issue a warning and leave the table untouched.
    ///
    /// Returns whether the table has been written, or an error if the table
    /// does not have one row per integration point.
    pub fn get_table(&self, name: &str, table: &mut Table) -> RodResult<bool> {
        let strains = self.elastic().strains();
        let (history, names): (_, Vec<String>) = match (name, self) {
            ("strain", _) => (strains, strain_names().iter().map(|s| s.to_string()).collect()),
            ("plast_strain", Material::Plastic(m)) => {
                (m.plastic_strains(), strain_names().iter().map(|s| s.to_string()).collect())
            }
            ("hard_params", Material::Plastic(m)) => (m.hardening_params(), m.hardening_names().to_vec()),
            _ => {
                warn!(
                    material = self.elastic().name.as_str(),
                    table = name,
                    "table is not supported by this material"
                );
                return Ok(false);
            }
        };
        let n_ip = history.n_ip();
        let nrow = history.n_element() * n_ip;
        if table.nrow() != nrow {
            return Err(Error::invalid_input(format!(
                "table '{}' must have {} rows (one per integration point); got {}",
                name,
                nrow,
                table.nrow()
            )));
        }
        let columns: Vec<usize> = names.iter().map(|n| table.add_column(n)).collect();
        for element in 0..history.n_element() {
            for ip in 0..n_ip {
                let row = element * n_ip + ip;
                let values = history.current(IpIndex::new(element, ip));
                for (c, value) in columns.iter().zip(values) {
                    table.set(*c, row, *value);
                }
            }
        }
        Ok(true)
    }

    /// Returns the resolved configuration (echo of the derived properties)
    pub fn config(&self) -> RodResult<Value> {
        let mut map = Map::new();
        let kind = match self {
            Material::Elastic(_) => "ElasticRod",
            Material::Plastic(_) => "ElastoPlasticRod",
        };
        map.insert("type".to_string(), Value::from(kind));
        let section = serde_json::to_value(&self.elastic().section).map_err(|e| Error::invalid_input(e.to_string()))?;
        map.insert("section".to_string(), section);
        if let Material::Plastic(m) = self {
            map.insert("hardening".to_string(), Value::from(m.hardening_names().to_vec()));
        }
        Ok(Value::Object(map))
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
