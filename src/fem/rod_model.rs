use super::{sequential_order, RodShape};
use crate::base::rotation::{cross3, exp_vec, log_mat, skew, TINY};
use crate::base::{assemble_matrix, assemble_vector, DofCatalog, Error, ParamRodModel, RodResult, Table};
use crate::material::{stress_names, strain_names, FunctionRegistry, IpIndex, Material, N_STRAIN};
use gemlab::mesh::Mesh;
use russell_lab::{mat_mat_mul, mat_t_mat_mul, mat_vec_mul, vec_inner, vec_mat_mul, vec_norm, Matrix, Norm, Vector};
use serde_json::{json, Value};
use tracing::{debug, warn};

/// Defines the number of DOFs per point: three translations and three rotations
pub const NDOF_PER_POINT: usize = 6;

/// Holds the kinematics of an element at its integration points
struct Kinematics {
    /// Rotations Λ
    lambda: Vec<Matrix>,

    /// Centreline tangents φ'
    dphi_ds: Vec<Vector>,

    /// Material strains [Λᵀφ' ; axial(ΛᵀΛ')] minus the reference strains
    strain: Vec<Vector>,
}

/// Implements a chain of geometrically exact (Simo-Reissner) rod elements
///
/// Each mesh point carries six DOFs, numbered `6 * point + k`: the
/// displacement u (k = 0, 1, 2) and the total rotation vector θ (k = 3, 4, 5).
/// The rotation of a point is `Λ = exp(θ) Λ₀`, where Λ₀ is the reference
/// triad mapping ê₃ onto the centreline tangent.
///
/// Strains are measured in the material frame:
///
/// ```text
/// γ = Λᵀ φ' - Λ₀ᵀ φ₀'        κ = axial(Λᵀ Λ') - axial(Λ₀ᵀ Λ₀')
/// ```
///
/// The element residual and tangent are
///
/// ```text
/// f = Σ w Ξ Π σ
/// K = Σ w Ξ Π C Πᵀ Ξᵀ + Σ w Ψ G Ψᵀ
/// ```
///
/// The second (geometric, non-symmetric) term corresponds to spatial spin
/// increments and is dropped in the symmetric tangent mode.
pub struct RodModel {
    /// Name identifying the model in error messages
    pub name: String,

    /// DOF names
    pub dofs: DofCatalog,

    /// Material of the cross section
    pub material: Material,

    symmetric_only: bool,
    lumped_mass: bool,
    shape: RodShape,
    mass_shape: RodShape,
    coords: Vec<Vector>,
    elements: Vec<Vec<usize>>,
    dnn_ds: Vec<Matrix>,
    weights: Vec<Vec<f64>>,
    mass_weights: Vec<Vec<f64>>,
    lambda0: Vec<Matrix>,
    strain0: Vec<Vec<Vector>>,
}

impl RodModel {
    /// Allocates a new instance
    ///
    /// # Input
    ///
    /// * `mesh` -- the rod mesh: all cells must have the same kind (Lin2, Lin3, or Lin4)
    /// * `param` -- the model parameters
    /// * `registry` -- registered yield functions (for elasto-plastic materials)
    pub fn new(mesh: &Mesh, param: &ParamRodModel, registry: &FunctionRegistry) -> RodResult<Self> {
        let context = format!("rod model '{}'", param.name);
        if mesh.cells.is_empty() {
            return Err(Error::config(context, "the mesh has no cells"));
        }
        if mesh.ndim != 2 && mesh.ndim != 3 {
            return Err(Error::config(context, format!("ndim must be 2 or 3; got {}", mesh.ndim)));
        }
        let kind = mesh.cells[0].kind;
        let order = sequential_order(kind).ok_or_else(|| {
            Error::config(
                context.as_str(),
                format!("cell kind must be Lin2, Lin3, or Lin4; got {:?}", kind),
            )
        })?;
        let nnode = order.len();

        // points
        let coords: Vec<Vector> = mesh
            .points
            .iter()
            .map(|p| {
                let z = if mesh.ndim == 3 { p.coords[2] } else { 0.0 };
                Vector::from(&[p.coords[0], p.coords[1], z])
            })
            .collect();

        // cells with points ordered along the rod
        let mut elements = Vec::with_capacity(mesh.cells.len());
        for cell in &mesh.cells {
            if cell.kind != kind {
                return Err(Error::config(
                    context,
                    format!("all cells must have the same kind; cell {} is {:?}", cell.id, cell.kind),
                ));
            }
            if let Some(p) = cell.points.iter().find(|p| **p >= coords.len()) {
                return Err(Error::config(
                    context,
                    format!("cell {} refers to the non-existent point {}", cell.id, p),
                ));
            }
            elements.push(order.iter().map(|i| cell.points[*i]).collect::<Vec<_>>());
        }

        // shapes
        let n_ip = param.ngauss.unwrap_or(nnode - 1);
        let shape = RodShape::new(kind, n_ip)?;
        let mass_shape = RodShape::new(kind, nnode)?;
        let mut dnn_ds = Vec::with_capacity(elements.len());
        let mut weights = Vec::with_capacity(elements.len());
        let mut mass_weights = Vec::with_capacity(elements.len());
        for (e, points) in elements.iter().enumerate() {
            let x: Vec<Vector> = points.iter().map(|p| coords[*p].clone()).collect();
            let length = shape.arclength(&x)[nnode - 1];
            if length < TINY {
                return Err(Error::config(context, format!("element {} has zero length", e)));
            }
            let (g, w) = shape.gradients(&x);
            dnn_ds.push(g);
            weights.push(w);
            mass_weights.push(mass_shape.gradients(&x).1);
        }

        // material
        let dofs = DofCatalog::new(&param.dof_names_trans, &param.dof_names_rot)?;
        let material = Material::new(&param.material, &param.name, elements.len(), n_ip, &dofs, registry)?;

        // reference triads and strains
        let lambda0 = reference_triads(&coords, &elements, param, &context)?;
        let mut strain0 = Vec::with_capacity(elements.len());
        for (e, points) in elements.iter().enumerate() {
            let x: Vec<Vector> = points.iter().map(|p| coords[*p].clone()).collect();
            let rotations: Vec<Matrix> = points.iter().map(|p| lambda0[*p].clone()).collect();
            let kin = kinematics(&shape, &dnn_ds[e], &x, &rotations, None)?;
            strain0.push(kin.strain);
        }
        debug!(
            model = param.name.as_str(),
            n_point = coords.len(),
            n_element = elements.len(),
            nnode,
            n_ip,
            "rod model allocated"
        );
        Ok(RodModel {
            name: param.name.clone(),
            dofs,
            material,
            symmetric_only: param.symmetric_tangent_stiffness,
            lumped_mass: param.lumped_mass,
            shape,
            mass_shape,
            coords,
            elements,
            dnn_ds,
            weights,
            mass_weights,
            lambda0,
            strain0,
        })
    }

    /// Returns the number of points
    pub fn n_point(&self) -> usize {
        self.coords.len()
    }

    /// Returns the number of elements
    pub fn n_element(&self) -> usize {
        self.elements.len()
    }

    /// Returns the number of integration points per element
    pub fn n_ip(&self) -> usize {
        self.shape.n_ip()
    }

    /// Returns the total number of equations (DOFs)
    pub fn n_equation(&self) -> usize {
        NDOF_PER_POINT * self.coords.len()
    }

    /// Returns the equation number of a DOF of a point
    pub fn equation(&self, point: usize, dof: usize) -> usize {
        NDOF_PER_POINT * point + dof
    }

    /// Returns the points of an element ordered along the rod
    pub fn element_points(&self, element: usize) -> &[usize] {
        &self.elements[element]
    }

    /// Returns the global equation numbers of the local equations of an element
    pub fn local_to_global(&self, element: usize) -> Vec<usize> {
        self.elements[element]
            .iter()
            .flat_map(|p| (0..NDOF_PER_POINT).map(move |k| NDOF_PER_POINT * p + k))
            .collect()
    }

    /// Returns the reference coordinates of a point
    pub fn reference_coords(&self, point: usize) -> &Vector {
        &self.coords[point]
    }

    /// Returns the reference triad Λ₀ of a point
    pub fn reference_triad(&self, point: usize) -> &Matrix {
        &self.lambda0[point]
    }

    /// Returns the rotation Λ = exp(θ) Λ₀ of a point
    pub fn node_rotation(&self, disp: &Vector, point: usize) -> RodResult<Matrix> {
        let r = NDOF_PER_POINT * point + 3;
        let theta = Vector::from(&[disp[r], disp[r + 1], disp[r + 2]]);
        let mut lambda = Matrix::new(3, 3);
        mat_mat_mul(&mut lambda, 1.0, &exp_vec(&theta), &self.lambda0[point], 0.0)?;
        Ok(lambda)
    }

    /// Returns the current positions and rotations of the nodes of an element
    fn node_states(&self, element: usize, disp: &Vector) -> RodResult<(Vec<Vector>, Vec<Matrix>)> {
        let points = &self.elements[element];
        let phi = points
            .iter()
            .map(|p| {
                let r = NDOF_PER_POINT * p;
                let x = &self.coords[*p];
                Vector::from(&[x[0] + disp[r], x[1] + disp[r + 1], x[2] + disp[r + 2]])
            })
            .collect();
        let rotations = points
            .iter()
            .map(|p| self.node_rotation(disp, *p))
            .collect::<RodResult<Vec<_>>>()?;
        Ok((phi, rotations))
    }

    fn element_kinematics(&self, element: usize, disp: &Vector) -> RodResult<Kinematics> {
        let (phi, rotations) = self.node_states(element, disp)?;
        kinematics(
            &self.shape,
            &self.dnn_ds[element],
            &phi,
            &rotations,
            Some(&self.strain0[element]),
        )
    }

    /// Updates the displacement vector with an increment
    ///
    /// Translations are added. Rotations are composed with the incremental
    /// (spatial) rotation: `exp(θ_new) = exp(Δθ) exp(θ)`.
    pub fn update_displacement(&self, disp: &mut Vector, delta: &Vector) -> RodResult<()> {
        for p in 0..self.n_point() {
            let r = NDOF_PER_POINT * p;
            for k in 0..3 {
                disp[r + k] += delta[r + k];
            }
            let theta = Vector::from(&[disp[r + 3], disp[r + 4], disp[r + 5]]);
            let dtheta = Vector::from(&[delta[r + 3], delta[r + 4], delta[r + 5]]);
            let mut composed = Matrix::new(3, 3);
            mat_mat_mul(&mut composed, 1.0, &exp_vec(&dtheta), &exp_vec(&theta), 0.0)?;
            let updated = log_mat(&composed)?;
            for k in 0..3 {
                disp[r + 3 + k] = updated[k];
            }
        }
        Ok(())
    }

    /// Calculates the strains at the integration points of an element
    ///
    /// Returns material strains, or spatial strains Π ε if `spatial` is true.
    pub fn calc_strains(&self, element: usize, disp: &Vector, spatial: bool) -> RodResult<Vec<Vector>> {
        let kin = self.element_kinematics(element, disp)?;
        if !spatial {
            return Ok(kin.strain);
        }
        kin.strain
            .iter()
            .zip(&kin.lambda)
            .map(|(eps, lambda)| to_spatial(lambda, eps))
            .collect()
    }

    /// Calculates the stresses at the integration points of an element without updating the state
    ///
    /// Returns material stresses, or spatial stresses Π σ if `spatial` is true.
    pub fn calc_stresses(&self, element: usize, disp: &Vector, spatial: bool) -> RodResult<Vec<Vector>> {
        let kin = self.element_kinematics(element, disp)?;
        let mut stresses = Vec::with_capacity(kin.strain.len());
        for (ip, eps) in kin.strain.iter().enumerate() {
            let sigma = self.material.stress_at_state(eps, IpIndex::new(element, ip))?;
            if spatial {
                stresses.push(to_spatial(&kin.lambda[ip], &sigma)?);
            } else {
                stresses.push(sigma);
            }
        }
        Ok(stresses)
    }

    /// Calculates the internal forces and the tangent stiffness of an element
    ///
    /// The material state of the integration points is updated (trial state).
    /// `inelastic = false` requests the elastic predictor only.
    pub fn calc_element(&mut self, element: usize, disp: &Vector, inelastic: bool) -> RodResult<(Vector, Matrix)> {
        let kin = self.element_kinematics(element, disp)?;
        let nnode = self.shape.nnode();
        let ndof = NDOF_PER_POINT * nnode;
        let mut f_int = Vector::new(ndof);
        let mut kk = Matrix::new(ndof, ndof);
        let nn = self.shape.shape_functions();
        let dnn_ds = &self.dnn_ds[element];
        for ip in 0..self.shape.n_ip() {
            let w = self.weights[element][ip];
            let sigma = self
                .material
                .update_stress(&kin.strain[ip], IpIndex::new(element, ip), inelastic)?;
            let pi = RodShape::pi_operator(&kin.lambda[ip]);
            let mut sigma_s = Vector::new(N_STRAIN);
            mat_vec_mul(&mut sigma_s, 1.0, &pi, &sigma)?;

            // spatial material stiffness Π C Πᵀ
            let cc_s = triple_product(&pi, self.material.stiffness_at(element), &pi)?;

            let xi: Vec<Matrix> = (0..nnode)
                .map(|i| RodShape::xi_operator(nn.get(i, ip), dnn_ds.get(i, ip), &kin.dphi_ds[ip]))
                .collect();
            let mut fi = Vector::new(N_STRAIN);
            for i in 0..nnode {
                mat_vec_mul(&mut fi, 1.0, &xi[i], &sigma_s)?;
                for k in 0..N_STRAIN {
                    f_int[NDOF_PER_POINT * i + k] += w * fi[k];
                }
                for j in 0..nnode {
                    let kij = triple_product(&xi[i], &cc_s, &xi[j])?;
                    add_block(&mut kk, NDOF_PER_POINT * i, NDOF_PER_POINT * j, w, &kij);
                }
            }

            if !self.symmetric_only {
                let n = Vector::from(&[sigma_s[0], sigma_s[1], sigma_s[2]]);
                let m = Vector::from(&[sigma_s[3], sigma_s[4], sigma_s[5]]);
                let gg = geometric_matrix(&n, &m, &kin.dphi_ds[ip]);
                let psi: Vec<Matrix> = (0..nnode)
                    .map(|i| RodShape::psi_operator(nn.get(i, ip), dnn_ds.get(i, ip)))
                    .collect();
                for i in 0..nnode {
                    for j in 0..nnode {
                        let kij = triple_product(&psi[i], &gg, &psi[j])?;
                        add_block(&mut kk, NDOF_PER_POINT * i, NDOF_PER_POINT * j, w, &kij);
                    }
                }
            }
        }
        Ok((f_int, kk))
    }

    /// Assembles the global internal force vector and the (dense) global tangent stiffness
    ///
    /// Rows and columns of prescribed equations are left out of the assembly.
    pub fn assemble(&mut self, disp: &Vector, prescribed: &[bool], inelastic: bool) -> RodResult<(Vector, Matrix)> {
        let neq = self.n_equation();
        let mut ff = Vector::new(neq);
        let mut kk = Matrix::new(neq, neq);
        for element in 0..self.n_element() {
            let (f_local, kk_local) = self.calc_element(element, disp, inelastic)?;
            let l2g = self.local_to_global(element);
            assemble_vector(&mut ff, &f_local, &l2g, prescribed);
            assemble_matrix(&mut kk, &kk_local, &l2g, prescribed);
        }
        Ok((ff, kk))
    }

    /// Assembles the (dense) global mass matrix
    ///
    /// The translational mass is consistent, or row-sum lumped if requested.
    /// The rotational inertia is lumped at the nodes and rotated to the
    /// spatial frame, `Λ J Λᵀ`, with J halved at the end nodes of each element.
    pub fn assemble_mass(&self, disp: &Vector) -> RodResult<Matrix> {
        let neq = self.n_equation();
        let mut mm = Matrix::new(neq, neq);
        let nnode = self.mass_shape.nnode();
        let nn = self.mass_shape.shape_functions();
        let mass = self.material.mass();
        for element in 0..self.n_element() {
            let points = &self.elements[element];
            let weights = &self.mass_weights[element];
            let length = weights.iter().sum::<f64>() / ((nnode - 1) as f64);
            let lumped = self.material.lumped_mass(length, element);
            let mut jj = Matrix::new(3, 3);
            for i in 0..3 {
                for j in 0..3 {
                    jj.set(i, j, lumped.get(3 + i, 3 + j));
                }
            }
            for a in 0..nnode {
                let row = NDOF_PER_POINT * points[a];
                for b in 0..nnode {
                    let col = if self.lumped_mass { row } else { NDOF_PER_POINT * points[b] };
                    let mut nab = 0.0;
                    for ip in 0..self.mass_shape.n_ip() {
                        nab += weights[ip] * nn.get(a, ip) * nn.get(b, ip);
                    }
                    for i in 0..3 {
                        for j in 0..3 {
                            mm.add(row + i, col + j, nab * mass.get(i, j));
                        }
                    }
                }
                let lambda = self.node_rotation(disp, points[a])?;
                let theta = triple_product(&lambda, &jj, &lambda)?;
                let factor = if a == 0 || a == nnode - 1 { 0.5 } else { 1.0 };
                for i in 0..3 {
                    for j in 0..3 {
                        mm.add(row + 3 + i, row + 3 + j, factor * theta.get(i, j));
                    }
                }
            }
        }
        Ok(mm)
    }

    /// Returns the (spatial) rotational inertia Θ lumped at a point
    pub fn node_inertia(&self, mass: &Matrix, point: usize) -> Matrix {
        let r = NDOF_PER_POINT * point + 3;
        let mut theta = Matrix::new(3, 3);
        for i in 0..3 {
            for j in 0..3 {
                theta.set(i, j, mass.get(r + i, r + j));
            }
        }
        theta
    }

    /// Calculates the gyroscopic forces ω × (Θ ω) at the rotational DOFs
    ///
    /// The mass matrix is rebuilt from `disp` on every call.
    pub fn gyroscopic_forces(&self, disp: &Vector, velocity: &Vector) -> RodResult<Vector> {
        let mm = self.assemble_mass(disp)?;
        let neq = self.n_equation();
        let mut momentum = Vector::new(neq);
        mat_vec_mul(&mut momentum, 1.0, &mm, velocity)?;
        let mut ff = Vector::new(neq);
        for p in 0..self.n_point() {
            let r = NDOF_PER_POINT * p + 3;
            let omega = Vector::from(&[velocity[r], velocity[r + 1], velocity[r + 2]]);
            let h = Vector::from(&[momentum[r], momentum[r + 1], momentum[r + 2]]);
            let f = cross3(&omega, &h);
            for k in 0..3 {
                ff[r + k] = f[k];
            }
        }
        Ok(ff)
    }

    /// Returns an element table (one row per element and integration point)
    ///
    /// "strain" and "stress" hold spatial values; "mat_strain" and
    /// "mat_stress" hold material values. Other names are forwarded to the
    /// material. Returns `None` if the name is not supported.
    pub fn element_table(&self, name: &str, disp: &Vector) -> RodResult<Option<Table>> {
        let n_ip = self.n_ip();
        let mut table = Table::new(self.n_element() * n_ip);
        let (names, spatial, stress) = match name {
            "strain" => (strain_names(), true, false),
            "mat_strain" => (strain_names(), false, false),
            "stress" => (stress_names(), true, true),
            "mat_stress" => (stress_names(), false, true),
            _ => {
                if self.material.get_table(name, &mut table)? {
                    return Ok(Some(table));
                }
                return Ok(None);
            }
        };
        let columns: Vec<usize> = names.iter().map(|n| table.add_column(n)).collect();
        for element in 0..self.n_element() {
            let values = if stress {
                self.calc_stresses(element, disp, spatial)?
            } else {
                self.calc_strains(element, disp, spatial)?
            };
            for (ip, v) in values.iter().enumerate() {
                for (k, c) in columns.iter().enumerate() {
                    table.set(*c, element * n_ip + ip, v[k]);
                }
            }
        }
        Ok(Some(table))
    }

    /// Returns a node table (one row per point) of "potentialEnergy" or "dissipatedEnergy"
    ///
    /// The energy densities of the committed state are distributed to the
    /// nodes with the weights `N w`. Returns `None` (with a warning) for
    /// other names.
    pub fn node_table(&self, name: &str) -> Option<Table> {
        let energy: fn(&Material, IpIndex) -> f64 = match name {
            "potentialEnergy" => Material::potential_energy,
            "dissipatedEnergy" => Material::dissipated_energy,
            _ => {
                warn!(model = self.name.as_str(), table = name, "node table is not supported");
                return None;
            }
        };
        let mut table = Table::new(self.n_point());
        let column = table.add_column(name);
        let nn = self.shape.shape_functions();
        for element in 0..self.n_element() {
            for (a, point) in self.elements[element].iter().enumerate() {
                for ip in 0..self.n_ip() {
                    let value = energy(&self.material, IpIndex::new(element, ip));
                    table.add(column, *point, nn.get(a, ip) * self.weights[element][ip] * value);
                }
            }
        }
        Some(table)
    }

    /// Returns the elastic potential energy of the committed state
    pub fn potential_energy(&self) -> f64 {
        self.integrate(Material::potential_energy)
    }

    /// Returns the energy dissipated up to the committed state
    pub fn dissipated_energy(&self) -> f64 {
        self.integrate(Material::dissipated_energy)
    }

    fn integrate(&self, density: fn(&Material, IpIndex) -> f64) -> f64 {
        let mut total = 0.0;
        for element in 0..self.n_element() {
            for ip in 0..self.n_ip() {
                total += self.weights[element][ip] * density(&self.material, IpIndex::new(element, ip));
            }
        }
        total
    }

    /// Commits the trial state of all integration points
    pub fn apply_deform(&mut self) -> RodResult<()> {
        self.material.apply_deform()
    }

    /// Discards the trial state of all integration points
    pub fn reject_deform(&mut self) {
        self.material.reject_deform();
    }

    /// Returns the resolved configuration
    pub fn config(&self) -> RodResult<Value> {
        Ok(json!({
            "name": self.name,
            "n_point": self.n_point(),
            "n_element": self.n_element(),
            "nnode": self.shape.nnode(),
            "n_ip": self.n_ip(),
            "dofs": self.dofs.names(),
            "symmetric_tangent_stiffness": self.symmetric_only,
            "lumpedMass": self.lumped_mass,
            "material": self.material.config()?,
        }))
    }
}

/// Computes the reference triads of all points
///
/// The tangent of a point averages the chords to its neighbours (or takes a
/// given direction). The triad maps ê₃ onto the tangent with the smallest
/// rotation or, if a material ê_y is given, completes `ê_x = ê_y × ê_z`.
fn reference_triads(
    coords: &[Vector],
    elements: &[Vec<usize>],
    param: &ParamRodModel,
    context: &str,
) -> RodResult<Vec<Matrix>> {
    let n_point = coords.len();
    let mut dirs = vec![Vector::new(3); n_point];
    let mut used = vec![false; n_point];
    for points in elements {
        let nnode = points.len();
        for a in 0..nnode {
            let prev = if a == 0 { 0 } else { a - 1 };
            let next = if a == nnode - 1 { a } else { a + 1 };
            let p = points[a];
            for k in 0..3 {
                dirs[p][k] += coords[points[next]][k] - coords[points[prev]][k];
            }
            used[p] = true;
        }
    }
    if param.given_dir_nodes.len() != param.given_dirs.len() {
        return Err(Error::config(
            context,
            format!(
                "given_dir_nodes ({}) and given_dirs ({}) must have the same length",
                param.given_dir_nodes.len(),
                param.given_dirs.len()
            ),
        ));
    }
    for (p, dir) in param.given_dir_nodes.iter().zip(&param.given_dirs) {
        if *p >= n_point {
            return Err(Error::config(context, format!("given direction refers to the non-existent point {}", p)));
        }
        dirs[*p] = Vector::from(dir);
        used[*p] = true;
    }
    let mut triads = Vec::with_capacity(n_point);
    for p in 0..n_point {
        if !used[p] {
            triads.push(Matrix::identity(3));
            continue;
        }
        let norm = vec_norm(&dirs[p], Norm::Euc);
        if norm < TINY {
            return Err(Error::config(context, format!("point {} has no tangent direction", p)));
        }
        let mut t = dirs[p].clone();
        t.scale(1.0 / norm);
        let triad = match &param.material_ey {
            Some(ey) => triad_from_ey(&t, &Vector::from(ey)).ok_or_else(|| {
                Error::config(context, format!("material_ey is parallel to the tangent at point {}", p))
            })?,
            None => triad_from_tangent(&t),
        };
        triads.push(triad);
    }
    Ok(triads)
}

/// Returns the smallest rotation mapping ê₃ onto the unit vector t
///
/// With v = ê₃ × t and c = ê₃ · t:
///
/// ```text
/// R = I + skew(v) + skew(v)²/(1 + c) = c I + skew(v) + v ⊗ v/(1 + c)
/// ```
///
/// An antiparallel tangent yields the half-turn about ê₁.
fn triad_from_tangent(t: &Vector) -> Matrix {
    let e3 = Vector::from(&[0.0, 0.0, 1.0]);
    let c = vec_inner(t, &e3);
    if 1.0 + c < TINY {
        return Matrix::from(&[[1.0, 0.0, 0.0], [0.0, -1.0, 0.0], [0.0, 0.0, -1.0]]);
    }
    let v = cross3(&e3, t);
    let mut r = skew(&v);
    for i in 0..3 {
        r.add(i, i, c);
        for j in 0..3 {
            r.add(i, j, v[i] * v[j] / (1.0 + c));
        }
    }
    r
}

/// Returns the triad with columns (ê_x, ê_y, ê_z) where ê_z = t and ê_y is the projection of `ey`
fn triad_from_ey(t: &Vector, ey: &Vector) -> Option<Matrix> {
    let mut ex = cross3(ey, t);
    let norm = vec_norm(&ex, Norm::Euc);
    if norm < TINY {
        return None;
    }
    ex.scale(1.0 / norm);
    let ey = cross3(t, &ex);
    let mut r = Matrix::new(3, 3);
    for i in 0..3 {
        r.set(i, 0, ex[i]);
        r.set(i, 1, ey[i]);
        r.set(i, 2, t[i]);
    }
    Some(r)
}

/// Computes the rotations, tangents, and material strains at the integration points
///
/// `reference` holds the strains subtracted from the raw values.
fn kinematics(
    shape: &RodShape,
    dnn_ds: &Matrix,
    phi: &[Vector],
    rotations: &[Matrix],
    reference: Option<&Vec<Vector>>,
) -> RodResult<Kinematics> {
    let lambda = shape.rotations(rotations)?;
    let dlambda = shape.rotation_gradients(rotations, dnn_ds)?;
    let dphi_ds = shape.interpolate(phi, dnn_ds);
    let mut strain = Vec::with_capacity(lambda.len());
    let mut gamma = Vector::new(3);
    let mut lt_dl = Matrix::new(3, 3);
    for ip in 0..lambda.len() {
        vec_mat_mul(&mut gamma, 1.0, &dphi_ds[ip], &lambda[ip])?;
        mat_t_mat_mul(&mut lt_dl, 1.0, &lambda[ip], &dlambda[ip], 0.0)?;
        let kappa = axial(&lt_dl);
        let mut eps = Vector::from(&[gamma[0], gamma[1], gamma[2], kappa[0], kappa[1], kappa[2]]);
        if let Some(eps0) = reference {
            for k in 0..N_STRAIN {
                eps[k] -= eps0[ip][k];
            }
        }
        strain.push(eps);
    }
    Ok(Kinematics {
        lambda,
        dphi_ds,
        strain,
    })
}

/// Returns the axial vector of the skew-symmetric part of a 3×3 matrix
fn axial(m: &Matrix) -> Vector {
    Vector::from(&[
        0.5 * (m.get(2, 1) - m.get(1, 2)),
        0.5 * (m.get(0, 2) - m.get(2, 0)),
        0.5 * (m.get(1, 0) - m.get(0, 1)),
    ])
}

/// Maps a material 6-vector to the spatial frame: Π v = (Λ v₀₋₂, Λ v₃₋₅)
fn to_spatial(lambda: &Matrix, v: &Vector) -> RodResult<Vector> {
    let mut a = Vector::new(3);
    let mut b = Vector::new(3);
    mat_vec_mul(&mut a, 1.0, lambda, &Vector::from(&[v[0], v[1], v[2]]))?;
    mat_vec_mul(&mut b, 1.0, lambda, &Vector::from(&[v[3], v[4], v[5]]))?;
    Ok(Vector::from(&[a[0], a[1], a[2], b[0], b[1], b[2]]))
}

/// Computes the geometric matrix G (9×9) from the spatial stress resultants
///
/// ```text
///     ┌                                  ┐
///     │   0        0      -skew(n)       │
/// G = │   0        0      -skew(m)       │
///     │ skew(n)    0    n ⊗ φ' - (n·φ') I │
///     └                                  ┘
/// ```
fn geometric_matrix(n: &Vector, m: &Vector, dphi_ds: &Vector) -> Matrix {
    let sn = skew(n);
    let sm = skew(m);
    let n_dot = vec_inner(n, dphi_ds);
    let mut gg = Matrix::new(9, 9);
    for i in 0..3 {
        for j in 0..3 {
            gg.set(i, 6 + j, -sn.get(i, j));
            gg.set(3 + i, 6 + j, -sm.get(i, j));
            gg.set(6 + i, j, sn.get(i, j));
            let diag = if i == j { n_dot } else { 0.0 };
            gg.set(6 + i, 6 + j, n[i] * dphi_ds[j] - diag);
        }
    }
    gg
}

/// Computes a b cᵀ
fn triple_product(a: &Matrix, b: &Matrix, c: &Matrix) -> RodResult<Matrix> {
    let mut ab = Matrix::new(a.dims().0, b.dims().1);
    mat_mat_mul(&mut ab, 1.0, a, b, 0.0)?;
    let mut abc = Matrix::new(a.dims().0, c.dims().0);
    mat_mat_mul(&mut abc, 1.0, &ab, &c.transposed(), 0.0)?;
    Ok(abc)
}

/// Adds `w m` to the block of `kk` starting at (row0, col0)
fn add_block(kk: &mut Matrix, row0: usize, col0: usize, w: f64, m: &Matrix) {
    let (nrow, ncol) = m.dims();
    for i in 0..nrow {
        for j in 0..ncol {
            kk.add(row0 + i, col0 + j, w * m.get(i, j));
        }
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
