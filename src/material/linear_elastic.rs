use super::{HistoryArray, IpIndex, IpScalars, SectionProperties, N_STRAIN};
use crate::base::{Error, ParamRod, RodResult};
use russell_lab::{mat_vec_mul, Matrix, Vector};
use tracing::debug;

/// Implements a linear elastic rod cross section
///
/// The stiffness and mass per unit length (material frame) are
///
/// ```text
/// K = diag(G A k, G A k, E A, E I₁, E I₂, G J)
/// M = diag(ρ A, ρ A, ρ A, 0, 0, ρ J)
/// ```
///
/// The third material axis is the rod axis. The rotational entries of M
/// are multiplied by `inertia_correct`.
pub struct LinearElasticRod {
    /// Name of the material instance
    pub name: String,

    /// Cross-section properties
    pub section: SectionProperties,

    kk: Matrix,
    kk_edge: Option<Matrix>,
    mm: Matrix,
    inertia_correct: f64,
    edge_elements: usize,
    elem_count: usize,
    strain: HistoryArray,
    potential: IpScalars,
}

impl LinearElasticRod {
    /// Allocates a new instance
    ///
    /// # Input
    ///
    /// * `param` -- the parameters
    /// * `name` -- identifies the instance in error messages
    /// * `n_element` -- number of elements of the rod model
    /// * `n_ip` -- number of integration points per element
    pub fn new(param: &ParamRod, name: &str, n_element: usize, n_ip: usize) -> RodResult<Self> {
        let section = SectionProperties::new(param, name)?;
        let context = format!("material '{}'", name);
        let inertia_correct = param.inertia_correct.unwrap_or(1.0);
        if !(inertia_correct > 0.0) {
            return Err(Error::config(
                &context,
                format!("inertia_correct = {} must be positive", inertia_correct),
            ));
        }
        let elem_count = param.elem_count.unwrap_or(n_element);
        if elem_count == 0 {
            return Err(Error::config(&context, "elemCount must be positive"));
        }

        // material stiffness
        let (ee, gg, a, k) = (section.young, section.shear_modulus, section.area, section.shear_correction);
        let mut kk = Matrix::new(N_STRAIN, N_STRAIN);
        kk.set(0, 0, gg * a * k);
        kk.set(1, 1, gg * a * k);
        kk.set(2, 2, ee * a);
        kk.set(3, 3, ee * section.area_moment[0]);
        kk.set(4, 4, ee * section.area_moment[1]);
        kk.set(5, 5, gg * section.polar_moment);

        // stiffened ends
        let kk_edge = match param.edge_factor {
            None => None,
            Some(f) => {
                if !(f > 0.0) {
                    return Err(Error::config(&context, format!("edge_factor = {} must be positive", f)));
                }
                let mut kk_edge = kk.clone();
                for i in 0..N_STRAIN {
                    for j in 0..N_STRAIN {
                        let power = match (i < 3, j < 3) {
                            (true, true) => 2,
                            (false, false) => 4,
                            _ => 3,
                        };
                        kk_edge.set(i, j, kk.get(i, j) * f64::powi(f, power));
                    }
                }
                Some(kk_edge)
            }
        };

        // material mass
        let rho = section.density;
        let mut mm = Matrix::new(N_STRAIN, N_STRAIN);
        mm.set(0, 0, rho * a);
        mm.set(1, 1, rho * a);
        mm.set(2, 2, rho * a);
        mm.set(5, 5, rho * section.polar_moment * inertia_correct);

        debug!(
            material = name,
            ga_k = gg * a * k,
            ea = ee * a,
            ei_1 = ee * section.area_moment[0],
            ei_2 = ee * section.area_moment[1],
            gj = gg * section.polar_moment,
            rho_a = rho * a,
            "resolved linear elastic rod"
        );

        Ok(LinearElasticRod {
            name: name.to_string(),
            section,
            kk,
            kk_edge,
            mm,
            inertia_correct,
            edge_elements: param.edge_elements,
            elem_count,
            strain: HistoryArray::new(N_STRAIN, n_ip, n_element),
            potential: IpScalars::new(n_ip, n_element),
        })
    }

    /// Returns whether the element lies in the stiffened zone at the ends of the chain
    pub fn is_edge(&self, element: usize) -> bool {
        self.kk_edge.is_some()
            && self.edge_elements > 0
            && (element < self.edge_elements || element + self.edge_elements >= self.elem_count)
    }

    /// Returns whether the element is the first or last one of the chain
    pub fn is_boundary(&self, element: usize) -> bool {
        element == 0 || element + 1 == self.elem_count
    }

    /// Returns the material stiffness K
    pub fn stiffness(&self) -> &Matrix {
        &self.kk
    }

    /// Returns the material stiffness of an element (including the edge stiffening)
    pub fn stiffness_at(&self, element: usize) -> &Matrix {
        match &self.kk_edge {
            Some(kk_edge) if self.is_edge(element) => kk_edge,
            _ => &self.kk,
        }
    }

    /// Returns the material mass per unit length M
    pub fn mass(&self) -> &Matrix {
        &self.mm
    }

    /// Returns the lumped mass of a rod segment
    ///
    /// The segment length ℓ is `length`, or `length/2` for the first and last
    /// elements of the chain. The translational and torsional entries are
    /// `M ℓ`. The bending entries hold the rotary inertia of the segment about
    /// its centroid, `m (Iₖ/A + ℓ²/12)` with `m = ρ A ℓ`, which amounts to
    /// `m (3r² + ℓ²)/12` for circles and `m (b² + ℓ²)/12` for rectangles.
    /// Boundary segments add the offset term `m (ℓ/2)²`.
    pub fn lumped_mass(&self, length: f64, element: usize) -> Matrix {
        let boundary = self.is_boundary(element);
        let ell = if boundary { 0.5 * length } else { length };
        let s = &self.section;
        let m = s.density * s.area * ell;
        let offset = if boundary { m * 0.25 * ell * ell } else { 0.0 };
        let mut ml = Matrix::new(N_STRAIN, N_STRAIN);
        for i in 0..3 {
            ml.set(i, i, m);
        }
        ml.set(3, 3, m * (s.area_moment[0] / s.area + ell * ell / 12.0) + offset);
        ml.set(4, 4, m * (s.area_moment[1] / s.area + ell * ell / 12.0) + offset);
        ml.set(5, 5, s.density * s.polar_moment * ell);
        for i in 3..N_STRAIN {
            ml.set(i, i, ml.get(i, i) * self.inertia_correct);
        }
        ml
    }

    /// Calculates the stress σ = K ε (pure)
    pub fn stress(&self, strain: &Vector) -> RodResult<Vector> {
        let mut stress = Vector::new(N_STRAIN);
        mat_vec_mul(&mut stress, 1.0, &self.kk, strain)?;
        Ok(stress)
    }

    /// Calculates the stress σ = K ε of an element (pure; includes the edge stiffening)
    pub fn stress_at(&self, strain: &Vector, element: usize) -> RodResult<Vector> {
        let mut stress = Vector::new(N_STRAIN);
        mat_vec_mul(&mut stress, 1.0, self.stiffness_at(element), strain)?;
        Ok(stress)
    }

    /// Calculates the stress and records the trial strain of an integration point
    pub fn update_stress(&mut self, strain: &Vector, idx: IpIndex) -> RodResult<Vector> {
        self.strain.set_current(idx, strain.as_data());
        self.stress_at(strain, idx.element)
    }

    /// Returns the strain history
    pub fn strains(&self) -> &HistoryArray {
        &self.strain
    }

    pub(crate) fn strains_mut(&mut self) -> &mut HistoryArray {
        &mut self.strain
    }

    /// Returns the elastic potential energy (per unit length) of the last committed state
    pub fn potential(&self, idx: IpIndex) -> f64 {
        self.potential.get(idx)
    }

    pub(crate) fn set_potential(&mut self, idx: IpIndex, value: f64) {
        self.potential.set(idx, value);
    }

    pub(crate) fn commit(&mut self) {
        self.strain.commit();
    }

    /// Commits the trial strains and stores the potential energy 0.5 ε·(Kε)
    pub fn apply_deform(&mut self) -> RodResult<()> {
        for element in 0..self.strain.n_element() {
            for ip in 0..self.strain.n_ip() {
                let idx = IpIndex::new(element, ip);
                let eps = Vector::from(&self.strain.current(idx).to_vec());
                let sig = self.stress_at(&eps, element)?;
                let energy: f64 = (0..N_STRAIN).map(|i| eps[i] * sig[i]).sum();
                self.potential.set(idx, 0.5 * energy);
            }
        }
        self.commit();
        Ok(())
    }

    /// Discards the trial strains
    pub fn reject_deform(&mut self) {
        self.strain.reject();
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::LinearElasticRod;
    use crate::base::SampleParams;
    use crate::material::IpIndex;
    use russell_lab::{approx_eq, Vector};

    #[test]
    fn stiffness_and_mass_work() {
        let p = SampleParams::param_unit_section();
        let m = LinearElasticRod::new(&p, "unit", 1, 1).unwrap();
        let kk = m.stiffness();
        approx_eq(kk.get(0, 0), 400.0 * 5.0 / 6.0, 1e-12);
        approx_eq(kk.get(1, 1), 400.0 * 5.0 / 6.0, 1e-12);
        assert_eq!(kk.get(2, 2), 1000.0);
        approx_eq(kk.get(3, 3), 100.0, 1e-12);
        approx_eq(kk.get(4, 4), 100.0, 1e-12);
        approx_eq(kk.get(5, 5), 80.0, 1e-12);
        assert_eq!(kk.get(0, 1), 0.0);
        let mm = m.mass();
        assert_eq!(mm.get(0, 0), 1.0);
        assert_eq!(mm.get(3, 3), 0.0);
        assert_eq!(mm.get(4, 4), 0.0);
        approx_eq(mm.get(5, 5), 0.2, 1e-15);
    }

    #[test]
    fn stress_is_linear() {
        let p = SampleParams::param_steel_circle(0.01);
        let m = LinearElasticRod::new(&p, "steel", 1, 1).unwrap();
        let a = Vector::from(&[1e-3, -2e-3, 5e-4, 0.1, -0.2, 0.05]);
        let b = Vector::from(&[-4e-4, 1e-3, 2e-3, -0.3, 0.1, 0.2]);
        let (alpha, beta) = (2.5, -0.75);
        let mut c = Vector::new(6);
        for i in 0..6 {
            c[i] = alpha * a[i] + beta * b[i];
        }
        let sa = m.stress(&a).unwrap();
        let sb = m.stress(&b).unwrap();
        let sc = m.stress(&c).unwrap();
        for i in 0..6 {
            approx_eq(sc[i], alpha * sa[i] + beta * sb[i], 1e-12 * f64::max(1.0, f64::abs(sc[i])));
        }
    }

    #[test]
    fn edge_stiffening_works() {
        let mut p = SampleParams::param_unit_section();
        p.edge_factor = Some(2.0);
        p.edge_elements = 1;
        let m = LinearElasticRod::new(&p, "edge", 4, 1).unwrap();
        assert!(m.is_edge(0));
        assert!(!m.is_edge(1));
        assert!(!m.is_edge(2));
        assert!(m.is_edge(3));
        approx_eq(m.stiffness_at(0).get(2, 2), 4000.0, 1e-12);
        approx_eq(m.stiffness_at(3).get(3, 3), 1600.0, 1e-12);
        approx_eq(m.stiffness_at(1).get(2, 2), 1000.0, 1e-12);
        let eps = Vector::from(&[0.0, 0.0, 1e-3, 0.0, 0.0, 0.0]);
        approx_eq(m.stress_at(&eps, 0).unwrap()[2], 4.0, 1e-12);
        approx_eq(m.stress_at(&eps, 1).unwrap()[2], 1.0, 1e-12);

        // elemCount overrides the number of elements of the model
        p.elem_count = Some(10);
        let m = LinearElasticRod::new(&p, "edge", 4, 1).unwrap();
        assert!(!m.is_edge(3));
        assert!(m.is_edge(9));
    }

    #[test]
    fn lumped_mass_works() {
        // circle: bending entries = m (3r² + ℓ²)/12
        let p = SampleParams::param_steel_circle(0.01);
        let m = LinearElasticRod::new(&p, "steel", 3, 1).unwrap();
        let (r, ell) = (0.01, 0.2);
        let mass = 7850.0 * std::f64::consts::PI * r * r * ell;
        let ml = m.lumped_mass(ell, 1);
        approx_eq(ml.get(0, 0), mass, 1e-14);
        approx_eq(ml.get(3, 3), mass * (3.0 * r * r + ell * ell) / 12.0, 1e-16);
        approx_eq(ml.get(4, 4), mass * (3.0 * r * r + ell * ell) / 12.0, 1e-16);

        // boundary element: halved length plus offset term
        let ml = m.lumped_mass(ell, 0);
        let (mb, lb) = (0.5 * mass, 0.5 * ell);
        approx_eq(ml.get(2, 2), mb, 1e-14);
        approx_eq(ml.get(3, 3), mb * (3.0 * r * r + lb * lb) / 12.0 + mb * lb * lb / 4.0, 1e-16);

        // rectangle: bending entries = m (b² + ℓ²)/12
        let mut p = SampleParams::param_unit_section();
        p.area = None;
        p.area_moment = None;
        p.cross_section = Some("rectangle".into());
        p.side_length = Some(vec![0.2, 0.1]);
        p.inertia_correct = Some(2.0);
        let m = LinearElasticRod::new(&p, "rect", 3, 1).unwrap();
        let ml = m.lumped_mass(1.0, 1);
        let mass = 0.02;
        approx_eq(ml.get(0, 0), mass, 1e-15);
        approx_eq(ml.get(3, 3), 2.0 * mass * (0.1 * 0.1 + 1.0) / 12.0, 1e-15);
        approx_eq(ml.get(4, 4), 2.0 * mass * (0.2 * 0.2 + 1.0) / 12.0, 1e-15);
    }

    #[test]
    fn apply_then_reject_keeps_committed_state() {
        let p = SampleParams::param_unit_section();
        let mut m = LinearElasticRod::new(&p, "unit", 2, 2).unwrap();
        let idx = IpIndex::new(1, 0);
        let eps = Vector::from(&[0.0, 0.0, 0.01, 0.0, 0.0, 0.0]);
        m.update_stress(&eps, idx).unwrap();
        m.apply_deform().unwrap();
        approx_eq(m.potential(idx), 0.5 * 1000.0 * 1e-4, 1e-15);
        assert_eq!(m.strains().old(idx), eps.as_data().as_slice());

        // apply immediately followed by reject
        m.apply_deform().unwrap();
        m.reject_deform();
        assert_eq!(m.strains().old(idx), eps.as_data().as_slice());
        assert_eq!(m.strains().current(idx), eps.as_data().as_slice());
        approx_eq(m.potential(idx), 0.05, 1e-15);

        // trial state is discarded
        let other = Vector::from(&[0.0, 0.0, 0.02, 0.0, 0.0, 0.0]);
        m.update_stress(&other, idx).unwrap();
        m.reject_deform();
        assert_eq!(m.strains().current(idx), eps.as_data().as_slice());
    }

    #[test]
    fn new_captures_errors() {
        let mut p = SampleParams::param_unit_section();
        p.edge_factor = Some(-1.0);
        assert!(LinearElasticRod::new(&p, "x", 2, 1).is_err());
        let mut p = SampleParams::param_unit_section();
        p.inertia_correct = Some(0.0);
        assert!(LinearElasticRod::new(&p, "x", 2, 1).is_err());
    }
}
