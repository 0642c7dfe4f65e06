use super::{FunctionRegistry, HistoryArray, IpIndex, IpScalars, LinearElasticRod, YieldSurface, N_STRAIN};
use crate::base::{DofCatalog, Error, ParamPlastic, ParamRod, RodResult};
use russell_lab::{Matrix, Vector};
use tracing::warn;

/// Implements an elasto-plastic rod cross section
///
/// The elastic predictor is delegated to a [LinearElasticRod]. The plastic
/// corrector is a single-surface, associative cutting-plane return mapping on
/// the generalized stresses σ (6 components) and hardening forces h:
///
/// ```text
/// σ = K (ε - εᵖ)       h = -H q
///
/// Δδ = f / (gσ·K·gσ + gh·H·gh)
///
/// εᵖ ← εᵖ + Δδ gσ      q ← q + Δδ gh      Δγ ← Δγ + Δδ
/// ```
///
/// where `g = ∂f/∂(σ,h)` and H is the block-diagonal hardening matrix
/// (isotropic 1×1 block first, then the kinematic N×N block).
pub struct ElastoPlasticRod {
    /// Elastic predictor (and strain history)
    pub elastic: LinearElasticRod,

    surface: YieldSurface,
    hh: Matrix,
    n_hard: usize,
    hard_names: Vec<String>,
    max_iter: usize,
    precision: f64,
    plastic_strain: HistoryArray,
    hardening: HistoryArray,
    delta_gamma: IpScalars,
    dissipated: IpScalars,
    hardening_potential: IpScalars,
}

impl ElastoPlasticRod {
    /// Allocates a new instance
    ///
    /// # Input
    ///
    /// * `rod` -- parameters of the elastic part
    /// * `plastic` -- parameters of the plastic part
    /// * `name` -- identifies the instance in error messages
    /// * `n_element` -- number of elements of the rod model
    /// * `n_ip` -- number of integration points per element
    /// * `dofs` -- DOF names labelling the yield function arguments
    /// * `registry` -- the registered yield functions and derivatives
    pub fn new(
        rod: &ParamRod,
        plastic: &ParamPlastic,
        name: &str,
        n_element: usize,
        n_ip: usize,
        dofs: &DofCatalog,
        registry: &FunctionRegistry,
    ) -> RodResult<Self> {
        let elastic = LinearElasticRod::new(rod, name, n_element, n_ip)?;
        let context = format!("material '{}'", name);
        let ndof = dofs.ndof();

        // hardening matrix
        let iso = match plastic.isotropic_coefficient {
            None => None,
            Some(c) if c > 0.0 => Some(c),
            Some(c) => {
                return Err(Error::config(
                    &context,
                    format!("isotropicCoefficient = {} must be positive", c),
                ))
            }
        };
        let kin = match &plastic.kinematic_tensor {
            None => None,
            Some(values) => {
                let mut kin = Matrix::new(ndof, ndof);
                if values.len() == 1 {
                    for i in 0..ndof {
                        kin.set(i, i, values[0]);
                    }
                } else if values.len() == ndof {
                    for i in 0..ndof {
                        kin.set(i, i, values[i]);
                    }
                } else if values.len() == ndof * ndof {
                    for i in 0..ndof {
                        for j in 0..ndof {
                            kin.set(i, j, values[i * ndof + j]);
                        }
                    }
                } else {
                    return Err(Error::config(
                        &context,
                        format!(
                            "kinematicTensor requires 1, {} or {} values; got {}",
                            ndof,
                            ndof * ndof,
                            values.len()
                        ),
                    ));
                }
                Some(kin)
            }
        };
        let n_iso = if iso.is_some() { 1 } else { 0 };
        let n_hard = n_iso + if kin.is_some() { ndof } else { 0 };
        let mut hh = Matrix::new(n_hard, n_hard);
        if let Some(c) = iso {
            hh.set(0, 0, c);
        }
        if let Some(kin) = &kin {
            for i in 0..ndof {
                for j in 0..ndof {
                    hh.set(n_iso + i, n_iso + j, kin.get(i, j));
                }
            }
        }

        // yield surface
        if plastic.max_iter == 0 {
            return Err(Error::config(&context, "max_iter must be positive"));
        }
        if !(plastic.precision > 0.0) {
            return Err(Error::config(
                &context,
                format!("precision = {} must be positive", plastic.precision),
            ));
        }
        let args = dofs.yield_arg_names(iso.is_some(), kin.is_some());
        let surface = YieldSurface::new(plastic, registry, &args, N_STRAIN, &context)?;

        Ok(ElastoPlasticRod {
            elastic,
            surface,
            hh,
            n_hard,
            hard_names: args[N_STRAIN..].to_vec(),
            max_iter: plastic.max_iter,
            precision: plastic.precision,
            plastic_strain: HistoryArray::new(N_STRAIN, n_ip, n_element),
            hardening: HistoryArray::new(n_hard, n_ip, n_element),
            delta_gamma: IpScalars::new(n_ip, n_element),
            dissipated: IpScalars::new(n_ip, n_element),
            hardening_potential: IpScalars::new(n_ip, n_element),
        })
    }

    /// Returns the number of hardening parameters (0, 1, N, or N+1)
    pub fn n_hard(&self) -> usize {
        self.n_hard
    }

    /// Returns the names of the hardening parameters
    pub fn hardening_names(&self) -> &[String] {
        &self.hard_names
    }

    /// Returns the hardening matrix H
    pub fn hardening_matrix(&self) -> &Matrix {
        &self.hh
    }

    /// Returns the plastic strain history
    pub fn plastic_strains(&self) -> &HistoryArray {
        &self.plastic_strain
    }

    /// Returns the hardening parameter history
    pub fn hardening_params(&self) -> &HistoryArray {
        &self.hardening
    }

    /// Returns the plastic multiplier increment Δγ of the current step
    pub fn delta_gamma(&self, idx: IpIndex) -> f64 {
        self.delta_gamma.get(idx)
    }

    /// Returns the accumulated dissipated energy (per unit length)
    pub fn dissipated(&self, idx: IpIndex) -> f64 {
        self.dissipated.get(idx)
    }

    /// Returns the hardening potential (per unit length) of the last committed state
    pub fn hardening_potential(&self, idx: IpIndex) -> f64 {
        self.hardening_potential.get(idx)
    }

    /// Calculates σ = K (ε - εᵖ) and h = -H q into the yield-function arguments
    fn calc_args(&self, x: &mut [f64], kk: &Matrix, strain: &Vector, eps_p: &[f64], q: &[f64]) {
        for i in 0..N_STRAIN {
            x[i] = 0.0;
            for j in 0..N_STRAIN {
                x[i] += kk.get(i, j) * (strain[j] - eps_p[j]);
            }
        }
        for i in 0..self.n_hard {
            x[N_STRAIN + i] = 0.0;
            for j in 0..self.n_hard {
                x[N_STRAIN + i] -= self.hh.get(i, j) * q[j];
            }
        }
    }

    /// Calculates the stress and updates the trial state of an integration point
    ///
    /// The return mapping is skipped (Δγ = 0) if `inelastic` is false, if the
    /// element lies in the stiffened edge zone, or if the elastic predictor
    /// satisfies f < precision.
    pub fn update_stress(&mut self, strain: &Vector, idx: IpIndex, inelastic: bool) -> RodResult<Vector> {
        let kk = self.elastic.stiffness_at(idx.element).clone();
        let mut eps_p = self.plastic_strain.old(idx).to_vec();
        let mut q = self.hardening.old(idx).to_vec();
        let n_args = N_STRAIN + self.n_hard;
        let mut x = vec![0.0; n_args];
        let mut g = vec![0.0; n_args];
        self.calc_args(&mut x, &kk, strain, &eps_p, &q);
        let mut f = self.surface.value(&x);
        let mut dgamma = 0.0;
        if inelastic && !self.elastic.is_edge(idx.element) {
            let mut iteration = 0;
            while f >= self.precision {
                if iteration == self.max_iter {
                    return Err(Error::NoConvergence {
                        element: idx.element,
                        ip: idx.ip,
                        max_iter: self.max_iter,
                        yield_value: f,
                    });
                }
                self.surface.gradient(&mut g, &x)?;
                let mut denominator = 0.0;
                for i in 0..N_STRAIN {
                    for j in 0..N_STRAIN {
                        denominator += g[i] * kk.get(i, j) * g[j];
                    }
                }
                for i in 0..self.n_hard {
                    for j in 0..self.n_hard {
                        denominator += g[N_STRAIN + i] * self.hh.get(i, j) * g[N_STRAIN + j];
                    }
                }
                if !(denominator > 0.0) {
                    return Err(Error::Numerical("return mapping has a vanishing flow direction"));
                }
                let ddelta = f / denominator;
                for i in 0..N_STRAIN {
                    eps_p[i] += ddelta * g[i];
                }
                for i in 0..self.n_hard {
                    q[i] += ddelta * g[N_STRAIN + i];
                }
                dgamma += ddelta;
                self.calc_args(&mut x, &kk, strain, &eps_p, &q);
                f = self.surface.value(&x);
                iteration += 1;
            }
        }
        self.elastic.strains_mut().set_current(idx, strain.as_data());
        self.plastic_strain.set_current(idx, &eps_p);
        self.hardening.set_current(idx, &q);
        self.delta_gamma.set(idx, dgamma);
        let mut eps_e = Vector::new(N_STRAIN);
        for i in 0..N_STRAIN {
            eps_e[i] = strain[i] - eps_p[i];
        }
        self.elastic.stress_at(&eps_e, idx.element)
    }

    /// Commits the trial state and updates the energies
    ///
    /// ```text
    /// εᵉ = ε - εᵖ      potential = ½ εᵉ·σ      hardening potential = ½ q·(H q)
    /// dissipated += ½ (σ_old + σ_new)·(εᵖ_new - εᵖ_old)      (if Δγ ≠ 0)
    /// ```
    pub fn apply_deform(&mut self) -> RodResult<()> {
        let n_element = self.plastic_strain.n_element();
        let n_ip = self.plastic_strain.n_ip();
        for element in 0..n_element {
            for ip in 0..n_ip {
                let idx = IpIndex::new(element, ip);
                let strains = self.elastic.strains();
                let mut eps_e_old = Vector::new(N_STRAIN);
                let mut eps_e_new = Vector::new(N_STRAIN);
                let mut deps_p = Vector::new(N_STRAIN);
                for i in 0..N_STRAIN {
                    eps_e_old[i] = strains.old(idx)[i] - self.plastic_strain.old(idx)[i];
                    eps_e_new[i] = strains.current(idx)[i] - self.plastic_strain.current(idx)[i];
                    deps_p[i] = self.plastic_strain.current(idx)[i] - self.plastic_strain.old(idx)[i];
                }
                let sig_old = self.elastic.stress_at(&eps_e_old, element)?;
                let sig_new = self.elastic.stress_at(&eps_e_new, element)?;

                let q = self.hardening.current(idx);
                let mut hard = 0.0;
                for i in 0..self.n_hard {
                    for j in 0..self.n_hard {
                        hard += q[i] * self.hh.get(i, j) * q[j];
                    }
                }
                self.hardening_potential.set(idx, 0.5 * hard);

                let potential: f64 = (0..N_STRAIN).map(|i| eps_e_new[i] * sig_new[i]).sum();
                self.elastic.set_potential(idx, 0.5 * potential);

                let dgamma = self.delta_gamma.get(idx);
                if dgamma != 0.0 {
                    if dgamma < 0.0 {
                        warn!(
                            material = self.elastic.name.as_str(),
                            element,
                            ip,
                            dgamma,
                            "negative plastic multiplier increment"
                        );
                    }
                    let work: f64 = (0..N_STRAIN).map(|i| 0.5 * (sig_old[i] + sig_new[i]) * deps_p[i]).sum();
                    self.dissipated.add(idx, work);
                }
            }
        }
        self.elastic.commit();
        self.plastic_strain.commit();
        self.hardening.commit();
        self.delta_gamma.reset();
        Ok(())
    }

    /// Discards the trial state
    pub fn reject_deform(&mut self) {
        self.elastic.reject_deform();
        self.plastic_strain.reject();
        self.hardening.reject();
        self.delta_gamma.reset();
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::ElastoPlasticRod;
    use crate::base::{DofCatalog, Error, ParamPlastic, SampleParams};
    use crate::material::{FunctionRegistry, IpIndex, LinearElasticRod, ScalarFunction};
    use russell_lab::{approx_eq, Vector};

    const YIELD: f64 = 1.0;

    // f = |n₂| - Y - h_iso (h_iso only present with isotropic hardening)
    fn registry() -> FunctionRegistry {
        let dofs = DofCatalog::default();
        let mut registry = FunctionRegistry::new();
        let plain = dofs.yield_arg_names(false, false);
        let plain: Vec<&str> = plain.iter().map(|s| s.as_str()).collect();
        let iso = dofs.yield_arg_names(true, false);
        let iso: Vec<&str> = iso.iter().map(|s| s.as_str()).collect();
        let kin = dofs.yield_arg_names(false, true);
        let kin: Vec<&str> = kin.iter().map(|s| s.as_str()).collect();
        registry.register("axial", ScalarFunction::new(&plain, |x| f64::abs(x[2]) - YIELD));
        registry.register("axial_iso", ScalarFunction::new(&iso, |x| f64::abs(x[2]) - YIELD - x[6]));
        // back stress on the axial component: f = |n₂ - b₂| - Y with b = -h
        registry.register("axial_kin", ScalarFunction::new(&kin, |x| f64::abs(x[2] + x[8]) - YIELD));
        for i in 0..6 {
            let name = format!("daxial_{}", i);
            registry.register(
                &name,
                ScalarFunction::new(&plain, move |x| if i == 2 { f64::signum(x[2]) } else { 0.0 }),
            );
        }
        registry
    }

    fn plastic(yield_cond: &str, iso: Option<f64>, kin: Option<Vec<f64>>, max_iter: usize) -> ParamPlastic {
        let mut p = SampleParams::param_plastic(yield_cond, iso, kin);
        p.max_iter = max_iter;
        p
    }

    fn axial(eps: f64) -> Vector {
        Vector::from(&[0.0, 0.0, eps, 0.0, 0.0, 0.0])
    }

    #[test]
    fn one_step_return_works() {
        let rod = SampleParams::param_unit_section(); // EA = 1000
        let registry = registry();
        let dofs = DofCatalog::default();
        let idx = IpIndex::new(0, 0);
        let mut analytical = plastic("axial", None, None, 1);
        analytical.yield_deriv = Some((0..6).map(|i| format!("daxial_{}", i)).collect());
        for p in [plastic("axial", None, None, 1), analytical] {
            let mut m = ElastoPlasticRod::new(&rod, &p, "steel", 1, 1, &dofs, &registry).unwrap();
            // trial stress = 2Y
            let sig = m.update_stress(&axial(2e-3), idx, true).unwrap();
            approx_eq(sig[2], YIELD, 1e-10);
            approx_eq(m.plastic_strains().current(idx)[2], YIELD / 1000.0, 1e-13);
            approx_eq(m.delta_gamma(idx), YIELD / 1000.0, 1e-13);
            for i in [0, 1, 3, 4, 5] {
                assert_eq!(sig[i], 0.0);
                assert_eq!(m.plastic_strains().current(idx)[i], 0.0);
            }
        }
    }

    #[test]
    fn elastic_regime_matches_elastic_model() {
        let rod = SampleParams::param_unit_section();
        let registry = registry();
        let dofs = DofCatalog::default();
        let p = plastic("axial", None, None, 20);
        let mut m = ElastoPlasticRod::new(&rod, &p, "steel", 1, 1, &dofs, &registry).unwrap();
        let e = LinearElasticRod::new(&rod, "steel", 1, 1).unwrap();
        let eps = Vector::from(&[1e-4, -2e-4, 5e-4, 1e-3, -1e-3, 2e-3]);
        let sig = m.update_stress(&eps, IpIndex::new(0, 0), true).unwrap();
        let correct = e.stress(&eps).unwrap();
        assert_eq!(sig.as_data(), correct.as_data());
        assert_eq!(m.delta_gamma(IpIndex::new(0, 0)), 0.0);
    }

    #[test]
    fn isotropic_hardening_works() {
        let rod = SampleParams::param_unit_section();
        let registry = registry();
        let dofs = DofCatalog::default();
        let (k, hh, eps) = (1000.0, 250.0, 3e-3);
        let p = plastic("axial_iso", Some(hh), None, 20);
        let mut m = ElastoPlasticRod::new(&rod, &p, "steel", 1, 1, &dofs, &registry).unwrap();
        assert_eq!(m.n_hard(), 1);
        assert_eq!(m.hardening_names(), &["h_iso"]);
        let idx = IpIndex::new(0, 0);
        let sig = m.update_stress(&axial(eps), idx, true).unwrap();
        let ddelta = (k * eps - YIELD) / (k + hh);
        approx_eq(sig[2], k * eps - k * ddelta, 1e-8);
        approx_eq(m.hardening_params().current(idx)[0], -ddelta, 1e-10);

        // energies after commit
        m.apply_deform().unwrap();
        let q = -ddelta;
        approx_eq(m.hardening_potential(idx), 0.5 * hh * q * q, 1e-12);
        let sig_new = k * (eps - ddelta);
        approx_eq(m.elastic.potential(idx), 0.5 * (eps - ddelta) * sig_new, 1e-12);
        // old stress was zero: dissipated = ½ σ_new Δεᵖ
        approx_eq(m.dissipated(idx), 0.5 * sig_new * ddelta, 1e-12);
        assert_eq!(m.delta_gamma(idx), 0.0);
    }

    #[test]
    fn kinematic_hardening_works() {
        let rod = SampleParams::param_unit_section();
        let registry = registry();
        let dofs = DofCatalog::default();
        let (k, c, eps) = (1000.0, 500.0, 3e-3);
        let p = plastic("axial_kin", None, Some(vec![c]), 20);
        let mut m = ElastoPlasticRod::new(&rod, &p, "steel", 1, 1, &dofs, &registry).unwrap();
        assert_eq!(m.n_hard(), 6);
        assert_eq!(m.hardening_matrix().get(2, 2), c);
        let idx = IpIndex::new(0, 0);
        let sig = m.update_stress(&axial(eps), idx, true).unwrap();
        let ddelta = (k * eps - YIELD) / (k + c);
        approx_eq(sig[2], k * eps - k * ddelta, 1e-8);
        approx_eq(m.hardening_params().current(idx)[2], ddelta, 1e-10);
    }

    #[test]
    fn dissipation_accumulates_and_reject_restores() {
        let rod = SampleParams::param_unit_section();
        let registry = registry();
        let dofs = DofCatalog::default();
        let p = plastic("axial", None, None, 20);
        let mut m = ElastoPlasticRod::new(&rod, &p, "steel", 1, 2, &dofs, &registry).unwrap();
        let idx = IpIndex::new(0, 1);
        let mut previous = 0.0;
        for step in 1..5 {
            m.update_stress(&axial(1e-3 * (step as f64)), idx, true).unwrap();
            m.apply_deform().unwrap();
            let dissipated = m.dissipated(idx);
            assert!(dissipated >= previous);
            previous = dissipated;
        }
        // perfectly plastic: dissipated = Y · εᵖ (after the first yield step the stress stays at Y)
        let eps_p = m.plastic_strains().old(idx)[2];
        approx_eq(eps_p, 3e-3, 1e-12);
        approx_eq(previous, YIELD * eps_p, 1e-12);

        // trial step rejected
        m.update_stress(&axial(1e-2), idx, true).unwrap();
        m.reject_deform();
        approx_eq(m.plastic_strains().current(idx)[2], 3e-3, 1e-12);
        assert_eq!(m.delta_gamma(idx), 0.0);
    }

    #[test]
    fn skips_plasticity_when_requested_or_at_edges() {
        let mut rod = SampleParams::param_unit_section();
        rod.edge_factor = Some(1.0);
        rod.edge_elements = 1;
        let registry = registry();
        let dofs = DofCatalog::default();
        let p = plastic("axial", None, None, 20);
        let mut m = ElastoPlasticRod::new(&rod, &p, "steel", 3, 1, &dofs, &registry).unwrap();
        let sig = m.update_stress(&axial(2e-3), IpIndex::new(1, 0), false).unwrap();
        approx_eq(sig[2], 2.0, 1e-15);
        let sig = m.update_stress(&axial(2e-3), IpIndex::new(0, 0), true).unwrap();
        approx_eq(sig[2], 2.0, 1e-15);
        let sig = m.update_stress(&axial(2e-3), IpIndex::new(1, 0), true).unwrap();
        approx_eq(sig[2], 1.0, 1e-10);
    }

    #[test]
    fn no_convergence_is_reported() {
        let rod = SampleParams::param_unit_section();
        let dofs = DofCatalog::default();
        let mut registry = FunctionRegistry::new();
        let names = dofs.yield_arg_names(false, false);
        let names: Vec<&str> = names.iter().map(|s| s.as_str()).collect();
        // nonlinear surface: the cutting plane needs several iterations
        registry.register("cubic", ScalarFunction::new(&names, |x| x[2] * x[2] * x[2] - 1.0));
        let p = plastic("cubic", None, None, 1);
        let mut m = ElastoPlasticRod::new(&rod, &p, "steel", 1, 1, &dofs, &registry).unwrap();
        let err = m.update_stress(&axial(3e-3), IpIndex::new(0, 0), true).err().unwrap();
        match err {
            Error::NoConvergence { max_iter, .. } => assert_eq!(max_iter, 1),
            _ => panic!("wrong error"),
        }

        let p = plastic("cubic", None, None, 50);
        let mut m = ElastoPlasticRod::new(&rod, &p, "steel", 1, 1, &dofs, &registry).unwrap();
        let sig = m.update_stress(&axial(3e-3), IpIndex::new(0, 0), true).unwrap();
        approx_eq(sig[2], 1.0, 1e-5);
    }

    #[test]
    fn new_captures_errors() {
        let rod = SampleParams::param_unit_section();
        let registry = registry();
        let dofs = DofCatalog::default();
        // yield function without h_iso but isotropic hardening requested
        let p = plastic("axial", Some(1.0), None, 20);
        assert!(ElastoPlasticRod::new(&rod, &p, "x", 1, 1, &dofs, &registry).is_err());
        let p = plastic("axial_kin", None, Some(vec![1.0, 2.0]), 20);
        assert!(ElastoPlasticRod::new(&rod, &p, "x", 1, 1, &dofs, &registry).is_err());
        let p = plastic("axial_iso", Some(-1.0), None, 20);
        assert!(ElastoPlasticRod::new(&rod, &p, "x", 1, 1, &dofs, &registry).is_err());
        let p = plastic("axial", None, None, 0);
        assert!(ElastoPlasticRod::new(&rod, &p, "x", 1, 1, &dofs, &registry).is_err());
    }
}
