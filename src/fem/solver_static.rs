use super::RodModel;
use crate::base::{Error, RodResult};
use russell_lab::{solve_lin_sys, vec_norm, Norm, Vector};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Holds the control parameters of the static load-stepping driver
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ControlStatic {
    /// Number of (equal) load increments
    #[serde(default = "default_n_step")]
    pub n_step: usize,

    /// Maximum number of Newton-Raphson iterations per increment
    #[serde(default = "default_n_max_iterations")]
    pub n_max_iterations: usize,

    /// Maximum number of increment cuts (halvings) before giving up
    #[serde(default = "default_n_max_cuts")]
    pub n_max_cuts: usize,

    /// Tolerance on the residual relative to the initial (or external force) norm
    #[serde(default = "default_tol_rr")]
    pub tol_rr: f64,

    /// Absolute tolerance on the residual
    #[serde(default = "default_tol_abs")]
    pub tol_abs: f64,
}

fn default_n_step() -> usize {
    10
}

fn default_n_max_iterations() -> usize {
    20
}

fn default_n_max_cuts() -> usize {
    5
}

fn default_tol_rr() -> f64 {
    1e-8
}

fn default_tol_abs() -> f64 {
    1e-10
}

impl Default for ControlStatic {
    fn default() -> Self {
        ControlStatic {
            n_step: default_n_step(),
            n_max_iterations: default_n_max_iterations(),
            n_max_cuts: default_n_max_cuts(),
            tol_rr: default_tol_rr(),
            tol_abs: default_tol_abs(),
        }
    }
}

impl ControlStatic {
    /// Validates the control parameters
    pub fn validate(&self) -> RodResult<()> {
        if self.n_step < 1 {
            return Err(Error::config("static control", "n_step must be ≥ 1"));
        }
        if self.n_max_iterations < 1 {
            return Err(Error::config("static control", "n_max_iterations must be ≥ 1"));
        }
        if !(self.tol_rr > 0.0) || !(self.tol_abs > 0.0) {
            return Err(Error::config("static control", "tolerances must be positive"));
        }
        Ok(())
    }
}

/// Holds the summary of a converged load increment
#[derive(Clone, Debug, Serialize)]
pub struct StepSummary {
    /// Load factor λ at the end of the increment
    pub load_factor: f64,

    /// Number of Newton-Raphson iterations
    pub iterations: usize,

    /// Final residual norm (max abs)
    pub norm_rr: f64,
}

/// Implements a Newton-Raphson load-stepping driver for static problems
///
/// The external force is applied proportionally, `λ f_ext` with λ ∈ (0, 1].
/// Each converged increment is committed with `apply_deform`; a failed one is
/// rolled back with `reject_deform` and retried with half the increment.
/// Prescribed equations keep their current displacement values.
pub struct SolverStatic {
    /// Holds the control parameters
    pub control: ControlStatic,
}

impl SolverStatic {
    /// Allocates a new instance
    pub fn new(control: ControlStatic) -> RodResult<Self> {
        control.validate()?;
        Ok(SolverStatic { control })
    }

    /// Solves the static equilibrium f_int(u) = f_ext
    ///
    /// # Input
    ///
    /// * `model` -- the rod model
    /// * `disp` -- (input/output) the displacement vector
    /// * `f_ext` -- the external force vector at λ = 1
    /// * `prescribed` -- tells whether an equation is prescribed or not
    pub fn solve(
        &self,
        model: &mut RodModel,
        disp: &mut Vector,
        f_ext: &Vector,
        prescribed: &[bool],
    ) -> RodResult<Vec<StepSummary>> {
        let neq = model.n_equation();
        if disp.dim() != neq || f_ext.dim() != neq || prescribed.len() != neq {
            return Err(Error::invalid_input(format!(
                "disp, f_ext, and prescribed must have length {}",
                neq
            )));
        }
        let mut summaries = Vec::new();
        let mut load_factor = 0.0;
        let mut increment = 1.0 / (self.control.n_step as f64);
        let mut n_cuts = 0;
        while load_factor < 1.0 {
            let target = if load_factor + increment > 1.0 - 1e-12 {
                1.0
            } else {
                load_factor + increment
            };
            let backup = disp.clone();
            match self.iterate(model, disp, f_ext, prescribed, target) {
                Ok((iterations, norm_rr)) => {
                    model.apply_deform()?;
                    load_factor = target;
                    info!(load_factor, iterations, norm_rr, "increment converged");
                    summaries.push(StepSummary {
                        load_factor,
                        iterations,
                        norm_rr,
                    });
                }
                Err(err) => {
                    model.reject_deform();
                    *disp = backup;
                    if n_cuts == self.control.n_max_cuts {
                        return Err(err);
                    }
                    n_cuts += 1;
                    increment *= 0.5;
                    warn!(load_factor = target, error = %err, "increment failed; cutting it in half");
                }
            }
        }
        Ok(summaries)
    }

    /// Runs the Newton-Raphson iterations of one increment
    ///
    /// Returns the number of iterations and the final residual norm.
    fn iterate(
        &self,
        model: &mut RodModel,
        disp: &mut Vector,
        f_ext: &Vector,
        prescribed: &[bool],
        load_factor: f64,
    ) -> RodResult<(usize, f64)> {
        let neq = model.n_equation();
        let norm_ext = load_factor * vec_norm(f_ext, Norm::Max);
        let mut norm_rr0 = 0.0;
        for iteration in 0..(self.control.n_max_iterations + 1) {
            let (f_int, mut kk) = model.assemble(disp, prescribed, true)?;
            let mut rr = Vector::new(neq);
            for i in 0..neq {
                if !prescribed[i] {
                    rr[i] = f_int[i] - load_factor * f_ext[i];
                }
            }

            // check convergence on residual
            let norm_rr = vec_norm(&rr, Norm::Max);
            if iteration == 0 {
                norm_rr0 = norm_rr;
            }
            debug!(iteration, norm_rr);
            if norm_rr < self.control.tol_abs || norm_rr < self.control.tol_rr * f64::max(norm_rr0, norm_ext) {
                return Ok((iteration, norm_rr));
            }
            if iteration == self.control.n_max_iterations {
                break;
            }

            // augment the Jacobian with the prescribed equations
            for i in 0..neq {
                if prescribed[i] {
                    kk.set(i, i, 1.0);
                }
            }

            // solve for -Δu (stored in rr) and update
            solve_lin_sys(&mut rr, &mut kk)?;
            for i in 0..neq {
                rr[i] = -rr[i];
            }
            model.update_displacement(disp, &rr)?;
        }
        Err(Error::Numerical("Newton-Raphson iterations did not converge"))
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
