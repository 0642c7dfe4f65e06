use crate::base::rotation::{exp_vec, exp_vec_deriv, log_mat, skew, TINY};
use crate::base::{Error, RodResult};
use gemlab::integ;
use gemlab::shapes::{GeoClass, GeoKind, Scratchpad};
use russell_lab::{mat_mat_mul, mat_t_mat_mul, Matrix, Vector};

/// Returns the positions of the gemlab nodes of a line cell when walking along the line
///
/// ```text
/// Lin2:   0-----------1           ->  [0, 1]
/// Lin3:   0-----2-----1           ->  [0, 2, 1]
/// Lin4:   0---2---3---1           ->  [0, 2, 3, 1]
/// ```
pub fn sequential_order(kind: GeoKind) -> Option<&'static [usize]> {
    match kind {
        GeoKind::Lin2 => Some(&[0, 1]),
        GeoKind::Lin3 => Some(&[0, 2, 1]),
        GeoKind::Lin4 => Some(&[0, 2, 3, 1]),
        _ => None,
    }
}

/// Implements the shape field of a line element embedded in 3D
///
/// The shape functions and the Gauss-Legendre points come from gemlab; the
/// nodes are renumbered sequentially along the line (see [sequential_order]).
///
/// Gradients and integration weights refer to the arclength s of the
/// reference configuration, accumulated from node-to-node distances.
///
/// Rotations are interpolated following Crisfield and Jelenic (1999): nodal
/// rotations are expressed relative to a reference rotation Λr computed from
/// the nodes nearest the middle of the element; the relative rotation vectors
/// are interpolated with the shape functions and mapped back with exp.
pub struct RodShape {
    nnode: usize,
    ip_weights: Vec<f64>,
    nn: Matrix,
    dnn_dxi: Matrix,
}

impl RodShape {
    /// Allocates a new instance
    ///
    /// # Input
    ///
    /// * `kind` -- Lin2, Lin3, or Lin4
    /// * `n_ip` -- number of integration points (1 to 5)
    pub fn new(kind: GeoKind, n_ip: usize) -> RodResult<Self> {
        let order = sequential_order(kind).ok_or_else(|| {
            Error::invalid_input(format!("rod elements must be Lin2, Lin3, or Lin4; got {:?}", kind))
        })?;
        let ips = integ::points(GeoClass::Lin, n_ip)?;
        let mut pad = Scratchpad::new(3, kind)?;
        let nnode = order.len();
        let mut nn = Matrix::new(nnode, n_ip);
        let mut dnn_dxi = Matrix::new(nnode, n_ip);
        for (p, ip) in ips.iter().enumerate() {
            (pad.fn_interp)(&mut pad.interp, &ip[0..1]);
            (pad.fn_deriv)(&mut pad.deriv, &ip[0..1]);
            for (i, m) in order.iter().enumerate() {
                nn.set(i, p, pad.interp[*m]);
                dnn_dxi.set(i, p, pad.deriv.get(*m, 0));
            }
        }
        Ok(RodShape {
            nnode,
            ip_weights: ips.iter().map(|ip| ip[3]).collect(),
            nn,
            dnn_dxi,
        })
    }

    /// Returns the number of nodes
    pub fn nnode(&self) -> usize {
        self.nnode
    }

    /// Returns the number of integration points
    pub fn n_ip(&self) -> usize {
        self.ip_weights.len()
    }

    /// Returns the shape functions N (nnode, n_ip)
    pub fn shape_functions(&self) -> &Matrix {
        &self.nn
    }

    /// Returns the accumulated arclength of the nodes
    pub fn arclength(&self, node_coords: &[Vector]) -> Vec<f64> {
        let mut s = vec![0.0; self.nnode];
        for i in 1..self.nnode {
            let mut d2 = 0.0;
            for k in 0..3 {
                let d = node_coords[i][k] - node_coords[i - 1][k];
                d2 += d * d;
            }
            s[i] = s[i - 1] + f64::sqrt(d2);
        }
        s
    }

    /// Calculates the shape function gradients dN/ds (nnode, n_ip) and the integration weights
    ///
    /// The weights are `w ds/dξ`. A vanishing Jacobian ds/dξ yields zero
    /// gradients and a zero weight at that integration point.
    pub fn gradients(&self, node_coords: &[Vector]) -> (Matrix, Vec<f64>) {
        let s = self.arclength(node_coords);
        let n_ip = self.n_ip();
        let mut dnn_ds = Matrix::new(self.nnode, n_ip);
        let mut weights = vec![0.0; n_ip];
        for ip in 0..n_ip {
            let mut jac = 0.0;
            for i in 0..self.nnode {
                jac += self.dnn_dxi.get(i, ip) * s[i];
            }
            if f64::abs(jac) < TINY {
                continue;
            }
            for i in 0..self.nnode {
                dnn_ds.set(i, ip, self.dnn_dxi.get(i, ip) / jac);
            }
            weights[ip] = self.ip_weights[ip] * jac;
        }
        (dnn_ds, weights)
    }

    /// Interpolates nodal vectors at the integration points
    pub fn interpolate(&self, node_values: &[Vector], nn: &Matrix) -> Vec<Vector> {
        (0..nn.dims().1)
            .map(|ip| {
                let mut v = Vector::new(3);
                for i in 0..self.nnode {
                    for k in 0..3 {
                        v[k] += nn.get(i, ip) * node_values[i][k];
                    }
                }
                v
            })
            .collect()
    }

    /// Returns the global coordinates of the integration points
    pub fn global_points(&self, node_coords: &[Vector]) -> Vec<Vector> {
        self.interpolate(node_coords, &self.nn)
    }

    /// Computes the reference rotation Λr = R_I exp(½ log(R_Iᵀ R_J))
    ///
    /// I = ⌊(nnode-1)/2⌋ and J = ⌊nnode/2⌋ are the nodes nearest the middle.
    pub fn reference_rotation(&self, node_rotations: &[Matrix]) -> RodResult<Matrix> {
        let ii = (self.nnode - 1) / 2;
        let jj = self.nnode / 2;
        let mut rel = Matrix::new(3, 3);
        mat_t_mat_mul(&mut rel, 1.0, &node_rotations[ii], &node_rotations[jj], 0.0)?;
        let mut psi = log_mat(&rel)?;
        psi.scale(0.5);
        let mut lambda_r = Matrix::new(3, 3);
        mat_mat_mul(&mut lambda_r, 1.0, &node_rotations[ii], &exp_vec(&psi), 0.0)?;
        Ok(lambda_r)
    }

    /// Computes the local rotation vectors ψᵢ = log(Λrᵀ Rᵢ)
    fn local_rotation_vectors(&self, lambda_r: &Matrix, node_rotations: &[Matrix]) -> RodResult<Vec<Vector>> {
        let mut rel = Matrix::new(3, 3);
        node_rotations
            .iter()
            .map(|r| -> RodResult<Vector> {
                mat_t_mat_mul(&mut rel, 1.0, lambda_r, r, 0.0)?;
                log_mat(&rel)
            })
            .collect()
    }

    /// Interpolates the rotations at the integration points: Λ = Λr exp(Σ Nᵢ ψᵢ)
    pub fn rotations(&self, node_rotations: &[Matrix]) -> RodResult<Vec<Matrix>> {
        let lambda_r = self.reference_rotation(node_rotations)?;
        let psi = self.local_rotation_vectors(&lambda_r, node_rotations)?;
        let psi_ip = self.interpolate(&psi, &self.nn);
        psi_ip
            .iter()
            .map(|p| -> RodResult<Matrix> {
                let mut lambda = Matrix::new(3, 3);
                mat_mat_mul(&mut lambda, 1.0, &lambda_r, &exp_vec(p), 0.0)?;
                Ok(lambda)
            })
            .collect()
    }

    /// Interpolates the rotation gradients: Λ' = Λr dexp(Σ Nᵢ ψᵢ, Σ Nᵢ' ψᵢ)
    pub fn rotation_gradients(&self, node_rotations: &[Matrix], dnn_ds: &Matrix) -> RodResult<Vec<Matrix>> {
        let lambda_r = self.reference_rotation(node_rotations)?;
        let psi = self.local_rotation_vectors(&lambda_r, node_rotations)?;
        let psi_ip = self.interpolate(&psi, &self.nn);
        let dpsi_ip = self.interpolate(&psi, dnn_ds);
        psi_ip
            .iter()
            .zip(&dpsi_ip)
            .map(|(p, dp)| -> RodResult<Matrix> {
                let mut dlambda = Matrix::new(3, 3);
                mat_mat_mul(&mut dlambda, 1.0, &lambda_r, &exp_vec_deriv(p, dp)?, 0.0)?;
                Ok(dlambda)
            })
            .collect()
    }

    /// Computes the strain-displacement operator Ξ (6×6) of a node at an integration point
    ///
    /// ```text
    ///     ┌                    ┐
    /// Ξ = │  N' I       0      │
    ///     │ -N skew(φ')  N' I  │
    ///     └                    ┘
    /// ```
    pub fn xi_operator(n: f64, dn_ds: f64, dphi_ds: &Vector) -> Matrix {
        let mut xi = Matrix::new(6, 6);
        for i in 0..6 {
            xi.set(i, i, dn_ds);
        }
        let s = skew(dphi_ds);
        for i in 0..3 {
            for j in 0..3 {
                xi.set(3 + i, j, -n * s.get(i, j));
            }
        }
        xi
    }

    /// Computes the geometric operator Ψ (6×9) of a node at an integration point
    ///
    /// ```text
    ///     ┌                  ┐
    /// Ψ = │ N' I   0     0   │
    ///     │  0    N' I   N I │
    ///     └                  ┘
    /// ```
    pub fn psi_operator(n: f64, dn_ds: f64) -> Matrix {
        let mut psi = Matrix::new(6, 9);
        for i in 0..6 {
            psi.set(i, i, dn_ds);
        }
        for i in 0..3 {
            psi.set(3 + i, 6 + i, n);
        }
        psi
    }

    /// Computes the frame operator Π = diag(Λ, Λ) (6×6)
    pub fn pi_operator(lambda: &Matrix) -> Matrix {
        let mut pi = Matrix::new(6, 6);
        for i in 0..3 {
            for j in 0..3 {
                pi.set(i, j, lambda.get(i, j));
                pi.set(3 + i, 3 + j, lambda.get(i, j));
            }
        }
        pi
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
