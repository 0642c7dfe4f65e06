//! Implements the SO(3) rotation algebra
//!
//! Rotations are stored as 3×3 orthonormal matrices (det = +1) and axial
//! (rotation) vectors are stored as 3-vectors. The exponential map follows
//! Rodrigues' formula and the logarithm follows the trace/axial-vector form,
//! switching to the symmetric part of R near the half-turn.

use super::{Error, RodResult};
use russell_lab::{mat_add, mat_mat_mul, mat_norm, mat_update, vec_add, vec_copy_scaled, vec_inner, vec_norm};
use russell_lab::{Matrix, Norm, Vector};
use std::f64::consts::PI;

/// Defines the threshold below which an angle (or relative residual) is treated as zero
pub const TINY: f64 = f64::EPSILON * 1e6;

/// Defines the distance to π below which log(R) recovers the axis from the symmetric part of R
pub const HALF_TURN_ZONE: f64 = 1e-2;

/// Computes the skew-symmetric matrix of a vector
///
/// ```text
///           ┌             ┐
///           │  0  -v2  v1 │
/// skew(v) = │  v2  0  -v0 │    such that    skew(v)·x = v × x
///           │ -v1  v0  0  │
///           └             ┘
/// ```
pub fn skew(v: &Vector) -> Matrix {
    Matrix::from(&[[0.0, -v[2], v[1]], [v[2], 0.0, -v[0]], [-v[1], v[0], 0.0]])
}

/// Extracts the axial vector of a skew-symmetric matrix
///
/// Returns an error if `m` is not antisymmetric with zero trace. The check
/// is relative to the Frobenius norm of `m`.
pub fn unskew(m: &Matrix) -> RodResult<Vector> {
    let tol = TINY * f64::max(mat_norm(m, Norm::Fro), f64::MIN_POSITIVE);
    let mut sym = Matrix::new(3, 3);
    mat_add(&mut sym, 1.0, m, 1.0, &m.transposed())?;
    let sym_norm = mat_norm(&sym, Norm::Fro);
    let tr = trace(m);
    if sym_norm > tol || f64::abs(tr) > tol {
        return Err(Error::invalid_input(format!(
            "matrix is not skew-symmetric (|M+Mᵀ| = {:e}, tr = {:e})",
            sym_norm, tr
        )));
    }
    Ok(Vector::from(&[
        0.5 * (m.get(2, 1) - m.get(1, 2)),
        0.5 * (m.get(0, 2) - m.get(2, 0)),
        0.5 * (m.get(1, 0) - m.get(0, 1)),
    ]))
}

/// Computes the rotation matrix R = exp(skew(v)) using Rodrigues' formula
///
/// ```text
/// R = cos(θ) I + sin(θ) K + (1 - cos(θ)) k ⊗ k    with    θ = ‖v‖,  k = v/θ,  K = skew(k)
/// ```
///
/// Returns `I + skew(v)` if θ < TINY.
pub fn exp_vec(v: &Vector) -> Matrix {
    let theta = vec_norm(v, Norm::Euc);
    if theta < TINY {
        let mut r = skew(v);
        for i in 0..3 {
            r.add(i, i, 1.0);
        }
        return r;
    }
    let k = [v[0] / theta, v[1] / theta, v[2] / theta];
    let (s, c) = (f64::sin(theta), f64::cos(theta));
    Matrix::from(&[
        [
            c + (1.0 - c) * k[0] * k[0],
            -s * k[2] + (1.0 - c) * k[0] * k[1],
            s * k[1] + (1.0 - c) * k[0] * k[2],
        ],
        [
            s * k[2] + (1.0 - c) * k[1] * k[0],
            c + (1.0 - c) * k[1] * k[1],
            -s * k[0] + (1.0 - c) * k[1] * k[2],
        ],
        [
            -s * k[1] + (1.0 - c) * k[2] * k[0],
            s * k[0] + (1.0 - c) * k[2] * k[1],
            c + (1.0 - c) * k[2] * k[2],
        ],
    ])
}

/// Computes the derivative of exp(skew(v)) along the direction `v_dot`
///
/// With θ̇ = v·v̇/θ, k = v/θ, and k̇ = (v̇θ - vθ̇)/θ²:
///
/// ```text
/// Ṙ = cos(θ) θ̇ K + sin(θ) K̇ + sin(θ) θ̇ K² + (1 - cos(θ)) (K̇K + KK̇)
/// ```
///
/// Returns `skew(v_dot)` if θ < TINY.
pub fn exp_vec_deriv(v: &Vector, v_dot: &Vector) -> RodResult<Matrix> {
    let theta = vec_norm(v, Norm::Euc);
    if theta < TINY {
        return Ok(skew(v_dot));
    }
    let theta_dot = vec_inner(v, v_dot) / theta;
    let mut unit = Vector::new(3);
    let mut unit_dot = Vector::new(3);
    vec_copy_scaled(&mut unit, 1.0 / theta, v)?;
    vec_add(&mut unit_dot, 1.0 / theta, v_dot, -theta_dot / (theta * theta), v)?;
    let k = skew(&unit);
    let kd = skew(&unit_dot);
    let mut kk = Matrix::new(3, 3);
    let mut kd_k_plus_k_kd = Matrix::new(3, 3);
    mat_mat_mul(&mut kk, 1.0, &k, &k, 0.0)?;
    mat_mat_mul(&mut kd_k_plus_k_kd, 1.0, &kd, &k, 0.0)?;
    mat_mat_mul(&mut kd_k_plus_k_kd, 1.0, &k, &kd, 1.0)?;
    let (s, c) = (f64::sin(theta), f64::cos(theta));
    let mut rd = Matrix::new(3, 3);
    mat_add(&mut rd, c * theta_dot, &k, s, &kd)?;
    mat_update(&mut rd, s * theta_dot, &kk)?;
    mat_update(&mut rd, 1.0 - c, &kd_k_plus_k_kd)?;
    Ok(rd)
}

/// Computes the rotation vector v = log(R) with ‖v‖ ∈ [0, π]
///
/// ```text
/// w = unskew(R - Rᵀ)/2 = sin(θ) n
/// θ = atan2(‖w‖, (tr(R) - 1)/2)
/// v = θ/‖w‖ · w
/// ```
///
/// Returns `w` if θ < TINY. If θ > π - HALF_TURN_ZONE, the axis n is
/// recovered from `R + Rᵀ - (tr(R) - 1) I = 2 (1 - cos θ) n ⊗ n` and its sign
/// from `w`; at θ = π either sign is returned.
pub fn log_mat(r: &Matrix) -> RodResult<Vector> {
    let mut a = Matrix::new(3, 3);
    mat_add(&mut a, 0.5, r, -0.5, &r.transposed())?;
    let w = unskew(&a)?;
    let sin = vec_norm(&w, Norm::Euc);
    let cos = 0.5 * (trace(r) - 1.0);
    if f64::abs(cos) > 1.0 + TINY {
        return Err(Error::invalid_input("matrix is not a rotation"));
    }
    let theta = f64::atan2(sin, cos);
    if theta < TINY {
        return Ok(w);
    }
    if theta > PI - HALF_TURN_ZONE {
        return log_half_turn(r, &w, cos, theta);
    }
    let mut v = Vector::new(3);
    vec_copy_scaled(&mut v, theta / sin, &w)?;
    Ok(v)
}

/// Computes log(R) near the half-turn, where R - Rᵀ carries no accurate axis
fn log_half_turn(r: &Matrix, w: &Vector, cos: f64, theta: f64) -> RodResult<Vector> {
    let mut b = Matrix::new(3, 3);
    mat_add(&mut b, 1.0, r, 1.0, &r.transposed())?;
    for i in 0..3 {
        b.add(i, i, -2.0 * cos);
    }
    let mut p = 0;
    for i in 1..3 {
        if b.get(i, i) > b.get(p, p) {
            p = i;
        }
    }
    if b.get(p, p) <= 0.0 {
        return Err(Error::invalid_input("matrix is not a rotation"));
    }
    let mut n = Vector::from(&[b.get(0, p), b.get(1, p), b.get(2, p)]);
    let len = vec_norm(&n, Norm::Euc);
    let sign = if vec_inner(&n, w) < 0.0 { -1.0 } else { 1.0 };
    n.scale(sign * theta / len);
    Ok(n)
}

/// Returns the trace of a 3×3 matrix
fn trace(a: &Matrix) -> f64 {
    a.get(0, 0) + a.get(1, 1) + a.get(2, 2)
}

/// Returns the cross product u × v
pub fn cross3(u: &Vector, v: &Vector) -> Vector {
    Vector::from(&[
        u[1] * v[2] - u[2] * v[1],
        u[2] * v[0] - u[0] * v[2],
        u[0] * v[1] - u[1] * v[0],
    ])
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use russell_lab::{approx_eq, mat_approx_eq, mat_t_mat_mul, mat_vec_mul, vec_approx_eq};

    fn random_vector(rng: &mut StdRng, max_norm: f64) -> Vector {
        loop {
            let v = Vector::from(&[
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
                rng.gen_range(-1.0..1.0),
            ]);
            let n = vec_norm(&v, Norm::Euc);
            if n > 1e-3 && n <= 1.0 {
                let len = rng.gen_range(0.0..max_norm);
                let mut u = Vector::new(3);
                vec_copy_scaled(&mut u, len / n, &v).unwrap();
                return u;
            }
        }
    }

    #[test]
    fn skew_works() {
        let v = Vector::from(&[1.0, 2.0, 3.0]);
        let x = Vector::from(&[-4.0, 0.5, 2.0]);
        let mut sx = Vector::new(3);
        mat_vec_mul(&mut sx, 1.0, &skew(&v), &x).unwrap();
        vec_approx_eq(&sx, &cross3(&v, &x), 1e-15);
    }

    #[test]
    fn unskew_works() {
        let mut rng = StdRng::seed_from_u64(1234);
        for _ in 0..100 {
            let v = random_vector(&mut rng, 10.0);
            let w = unskew(&skew(&v)).unwrap();
            vec_approx_eq(&w, &v, 1e-15);
        }
        let zero = unskew(&Matrix::new(3, 3)).unwrap();
        assert_eq!(zero.as_data(), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn unskew_captures_errors() {
        let m = Matrix::from(&[[0.0, -3.0, 2.0], [3.0, 0.0, -1.0], [-2.0, 1.5, 0.0]]);
        assert!(unskew(&m).is_err());
        let m = Matrix::from(&[[1.0, -3.0, 2.0], [3.0, 0.0, -1.0], [-2.0, 1.0, 0.0]]);
        assert!(unskew(&m).is_err());
    }

    #[test]
    fn exp_vec_works() {
        // rotation of 90° about z
        let v = Vector::from(&[0.0, 0.0, PI / 2.0]);
        let r = exp_vec(&v);
        let correct = Matrix::from(&[[0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]]);
        mat_approx_eq(&r, &correct, 1e-15);

        // tiny angle
        let v = Vector::from(&[1e-12, 0.0, 0.0]);
        let r = exp_vec(&v);
        approx_eq(r.get(2, 1), 1e-12, 1e-25);
        approx_eq(r.get(0, 0), 1.0, 1e-15);
    }

    #[test]
    fn exp_is_orthonormal() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let v = random_vector(&mut rng, 3.0);
            let r = exp_vec(&v);
            let mut rtr = Matrix::new(3, 3);
            mat_t_mat_mul(&mut rtr, 1.0, &r, &r, 0.0).unwrap();
            mat_approx_eq(&rtr, &Matrix::identity(3), 1e-14);
        }
    }

    #[test]
    fn log_exp_round_trip_works() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let v = random_vector(&mut rng, PI - 0.01);
            let w = log_mat(&exp_vec(&v)).unwrap();
            vec_approx_eq(&w, &v, 1e-10);
        }
    }

    #[test]
    fn exp_log_round_trip_works() {
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..1000 {
            // arbitrary rotations: composition of two exponentials
            let a = random_vector(&mut rng, 3.0);
            let b = random_vector(&mut rng, 3.0);
            let mut r = Matrix::new(3, 3);
            mat_mat_mul(&mut r, 1.0, &exp_vec(&a), &exp_vec(&b), 0.0).unwrap();
            let back = exp_vec(&log_mat(&r).unwrap());
            mat_approx_eq(&back, &r, 1e-10);
        }
    }

    #[test]
    fn log_handles_identity_and_half_turn() {
        let v = log_mat(&Matrix::identity(3)).unwrap();
        assert_eq!(vec_norm(&v, Norm::Euc), 0.0);

        let r = Matrix::from(&[[1.0, 0.0, 0.0], [0.0, -1.0, 0.0], [0.0, 0.0, -1.0]]);
        let v = log_mat(&r).unwrap();
        approx_eq(f64::abs(v[0]), PI, 1e-14);
        approx_eq(v[1], 0.0, 1e-14);
        approx_eq(v[2], 0.0, 1e-14);
    }

    #[test]
    fn log_is_accurate_near_the_half_turn() {
        // θ = π - 10⁻ᵏ about an oblique axis (and its opposite)
        for sign in [1.0, -1.0] {
            let axis = [sign * 0.48, sign * 0.6, sign * 0.64];
            for k in 2..10 {
                let theta = PI - f64::powi(10.0, -k);
                let v = Vector::from(&[theta * axis[0], theta * axis[1], theta * axis[2]]);
                let r = exp_vec(&v);
                let w = log_mat(&r).unwrap();
                vec_approx_eq(&w, &v, 1e-12);
                mat_approx_eq(&exp_vec(&w), &r, 1e-14);
            }
        }

        // exactly π: the sign of the axis is arbitrary
        let v = Vector::from(&[PI * 0.48, PI * 0.6, PI * 0.64]);
        let r = exp_vec(&v);
        let w = log_mat(&r).unwrap();
        approx_eq(vec_norm(&w, Norm::Euc), PI, 1e-14);
        approx_eq(f64::abs(vec_inner(&w, &v)), PI * PI, 1e-12);
        mat_approx_eq(&exp_vec(&w), &r, 1e-14);
    }

    #[test]
    fn log_captures_errors() {
        let m = Matrix::from(&[[-1.0, 0.0, 0.0], [0.0, -1.0, 0.0], [0.0, 0.0, -1.0]]);
        assert_eq!(log_mat(&m).err().unwrap().to_string(), "invalid input: matrix is not a rotation");
    }

    #[test]
    fn exp_vec_deriv_works() {
        let mut rng = StdRng::seed_from_u64(5);
        let h = 1e-6;
        for _ in 0..20 {
            let v = random_vector(&mut rng, 2.5);
            let vd = random_vector(&mut rng, 1.0);
            let rd = exp_vec_deriv(&v, &vd).unwrap();
            let mut vp = Vector::new(3);
            let mut vm = Vector::new(3);
            vec_add(&mut vp, 1.0, &v, h, &vd).unwrap();
            vec_add(&mut vm, 1.0, &v, -h, &vd).unwrap();
            let mut num = Matrix::new(3, 3);
            mat_add(&mut num, 0.5 / h, &exp_vec(&vp), -0.5 / h, &exp_vec(&vm)).unwrap();
            mat_approx_eq(&rd, &num, 1e-7);
        }
        // tiny angle
        let vd = Vector::from(&[0.1, 0.2, 0.3]);
        let rd = exp_vec_deriv(&Vector::new(3), &vd).unwrap();
        mat_approx_eq(&rd, &skew(&vd), 1e-15);
    }
}
