//! Shift-invert subspace iteration for the eigenvalues of a sparse K matrix
//! nearest a target value.
//!
//! The shifted operator `K - σ I` is factorized once, then a block of
//! orthonormal vectors is repeatedly multiplied by its inverse and
//! re-orthonormalized. Each sweep finishes with a Rayleigh-Ritz projection
//! onto the block, and iteration stops when every wanted Ritz pair has a small
//! residual `‖K v - θ v‖`.

use itertools::Itertools;
use ndarray as nd;
use ndarray_linalg::{ Eig, FactorizeInto, QRInto, Solve };
use num_complex::Complex64 as C64;
use rand::{ rngs::StdRng, Rng, SeedableRng };
use crate::{
    diagnostics::{ self, trace_to },
    error::{ FloquetError, FloquetResult },
    kmatrix::{ CscMatrix, KMatrix },
    linalg::StateNorm,
};

/// Maximum number of inverse-multiply sweeps.
pub const MAX_SWEEPS: usize = 5000;

/// Residual tolerance relative to the largest matrix element.
pub const TOLERANCE: f64 = 1e-10;

const SEED: u64 = 10546;

/// Find the `wanted` eigenpairs of `k` whose eigenvalues lie nearest `shift`.
///
/// Eigenvectors are returned as unit-norm columns, ordered by increasing
/// distance of their eigenvalue from `shift`. At most `k.size()` pairs are
/// returned.
pub fn eigs_near(k: &CscMatrix, wanted: usize, shift: f64)
    -> FloquetResult<(nd::Array1<C64>, nd::Array2<C64>)>
{
    eigs_near_logged(k, wanted, shift, diagnostics::global())
}

/// Like [`eigs_near`], reporting the number of sweeps to `logger`.
pub fn eigs_near_logged(
    k: &CscMatrix,
    wanted: usize,
    shift: f64,
    logger: &dyn log::Log,
) -> FloquetResult<(nd::Array1<C64>, nd::Array2<C64>)>
{
    let n = k.size();
    let wanted = wanted.min(n);
    if wanted == 0 {
        return Ok((nd::Array1::zeros(0), nd::Array2::zeros((n, 0))));
    }
    let width = (2 * wanted).min(n);

    let mut shifted = k.to_dense();
    shifted.diag_mut().mapv_inplace(|d| d - shift);
    let lu = shifted.factorize_into()?;

    let mut rng = StdRng::seed_from_u64(SEED);
    let start: nd::Array2<C64>
        = nd::Array2::from_shape_simple_fn(
            (n, width),
            || C64::new(rng.gen::<f64>() - 0.5, rng.gen::<f64>() - 0.5),
        );
    let (mut q, _) = start.qr_into()?;

    let tolerance = TOLERANCE * k.max_abs().max(1.0);
    let mut z: nd::Array2<C64> = nd::Array2::zeros((n, width));
    let mut residual = f64::INFINITY;
    for sweep in 1..=MAX_SWEEPS {
        for (qj, mut zj) in q.axis_iter(nd::Axis(1)).zip(z.axis_iter_mut(nd::Axis(1))) {
            zj.assign(&lu.solve(&qj)?);
        }
        q = z.clone().qr_into()?.0;

        // Rayleigh-Ritz
        let kq = k.dot_mat(&q);
        let projected = q.t().mapv(|x| x.conj()).dot(&kq);
        let (theta, y) = projected.eig()?;
        let order: Vec<usize>
            = (0..theta.len())
            .sorted_by(|&a, &b| {
                (theta[a] - shift).norm().total_cmp(&(theta[b] - shift).norm())
            })
            .take(wanted)
            .collect();
        let values: nd::Array1<C64> = order.iter().map(|&j| theta[j]).collect();
        let y = y.select(nd::Axis(1), &order);
        let vectors = q.dot(&y);
        let residuals = kq.dot(&y) - &vectors * &values;
        residual
            = residuals.axis_iter(nd::Axis(1))
            .map(|r| r.norm())
            .fold(0.0, f64::max);
        if residual <= tolerance {
            trace_to!(
                logger,
                "shift-invert converged after {} sweeps (residual {:e})",
                sweep, residual,
            );
            return Ok((values, vectors));
        }
    }
    Err(FloquetError::NoConvergence { iterations: MAX_SWEEPS, residual })
}

#[cfg(test)]
mod test {
    use approx::assert_abs_diff_eq;
    use crate::diagnostics::test::Capture;
    use super::*;

    fn c(re: f64) -> C64 { C64::new(re, 0.0) }

    // tridiagonal Hermitian matrix with a known spectrum
    fn laplacian(n: usize, diag: f64) -> CscMatrix {
        let triplets: Vec<(usize, usize, C64)>
            = (0..n).map(|i| (i, i, c(diag)))
            .chain((0..n - 1).map(|i| (i, i + 1, C64::new(0.0, -1.0))))
            .chain((0..n - 1).map(|i| (i + 1, i, C64::new(0.0, 1.0))))
            .collect();
        CscMatrix::from_triplets(n, n, triplets)
    }

    #[test]
    fn finds_nearest_eigenvalues() {
        let n = 40;
        let diag = 0.3;
        let K = laplacian(n, diag);
        let exact: Vec<f64>
            = (1..=n)
            .map(|j| {
                diag + 2.0 * (j as f64 * std::f64::consts::PI / (n + 1) as f64).cos()
            })
            .sorted_by(|a, b| a.abs().total_cmp(&b.abs()))
            .take(6)
            .collect();
        let capture = Capture::default();
        let (values, vectors) = eigs_near_logged(&K, 6, 0.0, &capture).unwrap();
        assert_eq!(values.len(), 6);
        assert_eq!(vectors.dim(), (n, 6));
        for (value, expected) in values.iter().zip(&exact) {
            assert!((value.re - expected).abs() < 1e-9);
            assert!(value.im.abs() < 1e-9);
        }
        let dense = K.to_dense();
        for (value, v) in values.iter().zip(vectors.axis_iter(nd::Axis(1))) {
            assert_abs_diff_eq!(dense.dot(&v), v.mapv(|x| x * value), epsilon = 1e-8);
            assert!((v.norm() - 1.0).abs() < 1e-10);
        }
        assert!(
            capture.messages().iter()
                .any(|(_, msg)| msg.starts_with("shift-invert converged"))
        );
    }

    #[test]
    fn whole_space() {
        let K = CscMatrix::from_dense(&nd::array![
            [c(2.0), c(1.0)],
            [c(1.0), c(2.0)],
        ]);
        let (values, _) = eigs_near(&K, 4, 0.0).unwrap();
        let mut re: Vec<f64> = values.iter().map(|v| v.re).collect();
        re.sort_by(f64::total_cmp);
        assert_eq!(re.len(), 2);
        assert!((re[0] - 1.0).abs() < 1e-12);
        assert!((re[1] - 3.0).abs() < 1e-12);
    }
}
