//! Evaluation of the evolution operator `U(t)` and its time derivative from a
//! precomputed [`Eigensystem`].
//!
//! Nothing here is diagonalized: each evaluation sums the stored eigenvectors
//! over their Fourier modes with time-dependent weights.

use itertools::izip;
use ndarray as nd;
use num_complex::Complex64 as C64;
use crate::{
    eigensystem::Eigensystem,
    linalg::outer_into,
};

// sum each eigenvector's Fourier-mode blocks with the given weights; row `j`
// of the result belongs to quasienergy `j`
fn fourier_sum(k_eigenvectors: &nd::Array3<C64>, weights: &nd::Array1<C64>)
    -> nd::Array2<C64>
{
    let (n_states, _, dimension) = k_eigenvectors.dim();
    let mut out: nd::Array2<C64> = nd::Array2::zeros((n_states, dimension));
    for (mut out_j, v_j) in out.outer_iter_mut().zip(k_eigenvectors.outer_iter()) {
        for (&w, block) in weights.iter().zip(v_j.outer_iter()) {
            out_j.scaled_add(w, &block);
        }
    }
    out
}

/// Floquet kets at time `t`, one per row, in the order of the quasienergies.
pub fn current_floquet_kets(eigensystem: &Eigensystem, t: f64) -> nd::Array2<C64> {
    let weights = eigensystem.abstract_ket_coefficients.mapv(|a| (a * t).exp());
    fourier_sum(&eigensystem.k_eigenvectors, &weights)
}

/// Time derivatives of the Floquet kets at time `t`, one per row.
pub fn d_current_floquet_kets(eigensystem: &Eigensystem, t: f64)
    -> nd::Array2<C64>
{
    let weights = eigensystem.abstract_ket_coefficients.mapv(|a| a * (a * t).exp());
    fourier_sum(&eigensystem.k_eigenvectors, &weights)
}

/// Phase factors `exp(-i E t)` for each quasienergy.
pub(crate) fn energy_phases(eigensystem: &Eigensystem, t: f64) -> nd::Array1<C64> {
    eigensystem.quasienergies.mapv(|e| (-C64::i() * e * t).exp())
}

/// Compute the evolution operator `U(t)`.
pub fn u(eigensystem: &Eigensystem, t: f64) -> nd::Array2<C64> {
    let dimension = eigensystem.dimension();
    let kets = current_floquet_kets(eigensystem, t);
    let phases = energy_phases(eigensystem, t);
    let mut out: nd::Array2<C64> = nd::Array2::zeros((dimension, dimension));
    let mut projector: nd::Array2<C64> = nd::Array2::zeros((dimension, dimension));
    let iter
        = izip!(
            phases.iter(),
            kets.outer_iter(),
            eigensystem.initial_floquet_bras.outer_iter(),
        );
    for (&phase, ket, bra) in iter {
        outer_into(&mut projector, &ket, &bra);
        out.scaled_add(phase, &projector);
    }
    out
}

/// Compute the time derivative `dU/dt` of the evolution operator.
pub fn du_dt(eigensystem: &Eigensystem, t: f64) -> nd::Array2<C64> {
    let dimension = eigensystem.dimension();
    let kets = current_floquet_kets(eigensystem, t);
    let dkets = d_current_floquet_kets(eigensystem, t);
    let phases = energy_phases(eigensystem, t);
    let mut out: nd::Array2<C64> = nd::Array2::zeros((dimension, dimension));
    let mut projector: nd::Array2<C64> = nd::Array2::zeros((dimension, dimension));
    let iter
        = izip!(
            eigensystem.quasienergies.iter(),
            phases.iter(),
            kets.outer_iter(),
            dkets.outer_iter(),
            eigensystem.initial_floquet_bras.outer_iter(),
        );
    for (&e, &phase, ket, dket, bra) in iter {
        outer_into(&mut projector, &dket, &bra);
        out.scaled_add(phase, &projector);
        outer_into(&mut projector, &ket, &bra);
        out.scaled_add(-C64::i() * e * phase, &projector);
    }
    out
}

#[cfg(test)]
mod test {
    use approx::assert_abs_diff_eq;
    use crate::{
        diagnostics::Silent,
        eigensystem::eigensystem_logged,
        kmatrix::KRepr,
        params::FloquetParams,
    };
    use super::*;

    fn c(re: f64) -> C64 { C64::new(re, 0.0) }

    fn static_system() -> Eigensystem {
        let h = nd::array![[[c(0.3), c(0.0)], [c(0.0), c(-0.2)]]];
        let params = FloquetParams::new(5, 1.0).with_repr(KRepr::Dense);
        eigensystem_logged(&h, None, &params, &Silent).unwrap()
    }

    #[test]
    fn static_evolution() {
        let es = static_system();
        for t in [0.0, 0.7, -1.3, 4.0] {
            let expected = nd::array![
                [(-C64::i() * 0.3 * t).exp(), c(0.0)],
                [c(0.0), (C64::i() * 0.2 * t).exp()],
            ];
            assert_abs_diff_eq!(u(&es, t), expected, epsilon = 1e-12);
            let h = nd::array![[c(0.3), c(0.0)], [c(0.0), c(-0.2)]];
            let expected_dt = h.dot(&expected).mapv(|x| -C64::i() * x);
            assert_abs_diff_eq!(du_dt(&es, t), expected_dt, epsilon = 1e-12);
        }
    }

    #[test]
    fn kets_at_zero() {
        let es = static_system();
        let kets = current_floquet_kets(&es, 0.0);
        assert_abs_diff_eq!(
            kets, es.initial_floquet_bras().mapv(|x| x.conj()), epsilon = 1e-14);
        // only the central Fourier mode is occupied, which has zero coefficient
        let dkets = d_current_floquet_kets(&es, 2.5);
        assert_abs_diff_eq!(dkets, nd::Array2::<C64>::zeros((2, 2)), epsilon = 1e-14);
    }
}
