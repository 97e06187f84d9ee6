//! Derivatives of the evolution operator with respect to control parameters.
//!
//! For a Hamiltonian depending on controls `c_p`, first-order perturbation
//! theory gives
//! ```text
//! dU/dc_p = -i ∫_0^t U(t, s) (dH/dc_p)(s) U(s, 0) ds,
//! ```
//! which the Floquet decomposition turns into a finite sum. Each term pairs
//! two quasienergies `i`, `j` and a difference `Δ` between Fourier modes: the
//! time integral contributes an *integral factor* `e(i, j; Δ)` in closed form,
//! and the matrix element of `dK/dc_p` between eigenvector `j` and eigenvector
//! `i` shifted by `Δ` modes completes the *combined factor* `f(i, j; Δ; p)`.
//!
//! Differences run over `Δ = 1 - n_zones, ..., n_zones - 1`, stored at index
//! `Δ + n_zones - 1`.

use ndarray::{ self as nd, s };
use num_complex::Complex64 as C64;
use crate::{
    eigensystem::Eigensystem,
    error::{ FloquetError, FloquetResult },
    evolution::{ current_floquet_kets, energy_phases },
    linalg::{ i_to_n, ket_bra_into },
};

/// Write `conj(input)`, circularly shifted by `amount` along the first axis,
/// into `out`.
///
/// Row `r` of `input` lands in row `(r + amount) mod n` of `out`, so positive
/// amounts shift toward higher indices and negative amounts toward lower.
///
/// *Panics* if `out` and `input` have different shapes.
pub fn conjugate_rotate_into<S, T>(
    out: &mut nd::ArrayBase<S, nd::Ix2>,
    input: &nd::ArrayBase<T, nd::Ix2>,
    amount: isize,
)
where
    S: nd::DataMut<Elem = C64>,
    T: nd::Data<Elem = C64>,
{
    assert_eq!(out.dim(), input.dim(), "conjugate_rotate_into: shape mismatch");
    let n = input.nrows() as isize;
    for (r, row) in input.outer_iter().enumerate() {
        let target = (r as isize + amount).rem_euclid(n) as usize;
        out.row_mut(target).zip_mut_with(&row, |o, x| { *o = x.conj(); });
    }
}

/// Compute the integral factors `e(i, j; Δ)`, shaped `(2 n_zones - 1,
/// dimension, dimension)`.
///
/// With `p_k = exp(-i E_k t)`, these are
/// - `-i t p_i` for `i = j`, `Δ = 0`;
/// - `(p_i - p_j) / (E_i - E_j)` for `i ≠ j`, `Δ = 0`;
/// - `(p_i - p_j exp(i ω Δ t)) / (E_i + ω Δ - E_j)` otherwise.
///
/// Quasienergies that coincide exactly (or differ by an exact multiple of the
/// frequency) make a denominator vanish, and the resulting non-finite values
/// are returned as-is.
pub fn integral_factors(eigensystem: &Eigensystem, t: f64) -> nd::Array3<C64> {
    let n_zones = eigensystem.n_zones();
    let n_diffs = 2 * n_zones - 1;
    let dimension = eigensystem.dimension();
    let energies = &eigensystem.quasienergies;
    let frequency = eigensystem.frequency;
    let phases = energy_phases(eigensystem, t);

    let mut out: nd::Array3<C64> = nd::Array3::zeros((n_diffs, dimension, dimension));
    for (diff_index, mut out_diff) in out.outer_iter_mut().enumerate() {
        if diff_index == n_zones - 1 { continue; }
        let separation = frequency * i_to_n(diff_index, n_diffs) as f64;
        let exponential = (C64::i() * t * separation).exp();
        for ((i, j), e) in out_diff.indexed_iter_mut() {
            *e = (phases[i] - phases[j] * exponential)
                / (energies[i] + separation - energies[j]);
        }
    }

    let mut zero = out.index_axis_mut(nd::Axis(0), n_zones - 1);
    for i in 0..dimension {
        zero[[i, i]] = -C64::i() * t * phases[i];
        for j in 0..i {
            let value = (phases[i] - phases[j]) / (energies[i] - energies[j]);
            zero[[i, j]] = value;
            zero[[j, i]] = value;
        }
    }
    out
}

/// Compute the combined factors `f(i, j; Δ; p)`, shaped `(2 n_zones - 1,
/// dimension, dimension, n_parameters)`.
///
/// Fails if the eigensystem was built without Hamiltonian derivatives.
pub fn combined_factors(eigensystem: &Eigensystem, t: f64)
    -> FloquetResult<nd::Array4<C64>>
{
    let k_derivatives
        = eigensystem.k_derivatives()
        .ok_or(FloquetError::MissingDerivatives)?;
    let n_zones = eigensystem.n_zones();
    let n_diffs = 2 * n_zones - 1;
    let dimension = eigensystem.dimension();
    let k_eigenvectors = &eigensystem.k_eigenvectors;
    let integral = integral_factors(eigensystem, t);

    // column j of each is dK_p |v_j> in flat K space
    let flat_kets: nd::Array2<C64>
        = k_eigenvectors.iter().copied()
        .collect::<nd::Array1<C64>>()
        .into_shape((dimension, n_zones * dimension))?;
    let dk_kets: Vec<nd::Array2<C64>>
        = k_derivatives.iter()
        .map(|dk| dk.dot_mat(&flat_kets.t()))
        .collect();

    let mut factors: nd::Array4<C64>
        = nd::Array4::zeros((n_diffs, dimension, dimension, k_derivatives.len()));
    let mut rolled_bra: nd::Array2<C64> = nd::Array2::zeros((n_zones, dimension));
    for (diff_index, mut factors_diff) in factors.outer_iter_mut().enumerate() {
        let diff = i_to_n(diff_index, n_diffs);
        for (i, mut factors_i) in factors_diff.outer_iter_mut().enumerate() {
            conjugate_rotate_into(
                &mut rolled_bra,
                &k_eigenvectors.index_axis(nd::Axis(0), i),
                diff,
            );
            for (j, mut factors_ij) in factors_i.outer_iter_mut().enumerate() {
                let weight = integral[[diff_index, i, j]];
                for (f, dk_ket) in factors_ij.iter_mut().zip(&dk_kets) {
                    let expectation: C64
                        = rolled_bra.iter().zip(dk_ket.column(j))
                        .map(|(a, b)| a * b)
                        .sum();
                    *f = weight * expectation;
                }
            }
        }
    }
    Ok(factors)
}

/// Compute `dU/dc_p` at time `t` for every control parameter, shaped
/// `(n_parameters, dimension, dimension)`.
///
/// Fails if the eigensystem was built without Hamiltonian derivatives.
pub fn du_dcontrols(eigensystem: &Eigensystem, t: f64)
    -> FloquetResult<nd::Array3<C64>>
{
    let n_parameters
        = eigensystem.n_parameters()
        .ok_or(FloquetError::MissingDerivatives)?;
    let n_zones = eigensystem.n_zones();
    let dimension = eigensystem.dimension();
    let mut out: nd::Array3<C64>
        = nd::Array3::zeros((n_parameters, dimension, dimension));
    if n_parameters == 0 { return Ok(out); }

    let factors = combined_factors(eigensystem, t)?;
    let kets = current_floquet_kets(eigensystem, t);
    let mut projector: nd::Array2<C64> = nd::Array2::zeros((dimension, dimension));
    for (i, ket) in kets.outer_iter().enumerate() {
        for j in 0..dimension {
            for zone in (0..n_zones).rev() {
                ket_bra_into(
                    &mut projector,
                    &ket,
                    &eigensystem.k_eigenvectors.slice(s![j, zone, ..]),
                );
                // differences overlapping this Fourier mode
                let weights
                    = factors.slice(s![zone..zone + n_zones, i, j, ..])
                    .sum_axis(nd::Axis(0));
                for (mut out_p, &w) in out.outer_iter_mut().zip(&weights) {
                    out_p.scaled_add(w, &projector);
                }
            }
        }
    }
    Ok(out)
}
