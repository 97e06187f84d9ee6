//! Small array utilities shared by the assembler, the spectral selector, and
//! the evaluators.

use ndarray::{ self as nd, s };
use num_complex::Complex64 as C64;
use crate::error::{ FloquetError, FloquetResult };

/// Convert a signed Fourier/zone offset `n` into an array index for a
/// symmetric range of `len` (odd) entries centred on zero.
pub fn n_to_i(n: isize, len: usize) -> usize {
    (n + (len as isize - 1) / 2) as usize
}

/// Inverse of [`n_to_i`].
pub fn i_to_n(i: usize, len: usize) -> isize {
    i as isize - (len as isize - 1) / 2
}

/// Round to a number of decimal places, with ties going to the even
/// neighbour.
pub fn round_to(x: f64, decimals: u32) -> f64 {
    let scale = 10.0_f64.powi(decimals as i32);
    (x * scale).round_ties_even() / scale
}

/// Overwrite the `(row, col)`-th `dim × dim` block of `matrix` with `block`.
pub fn set_block<S, T>(
    matrix: &mut nd::ArrayBase<S, nd::Ix2>,
    block: &nd::ArrayBase<T, nd::Ix2>,
    dim: usize,
    row: usize,
    col: usize,
)
where
    S: nd::DataMut<Elem = C64>,
    T: nd::Data<Elem = C64>,
{
    matrix.slice_mut(s![row * dim..(row + 1) * dim, col * dim..(col + 1) * dim])
        .assign(block);
}

/// Add `block` onto the `(row, col)`-th `dim × dim` block of `matrix`.
pub fn add_block<S, T>(
    matrix: &mut nd::ArrayBase<S, nd::Ix2>,
    block: &nd::ArrayBase<T, nd::Ix2>,
    dim: usize,
    row: usize,
    col: usize,
)
where
    S: nd::DataMut<Elem = C64>,
    T: nd::Data<Elem = C64>,
{
    let mut target
        = matrix.slice_mut(
            s![row * dim..(row + 1) * dim, col * dim..(col + 1) * dim]);
    target += block;
}

/// Write the plain outer product `a bᵀ` into `out`.
pub fn outer_into<S, A, B>(
    out: &mut nd::ArrayBase<S, nd::Ix2>,
    a: &nd::ArrayBase<A, nd::Ix1>,
    b: &nd::ArrayBase<B, nd::Ix1>,
)
where
    S: nd::DataMut<Elem = C64>,
    A: nd::Data<Elem = C64>,
    B: nd::Data<Elem = C64>,
{
    for (mut row, ai) in out.outer_iter_mut().zip(a) {
        row.zip_mut_with(b, |o, bj| { *o = *ai * *bj; });
    }
}

/// Write the ket-bra `|a⟩⟨b|` (i.e. `a b†`) into `out`.
pub fn ket_bra_into<S, A, B>(
    out: &mut nd::ArrayBase<S, nd::Ix2>,
    a: &nd::ArrayBase<A, nd::Ix1>,
    b: &nd::ArrayBase<B, nd::Ix1>,
)
where
    S: nd::DataMut<Elem = C64>,
    A: nd::Data<Elem = C64>,
    B: nd::Data<Elem = C64>,
{
    for (mut row, ai) in out.outer_iter_mut().zip(a) {
        row.zip_mut_with(b, |o, bj| { *o = *ai * bj.conj(); });
    }
}

/// Compute a "norm" of an object, treating it as a representation of a quantum
/// state.
pub trait StateNorm {
    fn norm(&self) -> f64;
}

/// The norm of a 1D complex array is the quadrature sum of its elements.
impl<S> StateNorm for nd::ArrayBase<S, nd::Ix1>
where S: nd::Data<Elem = C64>
{
    fn norm(&self) -> f64 { self.iter().map(|a| a.norm_sqr()).sum::<f64>().sqrt() }
}

/// Orthonormalize the rows of `vectors` in place with (modified)
/// Gram-Schmidt.
///
/// Fails if a row's component orthogonal to all preceding rows has zero norm
/// when rounded to `decimals` places.
pub fn gram_schmidt<S>(vectors: &mut nd::ArrayBase<S, nd::Ix2>, decimals: u32)
    -> FloquetResult<()>
where S: nd::DataMut<Elem = C64>
{
    let n = vectors.nrows();
    for k in 0..n {
        let (done, mut rest) = vectors.view_mut().split_at(nd::Axis(0), k);
        let mut v = rest.row_mut(0);
        for u in done.outer_iter() {
            let proj: C64
                = u.iter().zip(v.iter())
                .map(|(ui, vi)| ui.conj() * *vi)
                .sum();
            v.zip_mut_with(&u, |vi, ui| { *vi -= proj * *ui; });
        }
        let norm = v.norm();
        if round_to(norm, decimals) == 0.0 {
            return Err(FloquetError::DependentEigenvectors(k));
        }
        v.mapv_inplace(|vi| vi / norm);
    }
    Ok(())
}
