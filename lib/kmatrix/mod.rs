//! Assembly of the Floquet (K) matrix from the Fourier components of a
//! time-periodic Hamiltonian.
//!
//! The K matrix is an `n_zones × n_zones` grid of `dimension × dimension`
//! blocks. Block `(row, col)` holds the Hamiltonian's Fourier component for
//! harmonic `row - col`, and each block on the main diagonal additionally
//! carries `frequency * (row - (n_zones - 1) / 2)` times the identity.
//! Harmonics outside the Hamiltonian's range are zero and never stored.
//!
//! The Hamiltonian is given as a 3D array of shape `(n_components, dimension,
//! dimension)`, where index `k` along the first axis holds harmonic
//! `k - (n_components - 1) / 2`.

use ndarray::{ self as nd, s };
use ndarray_linalg::Eig;
use num_complex::Complex64 as C64;
use num_traits::Zero;
use crate::{
    error::{ FloquetError, FloquetResult },
    linalg::{ i_to_n, n_to_i, set_block },
};

pub mod sparse;
pub use sparse::CscMatrix;

/// Choice of matrix representation for K.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum KRepr {
    /// Dense storage, diagonalized completely.
    Dense,
    /// Compressed sparse column storage, diagonalized iteratively near zero.
    ///
    /// Only assembly and matrix products stay sparse: the shift-invert solve
    /// factorizes a dense copy of K, so memory and factorization cost are the
    /// same as for [`KRepr::Dense`]. The gain is in finding only the
    /// `2 * dimension` eigenpairs closest to zero.
    Sparse,
}

impl From<bool> for KRepr {
    fn from(sparse: bool) -> Self {
        if sparse { Self::Sparse } else { Self::Dense }
    }
}

/// Operations the spectral selector needs from a K matrix representation.
pub trait KMatrix {
    /// Side length of the (square) matrix.
    fn size(&self) -> usize;

    /// Copy into a dense array.
    fn to_dense(&self) -> nd::Array2<C64>;

    /// Compute raw eigenpairs with enough coverage to fill the first
    /// Brillouin zone of a Hamiltonian of dimension `h_dimension`.
    ///
    /// Eigenvectors are returned as the columns of the second array.
    fn eigenpairs(&self, h_dimension: usize)
        -> FloquetResult<(nd::Array1<C64>, nd::Array2<C64>)>;
}

impl<S> KMatrix for nd::ArrayBase<S, nd::Ix2>
where S: nd::Data<Elem = C64>
{
    fn size(&self) -> usize { self.nrows() }

    fn to_dense(&self) -> nd::Array2<C64> { self.to_owned() }

    fn eigenpairs(&self, _h_dimension: usize)
        -> FloquetResult<(nd::Array1<C64>, nd::Array2<C64>)>
    {
        Ok(self.eig()?)
    }
}

// returns `(n_components, dimension)`
fn check_hamiltonian<S>(hamiltonian: &nd::ArrayBase<S, nd::Ix3>, n_zones: usize)
    -> FloquetResult<(usize, usize)>
where S: nd::Data<Elem = C64>
{
    let (n_components, dimension, dimension_b) = hamiltonian.dim();
    if dimension != dimension_b {
        return Err(FloquetError::ShapeMismatch(format!(
            "Fourier components must be square, got {} × {}",
            dimension, dimension_b,
        )));
    }
    if n_components % 2 == 0 {
        return Err(FloquetError::EvenComponents(n_components));
    }
    if n_zones % 2 == 0 || n_zones < n_components {
        return Err(FloquetError::InvalidZones { n_zones, n_components });
    }
    Ok((n_components, dimension))
}

/// Iterate over `(component, row, col)` for every block of K holding a
/// Fourier component, where `component` indexes the Hamiltonian's first axis.
///
/// Requires `n_zones >= n_components`.
pub(crate) fn block_placements(n_components: usize, n_zones: usize)
    -> impl Iterator<Item = (usize, usize, usize)>
{
    let max_harmonic = (n_components as isize - 1) / 2;
    (-max_harmonic..=max_harmonic)
        .flat_map(move |n| {
            let component = n_to_i(n, n_components);
            let row0 = n.max(0) as usize;
            let col0 = (-n).max(0) as usize;
            (0..n_zones - n.unsigned_abs())
                .map(move |k| (component, row0 + k, col0 + k))
        })
}

/// Build the dense K matrix.
///
/// Fails if the Fourier components are not square, if there is an even number
/// of them, or if `n_zones` is even or smaller than the number of components.
pub fn assemble_k<S>(
    hamiltonian: &nd::ArrayBase<S, nd::Ix3>,
    n_zones: usize,
    frequency: f64,
) -> FloquetResult<nd::Array2<C64>>
where S: nd::Data<Elem = C64>
{
    let (n_components, dimension) = check_hamiltonian(hamiltonian, n_zones)?;
    let k_dim = dimension * n_zones;
    let mut K: nd::Array2<C64> = nd::Array2::zeros((k_dim, k_dim));
    for (component, row, col) in block_placements(n_components, n_zones) {
        set_block(
            &mut K,
            &hamiltonian.slice(s![component, .., ..]),
            dimension,
            row,
            col,
        );
        if row == col {
            let offset = frequency * i_to_n(row, n_zones) as f64;
            (row * dimension..(row + 1) * dimension)
                .for_each(|a| { K[[a, a]] += offset; });
        }
    }
    Ok(K)
}

/// Build K directly in compressed sparse column form, without passing
/// through a dense matrix.
///
/// Fails under the same conditions as [`assemble_k`].
pub fn assemble_k_sparse<S>(
    hamiltonian: &nd::ArrayBase<S, nd::Ix3>,
    n_zones: usize,
    frequency: f64,
) -> FloquetResult<CscMatrix>
where S: nd::Data<Elem = C64>
{
    let (n_components, dimension) = check_hamiltonian(hamiltonian, n_zones)?;
    let k_dim = dimension * n_zones;
    let mut triplets: Vec<(usize, usize, C64)> = Vec::new();
    for (component, row, col) in block_placements(n_components, n_zones) {
        let block = hamiltonian.slice(s![component, .., ..]);
        triplets.extend(
            block.indexed_iter()
                .filter(|(_, h)| **h != C64::zero())
                .map(|((a, b), h)| (row * dimension + a, col * dimension + b, *h))
        );
        if row == col {
            let offset = frequency * i_to_n(row, n_zones) as f64;
            if offset != 0.0 {
                triplets.extend(
                    (row * dimension..(row + 1) * dimension)
                        .map(|a| (a, a, C64::from(offset)))
                );
            }
        }
    }
    Ok(CscMatrix::from_triplets(k_dim, k_dim, triplets))
}

/// Build the derivatives of K with respect to each control parameter.
///
/// `dhamiltonian` has shape `(n_parameters, n_components, dimension,
/// dimension)`. The frequency offset on the diagonal does not depend on the
/// controls, so each derivative is assembled with zero frequency.
pub fn assemble_dk<S>(dhamiltonian: &nd::ArrayBase<S, nd::Ix4>, n_zones: usize)
    -> FloquetResult<Vec<CscMatrix>>
where S: nd::Data<Elem = C64>
{
    dhamiltonian.outer_iter()
        .map(|dh| assemble_k_sparse(&dh, n_zones, 0.0))
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    fn c(re: f64) -> C64 { C64::new(re, 0.0) }

    // the components a, b, c used for harmonics -1, 0, 1 and the identity
    fn abc() -> [nd::Array2<C64>; 4] {
        [
            nd::Array2::from_elem((2, 2), c(-1.0)),
            nd::Array2::zeros((2, 2)),
            nd::Array2::from_elem((2, 2), c(1.0)),
            nd::Array2::<f64>::eye(2).mapv(c),
        ]
    }

    fn stack(components: &[&nd::Array2<C64>]) -> nd::Array3<C64> {
        nd::stack(
            nd::Axis(0),
            &components.iter().map(|x| x.view()).collect::<Vec<_>>(),
        )
        .unwrap()
    }

    fn block_matrix(blocks: [[&nd::Array2<C64>; 5]; 5]) -> nd::Array2<C64> {
        let mut m: nd::Array2<C64> = nd::Array2::zeros((10, 10));
        for (r, row) in blocks.iter().enumerate() {
            for (col, block) in row.iter().enumerate() {
                set_block(&mut m, *block, 2, r, col);
            }
        }
        m
    }

    fn goal_k() -> nd::Array2<C64> {
        let [a, b, cc, i] = abc();
        let z: nd::Array2<C64> = nd::Array2::zeros((2, 2));
        let d = |n: f64| &b + &i.mapv(|x| x * n);
        let (dm2, dm1, d0, dp1, dp2) = (d(-2.0), d(-1.0), d(0.0), d(1.0), d(2.0));
        block_matrix([
            [&dm2, &a, &z, &z, &z],
            [&cc, &dm1, &a, &z, &z],
            [&z, &cc, &d0, &a, &z],
            [&z, &z, &cc, &dp1, &a],
            [&z, &z, &z, &cc, &dp2],
        ])
    }

    #[test]
    fn placements() {
        let blocks: Vec<(usize, usize, usize)>
            = block_placements(3, 3).collect();
        assert_eq!(
            blocks,
            vec![
                (0, 0, 1), (0, 1, 2),
                (1, 0, 0), (1, 1, 1), (1, 2, 2),
                (2, 1, 0), (2, 2, 1),
            ],
        );
    }

    #[test]
    fn dense_matches_literal() {
        let [a, b, cc, _] = abc();
        let hf = stack(&[&a, &b, &cc]);
        let K = assemble_k(&hf, 5, 1.0).unwrap();
        assert_eq!(K, goal_k());
    }

    #[test]
    fn sparse_matches_literal() {
        let [a, b, cc, _] = abc();
        let hf = stack(&[&a, &b, &cc]);
        let K = assemble_k_sparse(&hf, 5, 1.0).unwrap();
        assert_eq!(K.to_dense(), goal_k());
        assert_eq!(K.to_dense(), assemble_k(&hf, 5, 1.0).unwrap());
    }

    #[test]
    fn derivatives_match_literal() {
        let [a, b, cc, _] = abc();
        let z: nd::Array2<C64> = nd::Array2::zeros((2, 2));
        let dk1 = block_matrix([
            [&b, &a, &z, &z, &z],
            [&cc, &b, &a, &z, &z],
            [&z, &cc, &b, &a, &z],
            [&z, &z, &cc, &b, &a],
            [&z, &z, &z, &cc, &b],
        ]);
        let dk2 = block_matrix([
            [&b, &b, &z, &z, &z],
            [&a, &b, &b, &z, &z],
            [&z, &a, &b, &b, &z],
            [&z, &z, &a, &b, &b],
            [&z, &z, &z, &a, &b],
        ]);
        let dhf = nd::stack(
            nd::Axis(0),
            &[stack(&[&a, &b, &cc]).view(), stack(&[&b, &b, &a]).view()],
        )
        .unwrap();
        let dk = assemble_dk(&dhf, 5).unwrap();
        assert_eq!(dk.len(), 2);
        assert_eq!(dk[0].to_dense(), dk1);
        assert_eq!(dk[1].to_dense(), dk2);
        assert_eq!(dk[0], CscMatrix::from_dense(&dk1));
    }

    #[test]
    fn hermitian_pattern() {
        let h0 = nd::array![[c(0.3), C64::new(0.1, 0.2)], [C64::new(0.1, -0.2), c(-0.4)]];
        let h1 = nd::array![[C64::new(0.0, 0.05), c(0.2)], [c(0.1), c(0.0)]];
        let hm1 = h1.t().mapv(|x| x.conj());
        let hf = stack(&[&hm1, &h0, &h1]);
        let K = assemble_k(&hf, 7, 2.0).unwrap();
        assert_eq!(K, K.t().mapv(|x| x.conj()));
    }

    #[test]
    fn rejects_bad_zones() {
        let [a, b, cc, _] = abc();
        let hf = stack(&[&a, &b, &cc]);
        assert!(matches!(
            assemble_k(&hf, 4, 1.0),
            Err(FloquetError::InvalidZones { n_zones: 4, n_components: 3 }),
        ));
        assert!(matches!(
            assemble_k_sparse(&hf, 1, 1.0),
            Err(FloquetError::InvalidZones { n_zones: 1, n_components: 3 }),
        ));
        let even = stack(&[&a, &b]);
        assert!(matches!(
            assemble_k(&even, 5, 1.0),
            Err(FloquetError::EvenComponents(2)),
        ));
    }
}
