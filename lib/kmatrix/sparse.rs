//! Compressed sparse column storage for K and its derivatives.

use ndarray as nd;
use num_complex::Complex64 as C64;
use num_traits::Zero;
use crate::{
    error::FloquetResult,
    kmatrix::KMatrix,
    spectrum::shift_invert,
};

/// Complex matrix in compressed sparse column (CSC) format.
///
/// Entries of column `j` live at `col_ptr[j]..col_ptr[j + 1]` in `row_indices`
/// and `values`, sorted by row. Exact zeros are never stored.
#[derive(Clone, Debug, PartialEq)]
pub struct CscMatrix {
    nrows: usize,
    ncols: usize,
    col_ptr: Vec<usize>,
    row_indices: Vec<usize>,
    values: Vec<C64>,
}

impl CscMatrix {
    /// Build from `(row, col, value)` triplets in any order. Repeated
    /// coordinates are summed, and entries summing to zero are dropped.
    ///
    /// *Panics* if any coordinate is out of bounds.
    pub fn from_triplets(
        nrows: usize,
        ncols: usize,
        mut triplets: Vec<(usize, usize, C64)>,
    ) -> Self
    {
        triplets.sort_by_key(|&(row, col, _)| (col, row));
        // merge duplicates
        let mut merged: Vec<(usize, usize, C64)>
            = Vec::with_capacity(triplets.len());
        for (row, col, value) in triplets {
            assert!(
                row < nrows && col < ncols,
                "CscMatrix::from_triplets: entry ({}, {}) out of bounds",
                row, col,
            );
            if let Some(last) = merged.last_mut() {
                if last.0 == row && last.1 == col {
                    last.2 += value;
                    continue;
                }
            }
            merged.push((row, col, value));
        }
        let zero = C64::zero();
        let mut col_ptr: Vec<usize> = vec![0; ncols + 1];
        let mut row_indices: Vec<usize> = Vec::with_capacity(merged.len());
        let mut values: Vec<C64> = Vec::with_capacity(merged.len());
        for (row, col, value) in merged.into_iter().filter(|t| t.2 != zero) {
            row_indices.push(row);
            values.push(value);
            col_ptr[col + 1] += 1;
        }
        for j in 0..ncols {
            col_ptr[j + 1] += col_ptr[j];
        }
        Self { nrows, ncols, col_ptr, row_indices, values }
    }

    /// Convert from a dense matrix, dropping exact zeros.
    pub fn from_dense<S>(a: &nd::ArrayBase<S, nd::Ix2>) -> Self
    where S: nd::Data<Elem = C64>
    {
        let (nrows, ncols) = a.dim();
        let triplets: Vec<(usize, usize, C64)>
            = a.indexed_iter()
            .filter(|(_, x)| **x != C64::zero())
            .map(|((i, j), x)| (i, j, *x))
            .collect();
        Self::from_triplets(nrows, ncols, triplets)
    }

    /// Return `(nrows, ncols)`.
    pub fn shape(&self) -> (usize, usize) { (self.nrows, self.ncols) }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize { self.values.len() }

    /// Column pointers, of length `ncols + 1`.
    pub fn col_ptr(&self) -> &[usize] { &self.col_ptr }

    /// Row index of every stored entry.
    pub fn row_indices(&self) -> &[usize] { &self.row_indices }

    /// Every stored entry.
    pub fn values(&self) -> &[C64] { &self.values }

    /// Largest modulus over all stored entries.
    pub fn max_abs(&self) -> f64 {
        self.values.iter().map(|x| x.norm()).fold(0.0, f64::max)
    }

    // iterate over `(row, col, value)` for every stored entry
    fn entries(&self) -> impl Iterator<Item = (usize, usize, C64)> + '_ {
        self.col_ptr.iter().zip(self.col_ptr.iter().skip(1))
            .enumerate()
            .flat_map(move |(j, (&start, &stop))| {
                (start..stop)
                    .map(move |k| (self.row_indices[k], j, self.values[k]))
            })
    }

    /// Compute `A x`.
    ///
    /// *Panics* if `x` has the wrong length.
    pub fn dot_vec<S>(&self, x: &nd::ArrayBase<S, nd::Ix1>) -> nd::Array1<C64>
    where S: nd::Data<Elem = C64>
    {
        assert_eq!(x.len(), self.ncols, "CscMatrix::dot_vec: length mismatch");
        let mut y: nd::Array1<C64> = nd::Array1::zeros(self.nrows);
        for (i, j, a) in self.entries() {
            y[i] += a * x[j];
        }
        y
    }

    /// Compute `A X`.
    ///
    /// *Panics* if `x` has the wrong number of rows.
    pub fn dot_mat<S>(&self, x: &nd::ArrayBase<S, nd::Ix2>) -> nd::Array2<C64>
    where S: nd::Data<Elem = C64>
    {
        assert_eq!(x.nrows(), self.ncols, "CscMatrix::dot_mat: shape mismatch");
        let mut y: nd::Array2<C64> = nd::Array2::zeros((self.nrows, x.ncols()));
        for (i, j, a) in self.entries() {
            y.row_mut(i).scaled_add(a, &x.row(j));
        }
        y
    }
}

impl KMatrix for CscMatrix {
    fn size(&self) -> usize { self.nrows }

    fn to_dense(&self) -> nd::Array2<C64> {
        let mut a: nd::Array2<C64> = nd::Array2::zeros((self.nrows, self.ncols));
        for (i, j, x) in self.entries() {
            a[[i, j]] = x;
        }
        a
    }

    /// Find the `2 h_dimension` eigenvalues nearest zero by shift-invert
    /// iteration. Twice as many as strictly needed are requested so that the
    /// first Brillouin zone is still filled when every eigenvalue in it sits on
    /// a zone edge.
    fn eigenpairs(&self, h_dimension: usize)
        -> FloquetResult<(nd::Array1<C64>, nd::Array2<C64>)>
    {
        shift_invert::eigs_near(self, 2 * h_dimension, 0.0)
    }
}
