//! Diagonalization of K and selection of the first Brillouin zone.
//!
//! The spectrum of K repeats every `frequency`, so only one copy of each
//! quasienergy is physically meaningful. The copy kept is the one in the
//! first Brillouin zone, `[-frequency / 2, frequency / 2]`, with ties on the
//! zone edges resolved so that exactly `dimension` eigenvalues survive.

use std::ops::Range;
use ndarray::{ self as nd, s };
use num_complex::Complex64 as C64;
use crate::{
    diagnostics::debug_to,
    error::{ FloquetError, FloquetResult },
    kmatrix::KMatrix,
    linalg::{ gram_schmidt, round_to },
};

pub mod shift_invert;

/// Diagonalize K and return the `dimension` quasienergies in the first
/// Brillouin zone (sorted ascending) together with their eigenvectors, shaped
/// as `(dimension, n_zones, dimension)`.
///
/// Eigenvalues are rounded to `decimals` places before selection, and every
/// run of eigenvalues that are equal after rounding has its eigenvectors
/// replaced by an orthonormal basis of their span.
pub fn diagonalise<K>(
    k: &K,
    dimension: usize,
    frequency: f64,
    decimals: u32,
    logger: &dyn log::Log,
) -> FloquetResult<(nd::Array1<f64>, nd::Array3<C64>)>
where K: KMatrix + ?Sized
{
    let n_zones = k.size() / dimension.max(1);
    let (values, vectors) = k.eigenpairs(dimension)?;
    let values: Vec<f64>
        = values.iter().map(|v| round_to(v.re, decimals)).collect();
    let edge = round_to(0.5 * frequency, decimals);
    let (values, mut vectors)
        = first_brillouin_zone(&values, &vectors.t(), dimension, edge, logger)?;

    let values: Vec<f64> = values.into_raw_vec();
    for group in find_duplicates(&values) {
        debug_to!(
            logger,
            "orthonormalizing {} degenerate eigenvectors at quasienergy {}",
            group.len(), values[group.start],
        );
        gram_schmidt(&mut vectors.slice_mut(s![group, ..]), decimals)?;
    }
    let vectors
        = nd::Array3::from_shape_vec(
            (dimension, n_zones, dimension),
            vectors.iter().copied().collect(),
        )?;
    Ok((nd::Array1::from(values), vectors))
}

/// Select exactly `n_values` eigenvalues lying in `[-edge, edge]`, with their
/// eigenvectors (stored as the rows of `eigenvectors`).
///
/// Eigenvalues must already be rounded so that edge values compare equal to
/// `±edge`. Interior eigenvalues are always kept. If they are not enough, the
/// shortfall is filled from whichever edge makes the count exact, preferring
/// the lower one; if neither does, the zone is unresolved.
pub fn first_brillouin_zone<S>(
    eigenvalues: &[f64],
    eigenvectors: &nd::ArrayBase<S, nd::Ix2>,
    n_values: usize,
    edge: f64,
    logger: &dyn log::Log,
) -> FloquetResult<(nd::Array1<f64>, nd::Array2<C64>)>
where S: nd::Data<Elem = C64>
{
    let mut order: Vec<usize> = (0..eigenvalues.len()).collect();
    order.sort_by(|&a, &b| eigenvalues[a].total_cmp(&eigenvalues[b]));
    let sorted: Vec<f64> = order.iter().map(|&j| eigenvalues[j]).collect();

    let lower = sorted.partition_point(|&v| v < -edge);
    let upper = sorted.partition_point(|&v| v <= edge).max(lower);
    let n_lower_edge
        = sorted[lower..upper].iter()
        .take_while(|&&v| v == -edge)
        .count();
    let n_upper_edge
        = sorted[lower + n_lower_edge..upper].iter().rev()
        .take_while(|&&v| v == edge)
        .count();
    let n_centre = (upper - n_upper_edge) - (lower + n_lower_edge);
    debug_to!(
        logger,
        "Needed {} eigenvalues in the first zone. Found {}, {}, {} on the \
        lower edge, centre zone, upper edge respectively.",
        n_values, n_lower_edge, n_centre, n_upper_edge,
    );

    let range
        = if n_centre == n_values {
            lower + n_lower_edge..upper - n_upper_edge
        } else if n_centre + n_lower_edge == n_values {
            lower..upper - n_upper_edge
        } else if n_centre + n_upper_edge == n_values {
            lower + n_lower_edge..upper
        } else {
            return Err(FloquetError::UnresolvedZone {
                needed: n_values,
                lower: n_lower_edge,
                centre: n_centre,
                upper: n_upper_edge,
            });
        };
    let values: nd::Array1<f64> = sorted[range.clone()].iter().copied().collect();
    let vectors = eigenvectors.select(nd::Axis(0), &order[range]);
    Ok((values, vectors))
}

/// Iterator over the runs of equal values in a sorted slice, produced by
/// [`find_duplicates`].
#[derive(Clone, Debug)]
pub struct Duplicates<'a> {
    values: &'a [f64],
    pos: usize,
}

impl<'a> Iterator for Duplicates<'a> {
    type Item = Range<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.pos < self.values.len() {
            let start = self.pos;
            let value = self.values[start];
            let len
                = self.values[start..].iter()
                .take_while(|&&v| v == value)
                .count();
            self.pos = start + len;
            if len > 1 { return Some(start..self.pos); }
        }
        None
    }
}

/// Lazily find the index ranges of every run of two or more equal values in
/// a sorted slice. Singletons are skipped.
pub fn find_duplicates(values: &[f64]) -> Duplicates<'_> {
    Duplicates { values, pos: 0 }
}
