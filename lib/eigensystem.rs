//! The time-invariant Floquet eigensystem.
//!
//! An [`Eigensystem`] is built once per Hamiltonian (and frequency, zone
//! count, and precision) and is read-only afterwards. Evaluating the
//! evolution operator or its derivatives at any time only reads from it.

use ndarray as nd;
use num_complex::Complex64 as C64;
use crate::{
    diagnostics,
    error::{ FloquetError, FloquetResult },
    kmatrix::{ self, CscMatrix, KRepr },
    linalg::i_to_n,
    params::FloquetParams,
    spectrum::diagonalise,
};

/// Spectral data of a periodically driven Hamiltonian that does not depend on
/// time.
#[derive(Clone, Debug)]
pub struct Eigensystem {
    pub(crate) frequency: f64,
    pub(crate) quasienergies: nd::Array1<f64>,
    pub(crate) k_eigenvectors: nd::Array3<C64>,
    pub(crate) initial_floquet_bras: nd::Array2<C64>,
    pub(crate) abstract_ket_coefficients: nd::Array1<C64>,
    pub(crate) k_derivatives: Option<Vec<CscMatrix>>,
}

impl Eigensystem {
    /// Build from a Hamiltonian of shape `(n_components, dimension,
    /// dimension)` and, optionally, its derivatives with respect to each
    /// control parameter, of shape `(n_parameters, n_components', dimension,
    /// dimension)`.
    ///
    /// Without derivatives, control derivatives of the evolution operator are
    /// unavailable.
    pub fn new_with<S>(
        hamiltonian: &nd::ArrayBase<S, nd::Ix3>,
        dhamiltonian: Option<&nd::Array4<C64>>,
        params: &FloquetParams,
    ) -> FloquetResult<Self>
    where S: nd::Data<Elem = C64>
    {
        eigensystem_logged(hamiltonian, dhamiltonian, params, diagnostics::global())
    }

    /// Angular frequency of the drive.
    pub fn frequency(&self) -> f64 { self.frequency }

    /// Quasienergies in the first Brillouin zone, sorted ascending.
    pub fn quasienergies(&self) -> &nd::Array1<f64> { &self.quasienergies }

    /// Eigenvectors of K, shaped `(dimension, n_zones, dimension)`. The first
    /// index matches [`Self::quasienergies`].
    pub fn k_eigenvectors(&self) -> &nd::Array3<C64> { &self.k_eigenvectors }

    /// Conjugated Floquet kets at time zero, one per row.
    pub fn initial_floquet_bras(&self) -> &nd::Array2<C64> {
        &self.initial_floquet_bras
    }

    /// `i * frequency * m` for each Fourier mode `m`, centred on zero.
    pub fn abstract_ket_coefficients(&self) -> &nd::Array1<C64> {
        &self.abstract_ket_coefficients
    }

    /// Derivatives of K with respect to each control parameter, if the
    /// eigensystem was built with Hamiltonian derivatives.
    pub fn k_derivatives(&self) -> Option<&[CscMatrix]> {
        self.k_derivatives.as_deref()
    }

    /// Dimension of the physical Hilbert space.
    pub fn dimension(&self) -> usize { self.quasienergies.len() }

    /// Number of Brillouin zones kept in K.
    pub fn n_zones(&self) -> usize { self.k_eigenvectors.shape()[1] }

    /// Number of control parameters, if derivatives are available.
    pub fn n_parameters(&self) -> Option<usize> {
        self.k_derivatives.as_ref().map(|dk| dk.len())
    }
}

/// Build an [`Eigensystem`], sending diagnostics to the global logger.
///
/// See [`Eigensystem::new_with`].
pub fn eigensystem<S>(
    hamiltonian: &nd::ArrayBase<S, nd::Ix3>,
    dhamiltonian: Option<&nd::Array4<C64>>,
    params: &FloquetParams,
) -> FloquetResult<Eigensystem>
where S: nd::Data<Elem = C64>
{
    Eigensystem::new_with(hamiltonian, dhamiltonian, params)
}

/// Build an [`Eigensystem`], sending diagnostics to `logger`.
pub fn eigensystem_logged<S>(
    hamiltonian: &nd::ArrayBase<S, nd::Ix3>,
    dhamiltonian: Option<&nd::Array4<C64>>,
    params: &FloquetParams,
    logger: &dyn log::Log,
) -> FloquetResult<Eigensystem>
where S: nd::Data<Elem = C64>
{
    let (n_components, dimension, _) = hamiltonian.dim();
    params.validate(n_components)?;
    if let Some(dh) = dhamiltonian {
        let (_, _, da, db) = dh.dim();
        if (da, db) != (dimension, dimension) {
            return Err(FloquetError::ShapeMismatch(format!(
                "Hamiltonian derivatives must be {0} × {0} matrices, got {1} × {2}",
                dimension, da, db,
            )));
        }
    }
    let FloquetParams { n_zones, frequency, decimals, .. } = *params;

    let (quasienergies, k_eigenvectors)
        = match params.repr() {
            KRepr::Dense => {
                let k = kmatrix::assemble_k(hamiltonian, n_zones, frequency)?;
                diagonalise(&k, dimension, frequency, decimals, logger)?
            },
            KRepr::Sparse => {
                let k = kmatrix::assemble_k_sparse(hamiltonian, n_zones, frequency)?;
                diagonalise(&k, dimension, frequency, decimals, logger)?
            },
        };
    // contract the Fourier modes back onto the physical space at t = 0
    let initial_floquet_bras
        = k_eigenvectors.sum_axis(nd::Axis(1))
        .mapv_into(|x| x.conj());
    let abstract_ket_coefficients: nd::Array1<C64>
        = (0..n_zones)
        .map(|z| C64::i() * frequency * i_to_n(z, n_zones) as f64)
        .collect();
    let k_derivatives
        = dhamiltonian
        .map(|dh| kmatrix::assemble_dk(dh, n_zones))
        .transpose()?;

    Ok(Eigensystem {
        frequency,
        quasienergies,
        k_eigenvectors,
        initial_floquet_bras,
        abstract_ket_coefficients,
        k_derivatives,
    })
}
