//! Error types for Floquet eigensystem construction and evaluation.

use thiserror::Error;

/// Every way building or evaluating an [`Eigensystem`][crate::Eigensystem]
/// can fail.
#[derive(Debug, Error)]
pub enum FloquetError {
    /// The number of Brillouin zones must be odd and at least the number of
    /// Fourier components of the Hamiltonian.
    #[error(
        "invalid zone count: need an odd number of zones >= {n_components} \
        (the number of Fourier components), got {n_zones}"
    )]
    InvalidZones { n_zones: usize, n_components: usize },

    /// Fourier components run symmetrically from `-max` to `+max`.
    #[error("expected an odd number of Fourier components, got {0}")]
    EvenComponents(usize),

    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// The solver could not fill the first Brillouin zone unambiguously.
    #[error(
        "could not resolve the first Brillouin zone safely: needed {needed} \
        eigenvalues, found {lower}, {centre}, {upper} on the lower edge, \
        centre zone, upper edge respectively; try decreasing `decimals` or \
        adding a small constant term to the Hamiltonian"
    )]
    UnresolvedZone {
        needed: usize,
        lower: usize,
        centre: usize,
        upper: usize,
    },

    /// Control derivatives were requested from an eigensystem built without
    /// Hamiltonian derivatives.
    #[error(
        "eigensystem was built without Hamiltonian derivatives; control \
        derivatives are unavailable"
    )]
    MissingDerivatives,

    /// A degenerate eigenspace was spanned by linearly dependent vectors.
    #[error("degenerate eigenvector {0} is linearly dependent on its predecessors")]
    DependentEigenvectors(usize),

    #[error(
        "shift-invert eigensolver did not converge after {iterations} sweeps \
        (largest residual {residual:e})"
    )]
    NoConvergence { iterations: usize, residual: f64 },

    #[error("linear algebra error: {0}")]
    Linalg(#[from] ndarray_linalg::error::LinalgError),

    #[error("array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type FloquetResult<T> = Result<T, FloquetError>;
