//! Configuration for building Floquet eigensystems.
//!
//! Both parameter sets can be deserialized from TOML, e.g.
//! ```toml
//! n_zones = 11
//! frequency = 6.283185307179586
//! decimals = 8
//! sparse = false
//! ```

use ndarray as nd;
use num_complex::Complex64 as C64;
use serde::Deserialize;
use crate::{
    eigensystem::Eigensystem,
    error::{ FloquetError, FloquetResult },
    evolution,
    kmatrix::KRepr,
};

fn default_decimals() -> u32 { 8 }

fn default_problem_decimals() -> u32 { 10 }

fn default_sparse() -> bool { true }

/// Parameters fixing one Floquet eigensystem build.
#[derive(Copy, Clone, Debug, PartialEq, Deserialize)]
pub struct FloquetParams {
    /// Number of Brillouin zones (Fourier modes) kept in the K matrix. Must be
    /// odd.
    pub n_zones: usize,
    /// Angular frequency with which the Hamiltonian is periodic.
    pub frequency: f64,
    /// Number of decimal places used when comparing eigenvalues.
    #[serde(default = "default_decimals")]
    pub decimals: u32,
    /// Whether to assemble and diagonalize K as a sparse matrix.
    #[serde(default = "default_sparse")]
    pub sparse: bool,
}

impl FloquetParams {
    /// Create a new `FloquetParams` with the default precision (8 decimals)
    /// and sparse diagonalization.
    pub fn new(n_zones: usize, frequency: f64) -> Self {
        Self {
            n_zones,
            frequency,
            decimals: default_decimals(),
            sparse: default_sparse(),
        }
    }

    /// Set the comparison precision.
    pub fn with_decimals(mut self, decimals: u32) -> Self {
        self.decimals = decimals;
        self
    }

    /// Select dense or sparse matrix algebra.
    pub fn with_repr(mut self, repr: KRepr) -> Self {
        self.sparse = matches!(repr, KRepr::Sparse);
        self
    }

    /// Matrix representation used for K.
    pub fn repr(&self) -> KRepr { self.sparse.into() }

    /// Parse from a TOML document.
    pub fn from_toml_str(s: &str) -> FloquetResult<Self> {
        toml::from_str(s).map_err(|err| FloquetError::Config(err.to_string()))
    }

    /// Check these parameters against a Hamiltonian with `n_components`
    /// Fourier components.
    pub fn validate(&self, n_components: usize) -> FloquetResult<()> {
        if n_components % 2 == 0 {
            return Err(FloquetError::EvenComponents(n_components));
        }
        if self.n_zones % 2 == 0 || self.n_zones < n_components {
            return Err(FloquetError::InvalidZones {
                n_zones: self.n_zones,
                n_components,
            });
        }
        if !(self.frequency.is_finite() && self.frequency > 0.0) {
            return Err(FloquetError::Config(
                format!("frequency must be positive and finite, got {}", self.frequency)
            ));
        }
        Ok(())
    }
}

/// Full description of a Floquet problem, including the Hilbert space
/// dimension and the time at which the evolution is wanted.
#[derive(Copy, Clone, Debug, PartialEq, Deserialize)]
pub struct FloquetProblem {
    pub dimension: usize,
    pub n_zones: usize,
    pub n_components: usize,
    pub frequency: f64,
    pub time: f64,
    #[serde(default = "default_problem_decimals")]
    pub decimals: u32,
}

impl FloquetProblem {
    /// Parse from a TOML document.
    pub fn from_toml_str(s: &str) -> FloquetResult<Self> {
        toml::from_str(s).map_err(|err| FloquetError::Config(err.to_string()))
    }

    /// Side length of the K matrix.
    pub fn k_dimension(&self) -> usize { self.dimension * self.n_zones }

    /// Eigensystem build parameters for this problem.
    ///
    /// Fails if the zone count is incompatible with the number of Fourier
    /// components.
    pub fn params(&self, repr: KRepr) -> FloquetResult<FloquetParams> {
        let params
            = FloquetParams::new(self.n_zones, self.frequency)
            .with_decimals(self.decimals)
            .with_repr(repr);
        params.validate(self.n_components)?;
        Ok(params)
    }

    /// Evaluate the evolution operator at this problem's `time`.
    ///
    /// Fails if `eigensystem` was built for a different dimension or zone
    /// count.
    pub fn u_at(&self, eigensystem: &Eigensystem) -> FloquetResult<nd::Array2<C64>> {
        let found = (eigensystem.dimension(), eigensystem.n_zones());
        if found != (self.dimension, self.n_zones) {
            return Err(FloquetError::ShapeMismatch(format!(
                "problem has dimension {} with {} zones, eigensystem has \
                dimension {} with {} zones",
                self.dimension, self.n_zones, found.0, found.1,
            )));
        }
        Ok(evolution::u(eigensystem, self.time))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn toml_defaults() {
        let params
            = FloquetParams::from_toml_str("n_zones = 11\nfrequency = 2.5\n")
            .unwrap();
        assert_eq!(params, FloquetParams::new(11, 2.5));
        assert_eq!(params.decimals, 8);
        assert_eq!(params.repr(), KRepr::Sparse);
    }

    #[test]
    fn toml_problem() {
        let problem = FloquetProblem::from_toml_str(
            "dimension = 2\nn_zones = 5\nn_components = 3\nfrequency = 1.0\ntime = 0.5\n"
        ).unwrap();
        assert_eq!(problem.k_dimension(), 10);
        assert_eq!(problem.decimals, 10);
        let params = problem.params(KRepr::Dense).unwrap();
        assert_eq!(params.repr(), KRepr::Dense);
        assert_eq!(params.decimals, 10);
    }

    #[test]
    fn evolution_at_problem_time() {
        let problem = FloquetProblem::from_toml_str(
            "dimension = 2\nn_zones = 5\nn_components = 1\nfrequency = 1.0\ntime = 2.0\n"
        ).unwrap();
        let h = nd::array![[
            [C64::new(0.3, 0.0), C64::new(0.0, 0.0)],
            [C64::new(0.0, 0.0), C64::new(-0.2, 0.0)],
        ]];
        let es
            = crate::eigensystem::eigensystem_logged(
                &h,
                None,
                &problem.params(KRepr::Dense).unwrap(),
                &crate::diagnostics::Silent,
            )
            .unwrap();
        let U = problem.u_at(&es).unwrap();
        assert!((U[[0, 0]] - (-C64::i() * 0.6).exp()).norm() < 1e-12);
        assert!((U[[1, 1]] - (C64::i() * 0.4).exp()).norm() < 1e-12);
        assert!(U[[0, 1]].norm() < 1e-12);

        let other = FloquetProblem { dimension: 3, ..problem };
        assert!(matches!(other.u_at(&es), Err(FloquetError::ShapeMismatch(_))));
    }

    #[test]
    fn malformed_toml() {
        assert!(matches!(
            FloquetParams::from_toml_str("n_zones = \"many\""),
            Err(FloquetError::Config(_)),
        ));
    }

    #[test]
    fn zone_validation() {
        assert!(FloquetParams::new(5, 1.0).validate(3).is_ok());
        assert!(matches!(
            FloquetParams::new(4, 1.0).validate(3),
            Err(FloquetError::InvalidZones { n_zones: 4, n_components: 3 }),
        ));
        assert!(matches!(
            FloquetParams::new(3, 1.0).validate(5),
            Err(FloquetError::InvalidZones { .. }),
        ));
        assert!(matches!(
            FloquetParams::new(5, 1.0).validate(2),
            Err(FloquetError::EvenComponents(2)),
        ));
        assert!(matches!(
            FloquetParams::new(5, 0.0).validate(3),
            Err(FloquetError::Config(_)),
        ));
    }
}
