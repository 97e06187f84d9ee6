#![allow(non_snake_case)]

//! Floquet eigensystems of periodically driven quantum systems.
//!
//! A Hamiltonian `H(t) = Σ_n H_n exp(i n ω t)` is given by its Fourier
//! components `H_n`. [`eigensystem`] assembles and diagonalizes the
//! corresponding Floquet (K) matrix once; the evolution operator `U(t)`, its
//! time derivative, and its derivatives with respect to control parameters
//! can then be evaluated at any time without further diagonalization.
//!
//! ```no_run
//! use ndarray as nd;
//! use num_complex::Complex64 as C64;
//! use floquet_sim::{ eigensystem, evolution, FloquetParams };
//!
//! let g = C64::new(0.05, 0.0);
//! let z = C64::new(0.0, 0.0);
//! let hamiltonian = nd::array![
//!     [[z, g], [z, z]],
//!     [[C64::new(0.2, 0.0), z], [z, C64::new(-0.1, 0.0)]],
//!     [[z, z], [g, z]],
//! ];
//! let params = FloquetParams::new(11, 1.0);
//! let es = eigensystem(&hamiltonian, None, &params)?;
//! let u = evolution::u(&es, 2.5);
//! # Ok::<(), floquet_sim::FloquetError>(())
//! ```

pub mod error;
pub mod params;
pub mod diagnostics;
pub mod linalg;
pub mod kmatrix;
pub mod spectrum;
pub mod eigensystem;
pub mod evolution;
pub mod controls;

pub use error::{ FloquetError, FloquetResult };
pub use params::{ FloquetParams, FloquetProblem };
pub use kmatrix::{ CscMatrix, KMatrix, KRepr, assemble_k, assemble_k_sparse, assemble_dk };
pub use spectrum::{ diagonalise, find_duplicates, first_brillouin_zone };
pub use eigensystem::{ Eigensystem, eigensystem, eigensystem_logged };
pub use evolution::{ current_floquet_kets, d_current_floquet_kets, du_dt, u };
pub use controls::{
    combined_factors,
    conjugate_rotate_into,
    du_dcontrols,
    integral_factors,
};
