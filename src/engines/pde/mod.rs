//! Finite-difference PDE pricing engines.

mod fd_common;
pub mod theta_scheme;

pub use theta_scheme::GridPricer;
