//! Pricing engine implementations.

pub mod analytic;
pub mod monte_carlo;
pub mod pde;
pub mod tree;
