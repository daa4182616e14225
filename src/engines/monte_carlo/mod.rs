//! Monte Carlo pricing engines.

pub mod forward_variance;
pub mod path_pricer;
pub mod statistics;

pub use forward_variance::forward_variances;
pub use path_pricer::PathPricer;
pub use statistics::RunningStat;
