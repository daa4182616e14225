//! Closed-form analytic pricing engines.

pub mod asian_moment;
pub mod black_scholes;

pub use asian_moment::AsianMomentPricer;
pub use black_scholes::{BlackScholesPricer, black_price};
