//! OpenFerric Equity prices equity options against a term structure of rates and discrete
//! dividends: European and American vanillas, digitals, Asian average-rate options and
//! reset-driven payoffs such as cliquets.
//!
//! Four engines share one market view ([`market::MarketCurve`]) and one result type
//! ([`core::PricingResult`]):
//! - [`engines::analytic`]: Black-Scholes on the dividend-equivalent yield and a moment-matched
//!   Asian approximation.
//! - [`engines::tree`]: a recombining binomial tree on the dividend-stripped spot.
//! - [`engines::pde`]: a theta-scheme finite-difference grid in log-spot with SOR and grid shifts
//!   at dividend dates.
//! - [`engines::monte_carlo`]: reset-to-reset simulation with likelihood-ratio Greeks.
//!
//! References used across modules include:
//! - Hull, *Options, Futures, and Other Derivatives* (11th ed.), Ch. 15, 21 and 26.
//! - Wilmott, *Paul Wilmott on Quantitative Finance* (2nd ed.) for finite differences.
//! - Glasserman (2004) for Monte Carlo estimators.
//!
//! Greeks use one convention everywhere: vega per vol point, theta per calendar day, rho per
//! rate point.
//!
//! # Feature Flags
//! - `parallel`: runs Monte Carlo chunks on Rayon; results match the sequential build.
//!
//! # Quick Start
//! Price a Black-Scholes call on a flat curve:
//! ```rust
//! use openferric_equity::prelude::*;
//!
//! let curve = MarketCurve::flat(0.05).unwrap();
//! let spec = OptionSpec::european_call(100.0, 100.0, 1.0, 0.20);
//! let result = BlackScholesPricer::new().price(&spec, &curve).unwrap();
//! assert!((result.price - 10.4506).abs() < 1e-3);
//! ```
//!
//! American put with a cash dividend on the lattice and on the grid:
//! ```rust
//! use openferric_equity::prelude::*;
//!
//! let curve = MarketCurve::from_days(&[365], &[0.05], &[90], &[2.0]).unwrap();
//! let spec = OptionSpec::american_put(100.0, 100.0, 1.0, 0.25);
//! let tree = LatticePricer::new(200).price(&spec, &curve).unwrap();
//! let grid = GridPricer::new(200, 0.01).price(&spec, &curve).unwrap();
//! assert!((tree.price - grid.price).abs() < 0.1);
//! ```
//!
//! Cliquet by simulation:
//! ```rust
//! use openferric_equity::prelude::*;
//!
//! let resets = ResetSchedule::new(
//!     [0, 91, 182, 273, 365]
//!         .iter()
//!         .map(|&d| if d == 0 { ResetPoint::fixed(0, 100.0) } else { ResetPoint::future(d, 0.2) })
//!         .collect(),
//! )
//! .unwrap();
//! let payoff = PathPayoff::Cliquet {
//!     strike: 1.0,
//!     local_cap: 0.05,
//!     local_floor: None,
//!     global_floor: 0.0,
//! };
//! let option = PathOption::new(100.0, 1.0, payoff, resets);
//! let result = PathPricer::new(10_000, 7)
//!     .price(&option, &MarketCurve::flat(0.03).unwrap())
//!     .unwrap();
//! assert!(result.price >= 0.0 && result.stderr.unwrap() > 0.0);
//! ```

pub mod core;
pub mod engines;
pub mod instruments;
pub mod market;
pub mod math;

/// Common imports for ergonomic usage.
pub mod prelude {
    pub use crate::core::*;
    pub use crate::engines::analytic::*;
    pub use crate::engines::monte_carlo::PathPricer;
    pub use crate::engines::pde::GridPricer;
    pub use crate::engines::tree::LatticePricer;
    pub use crate::instruments::*;
    pub use crate::market::*;
}
