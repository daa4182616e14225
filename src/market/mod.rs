//! Market data: compounding conventions, knot curves and the combined
//! rate/dividend view consumed by every engine.

pub mod compounding;
pub mod curve;
pub mod market_curve;

pub use compounding::{
    Compounding, discount_factor, from_continuous_rate, to_continuous_rate,
    zero_rate_from_discount_factor,
};
pub use curve::{DAYS_PER_YEAR, DiscreteCurve, Interpolation, TermPoint, year_fraction};
pub use market_curve::MarketCurve;
