//! Discretely averaged (average-price) option contract.
//!
//! The payoff is `max(S1 (A - K), 0)` where `A` is the arithmetic mean of
//! every reset level in the schedule, historical fixings included, and the
//! premium is paid at `expiry`. Pricing lives in
//! [`crate::engines::analytic::AsianMomentPricer`].

use crate::core::{Instrument, OptionType, PricingError};
use crate::instruments::ResetSchedule;

/// Average-price option on the resets of a [`ResetSchedule`].
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AsianOption {
    /// Call or put.
    pub option_type: OptionType,
    /// Underlying spot.
    pub spot: f64,
    /// Fixed strike on the average.
    pub strike: f64,
    /// Payment time in years.
    pub expiry: f64,
    /// Averaging dates, fixings and vols.
    pub resets: ResetSchedule,
}

impl AsianOption {
    pub fn new(
        option_type: OptionType,
        spot: f64,
        strike: f64,
        expiry: f64,
        resets: ResetSchedule,
    ) -> Self {
        Self {
            option_type,
            spot,
            strike,
            expiry,
            resets,
        }
    }

    /// Validates instrument fields.
    pub fn validate(&self) -> Result<(), PricingError> {
        if !self.spot.is_finite() || self.spot <= 0.0 {
            return Err(PricingError::input("asian spot must be finite and > 0"));
        }
        if !self.strike.is_finite() || self.strike <= 0.0 {
            return Err(PricingError::input("asian strike must be finite and > 0"));
        }
        if !self.expiry.is_finite() || self.expiry < self.resets.last_time() {
            return Err(PricingError::input(
                "asian expiry must be finite and not before the last reset",
            ));
        }
        Ok(())
    }
}

impl Instrument for AsianOption {
    fn instrument_type(&self) -> &str {
        "AsianOption"
    }
}
