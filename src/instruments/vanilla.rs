//! Single-asset option terms shared by the analytic, lattice and grid engines.
//!
//! [`OptionSpec`] carries the underlying spot and a flat volatility alongside
//! the contract terms, so a bumped scenario is just another `OptionSpec`
//! value (`with_vol`, `with_spot`, `with_expiry`) and engines never mutate
//! their input.
//! Validation accepts `expiry == 0` (intrinsic-value edge case) and `vol == 0`.

use crate::core::{ExerciseStyle, Instrument, OptionType, Payoff, PricingError};

/// Option terms plus the spot and volatility they are priced at.
///
/// # Examples
/// ```
/// use openferric_equity::core::{ExerciseStyle, Payoff};
/// use openferric_equity::instruments::OptionSpec;
///
/// let option = OptionSpec::european_call(100.0, 105.0, 0.5, 0.25);
/// assert!(option.validate().is_ok());
/// assert_eq!(option.payoff, Payoff::Call);
///
/// let bumped = option.with_vol(0.26).with_exercise(ExerciseStyle::American);
/// assert_eq!(option.vol, 0.25);
/// assert!(bumped.exercise.is_american());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct OptionSpec {
    /// Underlying spot.
    pub spot: f64,
    /// Strike level.
    pub strike: f64,
    /// Terminal payoff profile.
    pub payoff: Payoff,
    /// Expiry in years.
    pub expiry: f64,
    /// Flat Black-Scholes volatility.
    pub vol: f64,
    /// Exercise style.
    #[serde(default)]
    pub exercise: ExerciseStyle,
}

impl OptionSpec {
    pub fn new(
        spot: f64,
        strike: f64,
        payoff: Payoff,
        expiry: f64,
        vol: f64,
        exercise: ExerciseStyle,
    ) -> Self {
        Self {
            spot,
            strike,
            payoff,
            expiry,
            vol,
            exercise,
        }
    }

    /// Builds a European call.
    pub fn european_call(spot: f64, strike: f64, expiry: f64, vol: f64) -> Self {
        Self::new(spot, strike, Payoff::Call, expiry, vol, ExerciseStyle::European)
    }

    /// Builds a European put.
    pub fn european_put(spot: f64, strike: f64, expiry: f64, vol: f64) -> Self {
        Self::new(spot, strike, Payoff::Put, expiry, vol, ExerciseStyle::European)
    }

    /// Builds an American call.
    pub fn american_call(spot: f64, strike: f64, expiry: f64, vol: f64) -> Self {
        Self::new(spot, strike, Payoff::Call, expiry, vol, ExerciseStyle::American)
    }

    /// Builds an American put.
    ///
    /// # Examples
    /// ```
    /// use openferric_equity::instruments::OptionSpec;
    ///
    /// let put = OptionSpec::american_put(100.0, 100.0, 2.0, 0.3);
    /// assert!(put.exercise.is_american());
    /// ```
    pub fn american_put(spot: f64, strike: f64, expiry: f64, vol: f64) -> Self {
        Self::new(spot, strike, Payoff::Put, expiry, vol, ExerciseStyle::American)
    }

    #[inline]
    pub fn with_spot(self, spot: f64) -> Self {
        Self { spot, ..self }
    }

    #[inline]
    pub fn with_vol(self, vol: f64) -> Self {
        Self { vol, ..self }
    }

    #[inline]
    pub fn with_expiry(self, expiry: f64) -> Self {
        Self { expiry, ..self }
    }

    #[inline]
    pub fn with_payoff(self, payoff: Payoff) -> Self {
        Self { payoff, ..self }
    }

    #[inline]
    pub fn with_exercise(self, exercise: ExerciseStyle) -> Self {
        Self { exercise, ..self }
    }

    /// Call/put side, or a configuration error for digital and bond payoffs.
    #[inline]
    pub fn option_type(&self, engine: &str) -> Result<OptionType, PricingError> {
        self.payoff.require_vanilla(engine)
    }

    /// Payoff value at underlying level `s`.
    #[inline]
    pub fn intrinsic(&self, s: f64) -> f64 {
        self.payoff.intrinsic(s, self.strike)
    }

    /// Validates instrument fields.
    ///
    /// # Errors
    /// Returns [`PricingError::InvalidInput`] when:
    /// - `spot <= 0` or `strike <= 0`
    /// - `expiry < 0` or `vol < 0`
    /// - any field is not finite
    pub fn validate(&self) -> Result<(), PricingError> {
        if !self.spot.is_finite() || self.spot <= 0.0 {
            return Err(PricingError::input("option spot must be finite and > 0"));
        }
        if !self.strike.is_finite() || self.strike <= 0.0 {
            return Err(PricingError::input("option strike must be finite and > 0"));
        }
        if !self.expiry.is_finite() || self.expiry < 0.0 {
            return Err(PricingError::input("option expiry must be finite and >= 0"));
        }
        if !self.vol.is_finite() || self.vol < 0.0 {
            return Err(PricingError::input("option vol must be finite and >= 0"));
        }
        Ok(())
    }
}

impl Instrument for OptionSpec {
    fn instrument_type(&self) -> &str {
        "OptionSpec"
    }
}
