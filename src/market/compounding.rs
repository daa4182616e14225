//! Module `market::compounding`.
//!
//! Discount-factor and zero-rate conversions under periodic or continuous
//! compounding. A rate `r` quoted with period `p` (in years) discounts as
//! `(1 + r p)^(-t / p)`; the continuous case is the `p -> 0` limit `e^{-r t}`.

use std::str::FromStr;

use crate::core::PricingError;

/// Compounding frequency of a quoted zero rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compounding {
    #[default]
    Continuous,
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    SemiAnnual,
    Annual,
}

impl Compounding {
    /// Compounding period in years, zero for continuous.
    #[inline]
    pub fn period(self) -> f64 {
        match self {
            Self::Continuous => 0.0,
            Self::Daily => 1.0 / 365.0,
            Self::Weekly => 1.0 / 52.0,
            Self::Monthly => 1.0 / 12.0,
            Self::Quarterly => 0.25,
            Self::SemiAnnual => 0.5,
            Self::Annual => 1.0,
        }
    }
}

impl FromStr for Compounding {
    type Err = PricingError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "continuous" => Ok(Self::Continuous),
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "quarterly" => Ok(Self::Quarterly),
            "semiannual" | "semi_annual" => Ok(Self::SemiAnnual),
            "annual" => Ok(Self::Annual),
            other => Err(PricingError::config(format!(
                "unknown compounding frequency `{other}`"
            ))),
        }
    }
}

/// Discount factor for year fraction `t` at zero rate `rate`.
#[inline]
pub fn discount_factor(t: f64, rate: f64, compounding: Compounding) -> f64 {
    let p = compounding.period();
    if p == 0.0 {
        (-rate * t).exp()
    } else {
        (1.0 + rate * p).powf(-t / p)
    }
}

/// Zero rate implied by a discount factor; zero when `t <= 0`.
#[inline]
pub fn zero_rate_from_discount_factor(df: f64, t: f64, compounding: Compounding) -> f64 {
    if t <= 0.0 {
        return 0.0;
    }
    let p = compounding.period();
    if p == 0.0 {
        -df.ln() / t
    } else {
        (df.powf(-p / t) - 1.0) / p
    }
}

/// Continuously compounded equivalent of a quoted rate.
#[inline]
pub fn to_continuous_rate(rate: f64, compounding: Compounding) -> f64 {
    let p = compounding.period();
    if p == 0.0 {
        rate
    } else {
        (1.0 + rate * p).ln() / p
    }
}

/// Quoted rate with the given compounding equivalent to a continuous rate.
#[inline]
pub fn from_continuous_rate(rate: f64, compounding: Compounding) -> f64 {
    let p = compounding.period();
    if p == 0.0 {
        rate
    } else {
        ((rate * p).exp() - 1.0) / p
    }
}
