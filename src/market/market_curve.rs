//! Module `market::market_curve`.
//!
//! Rate and dividend term structures shared read-only by every engine.
//!
//! References:
//! - Hull, *Options, Futures, and Other Derivatives* (11th ed.), Ch. 4 and 15.
//!
//! Conventions:
//! - zero rates are continuously compounded and read through [`DiscreteCurve::value_at`],
//! - `fwd(t1, t2) = (r(t2) t2 - r(t1) t1) / (t2 - t1)`, zero when `t1 == t2`,
//! - dividend PV over `(t1, t2]` discounts each cash amount to valuation with `e^{-r(t) t}`,
//! - implied yield `q(t) = -ln(1 - PV(0, t) / S) / t`, forward yields are differenced like rates,
//! - forward price `F(t) = (S - PV(0, t)) / DF(t)`.

use chrono::NaiveDate;

use crate::core::PricingError;
use crate::market::curve::{DAYS_PER_YEAR, DiscreteCurve, TermPoint};

// Round-off allowance on times produced by backward stepping.
const TIME_TOLERANCE: f64 = 1.0e-12;

#[derive(serde::Deserialize)]
struct MarketCurveData {
    rates: DiscreteCurve,
    #[serde(default)]
    dividends: DiscreteCurve,
}

/// Zero-rate curve plus discrete cash-dividend schedule.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "MarketCurveData")]
pub struct MarketCurve {
    rates: DiscreteCurve,
    dividends: DiscreteCurve,
}

impl TryFrom<MarketCurveData> for MarketCurve {
    type Error = PricingError;

    fn try_from(data: MarketCurveData) -> Result<Self, Self::Error> {
        Self::new(data.rates, data.dividends)
    }
}

#[inline]
fn check_time(t: f64) -> Result<f64, PricingError> {
    if !t.is_finite() || t < -TIME_TOLERANCE {
        return Err(PricingError::curve(format!(
            "time must be finite and >= 0, got {t}"
        )));
    }
    Ok(t.max(0.0))
}

impl MarketCurve {
    /// Builds the market view. The rate curve needs at least one knot; the
    /// dividend curve may be empty.
    pub fn new(rates: DiscreteCurve, dividends: DiscreteCurve) -> Result<Self, PricingError> {
        if rates.is_empty() {
            return Err(PricingError::curve("rate curve needs at least one knot"));
        }
        Ok(Self { rates, dividends })
    }

    /// Builds both curves from parallel day/value arrays. Dividends paid on or
    /// before the valuation day are dropped.
    pub fn from_days(
        rate_days: &[i32],
        rates: &[f64],
        dividend_days: &[i32],
        dividend_amounts: &[f64],
    ) -> Result<Self, PricingError> {
        let rates = DiscreteCurve::from_days(rate_days, rates)?;
        if dividend_days.len() != dividend_amounts.len() {
            return Err(PricingError::curve(format!(
                "dividend day and amount arrays differ in length ({} vs {})",
                dividend_days.len(),
                dividend_amounts.len()
            )));
        }
        let (days, amounts): (Vec<i32>, Vec<f64>) = dividend_days
            .iter()
            .zip(dividend_amounts)
            .filter(|(d, _)| **d > 0)
            .map(|(d, a)| (*d, *a))
            .unzip();
        let dividends = DiscreteCurve::from_days(&days, &amounts)?;
        Self::new(rates, dividends)
    }

    /// Builds both curves from calendar dates relative to `valuation`.
    pub fn from_dates(
        valuation: NaiveDate,
        rate_dates: &[NaiveDate],
        rates: &[f64],
        dividend_dates: &[NaiveDate],
        dividend_amounts: &[f64],
    ) -> Result<Self, PricingError> {
        let to_days = |dates: &[NaiveDate]| -> Result<Vec<i32>, PricingError> {
            dates
                .iter()
                .map(|d| {
                    let days = (*d - valuation).num_days();
                    i32::try_from(days)
                        .map_err(|_| PricingError::curve(format!("date {d} is out of range")))
                })
                .collect()
        };
        Self::from_days(
            &to_days(rate_dates)?,
            rates,
            &to_days(dividend_dates)?,
            dividend_amounts,
        )
    }

    /// Flat continuously compounded rate with no dividends.
    pub fn flat(rate: f64) -> Result<Self, PricingError> {
        Self::new(DiscreteCurve::flat(rate)?, DiscreteCurve::empty())
    }

    pub fn with_dividends(mut self, dividends: DiscreteCurve) -> Self {
        self.dividends = dividends;
        self
    }

    #[inline]
    pub fn rates(&self) -> &DiscreteCurve {
        &self.rates
    }

    #[inline]
    pub fn dividends(&self) -> &DiscreteCurve {
        &self.dividends
    }

    /// Interpolated continuously compounded zero rate at `t`.
    pub fn zero_rate(&self, t: f64) -> Result<f64, PricingError> {
        let t = check_time(t)?;
        Ok(self.rates.value_at(t))
    }

    /// Annualized forward rate over `[t1, t2]`.
    pub fn forward_rate(&self, t1: f64, t2: f64) -> Result<f64, PricingError> {
        let t1 = check_time(t1)?;
        let t2 = check_time(t2)?;
        Ok(forward_from_cumulative(
            t1,
            self.rates.value_at(t1) * t1,
            t2,
            self.rates.value_at(t2) * t2,
        ))
    }

    /// Discount factor from valuation to `t`.
    pub fn discount_factor(&self, t: f64) -> Result<f64, PricingError> {
        let t = check_time(t)?;
        Ok((-self.rates.value_at(t) * t).exp())
    }

    /// Discount factor from `t2` back to `t1`.
    pub fn discount_factor_between(&self, t1: f64, t2: f64) -> Result<f64, PricingError> {
        let fwd = self.forward_rate(t1, t2)?;
        Ok((-fwd * (t2 - t1)).exp())
    }

    /// Present value at valuation of the dividends paid in `(t1, t2]`.
    pub fn present_value_of_dividends(&self, t1: f64, t2: f64) -> Result<f64, PricingError> {
        let t1 = check_time(t1)?;
        let t2 = check_time(t2)?;
        Ok(self
            .dividends
            .points_between(t1, t2)
            .map(|p| p.value * (-self.rates.value_at(p.time) * p.time).exp())
            .sum())
    }

    /// Present value at valuation of an arbitrary payment stream, counting
    /// payments in `(0, horizon]`.
    pub fn present_value_of_cashflows(
        &self,
        flows: &[TermPoint],
        horizon: f64,
    ) -> Result<f64, PricingError> {
        let horizon = check_time(horizon)?;
        let mut pv = 0.0;
        for flow in flows.iter().filter(|f| f.time > 0.0 && f.time <= horizon) {
            pv += flow.value * self.discount_factor(flow.time)?;
        }
        Ok(pv)
    }

    /// Continuous yield equivalent to the dividends paid in `(0, t]`.
    pub fn dividend_yield(&self, spot: f64, t: f64) -> Result<f64, PricingError> {
        let t = check_time(t)?;
        if t <= 0.0 {
            return Ok(0.0);
        }
        let pv = self.present_value_of_dividends(0.0, t)?;
        let remaining = 1.0 - pv / spot;
        if !(remaining > 0.0) {
            return Err(PricingError::input(format!(
                "dividends to t={t} (PV {pv}) exhaust spot {spot}"
            )));
        }
        Ok(-remaining.ln() / t)
    }

    /// Annualized forward dividend yield over `[t1, t2]`.
    pub fn forward_dividend_yield(&self, spot: f64, t1: f64, t2: f64) -> Result<f64, PricingError> {
        let q1 = self.dividend_yield(spot, t1)?;
        let q2 = self.dividend_yield(spot, t2)?;
        Ok(forward_from_cumulative(t1.max(0.0), q1 * t1.max(0.0), t2.max(0.0), q2 * t2.max(0.0)))
    }

    /// Continuous yields implied by the dividend schedule at each horizon.
    pub fn equivalent_yields(&self, spot: f64, horizons: &[f64]) -> Result<Vec<f64>, PricingError> {
        horizons
            .iter()
            .map(|&t| self.dividend_yield(spot, t))
            .collect()
    }

    /// Forward price of the underlying for delivery at `t`.
    pub fn forward_price(&self, spot: f64, t: f64) -> Result<f64, PricingError> {
        let pv = self.present_value_of_dividends(0.0, t)?;
        Ok((spot - pv) / self.discount_factor(t)?)
    }

    /// Forward price at `t2` seen from `t1`, scaled so that `t1 = 0` gives
    /// [`MarketCurve::forward_price`].
    pub fn forward_price_between(&self, spot: f64, t1: f64, t2: f64) -> Result<f64, PricingError> {
        let f1 = self.forward_price(spot, t1)?;
        let f2 = self.forward_price(spot, t2)?;
        Ok(f2 / f1 * spot)
    }

    /// Copy with every rate and dividend knot moved by `dt`.
    ///
    /// Rate knots pushed below zero collapse onto zero; dividends that land on
    /// or before valuation are treated as paid and dropped.
    pub fn shifted(&self, dt: f64) -> Self {
        Self {
            rates: self.rates.shifted(dt),
            dividends: self.dividends.shifted(dt).after(0.0),
        }
    }

    /// Same as [`MarketCurve::shifted`] with the shift given in days.
    pub fn shifted_days(&self, days: f64) -> Self {
        self.shifted(days / DAYS_PER_YEAR)
    }
}

#[inline]
fn forward_from_cumulative(t1: f64, c1: f64, t2: f64, c2: f64) -> f64 {
    if t1 == t2 { 0.0 } else { (c2 - c1) / (t2 - t1) }
}
