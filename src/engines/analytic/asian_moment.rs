//! Module `engines::analytic::asian_moment`.
//!
//! Moment-matching approximation for discretely averaged (average-price) options.
//!
//! References: Levy (1992), Curran (1994), Haug (2007) Sec. 4.20.
//!
//! The unobserved part of the average is replaced by a lognormal with the same first two
//! moments. With forwards `F_i` and spot vols `σ_i` to each future reset `t_i`:
//! `M1 = Σ F_i`, `M2 = Σ_i F_i (F_i + 2 Σ_{j>i} F_j) e^{σ_i² t_i}`,
//! `σ_A² = ln(M2 / M1²) / t_n`.
//! Fixings already observed move into an adjusted strike
//! `K' = (n K - Σ fixings) / m` on the `m` remaining resets, and the result is scaled by `m / n`.
//!
//! A non-positive adjusted strike means a call is certain to finish in the money. The option
//! is then priced at a floor strike `ε` with `|K'|` added back as a bond, and a put at `ε` alone.

use crate::core::{DiagKey, Diagnostics, OptionType, PricingEngine, PricingError, PricingResult};
use crate::engines::analytic::black_scholes::black_price;
use crate::instruments::AsianOption;
use crate::market::MarketCurve;

/// Floor applied to a non-positive adjusted strike.
pub const STRIKE_FLOOR: f64 = 1.0e-8;

/// Closed-form average-price pricer.
#[derive(Debug, Clone, Copy, Default)]
pub struct AsianMomentPricer;

impl AsianMomentPricer {
    pub fn new() -> Self {
        Self
    }
}

/// Matched lognormal of the remaining average.
#[derive(Debug, Clone, Copy, PartialEq)]
struct MatchedAverage {
    forward: f64,
    vol: f64,
    expiry: f64,
}

fn match_moments(forwards: &[f64], times: &[f64], vols: &[f64]) -> MatchedAverage {
    let m = forwards.len();
    let mut f_sum = 0.0;
    let mut v_sum = 0.0;
    for i in (0..m).rev() {
        let f = forwards[i];
        v_sum += f * (f + 2.0 * f_sum) * (vols[i] * vols[i] * times[i]).exp();
        f_sum += f;
    }
    let expiry = times[m - 1];
    let variance = (v_sum / (f_sum * f_sum)).ln().max(0.0);
    MatchedAverage {
        forward: f_sum / m as f64,
        vol: (variance / expiry).sqrt(),
        expiry,
    }
}

impl PricingEngine<AsianOption> for AsianMomentPricer {
    #[tracing::instrument(skip_all, fields(engine = "asian_moment", resets = option.resets.len()))]
    fn price(&self, option: &AsianOption, curve: &MarketCurve) -> Result<PricingResult, PricingError> {
        option.validate()?;

        let n = option.resets.len();
        let m = option.resets.future_count();
        let s1 = option.option_type.sign();
        let df = curve.discount_factor(option.expiry)?;
        let mut diagnostics = Diagnostics::new();
        diagnostics.insert_key(DiagKey::DiscountFactor, df);

        // Strike on the unobserved part of the average.
        let owed = option.strike * n as f64 - option.resets.fixed_sum();
        if m == 0 {
            let price = (-s1 * df * owed / n as f64).max(0.0);
            diagnostics.insert_key(DiagKey::AdjustedStrike, owed / n as f64);
            tracing::debug!(price, "fully fixed average");
            return Ok(PricingResult {
                price,
                diagnostics,
                ..PricingResult::default()
            });
        }
        let adjusted_strike = owed / m as f64;

        let times = option.resets.future_times();
        let vols = option.resets.future_vols();
        let forwards = times
            .iter()
            .map(|&t| curve.forward_price(option.spot, t))
            .collect::<Result<Vec<_>, _>>()?;
        let matched = match_moments(&forwards, &times, &vols);

        let undiscounted = if adjusted_strike > 0.0 {
            black_price(
                option.option_type,
                matched.forward,
                adjusted_strike,
                matched.vol,
                matched.expiry,
            )
        } else {
            tracing::warn!(
                adjusted_strike,
                "non-positive adjusted strike, pricing at floor strike"
            );
            let floored = black_price(
                option.option_type,
                matched.forward,
                STRIKE_FLOOR,
                matched.vol,
                matched.expiry,
            );
            match option.option_type {
                OptionType::Call => floored + adjusted_strike.abs(),
                OptionType::Put => floored,
            }
        };
        let price = df * m as f64 / n as f64 * undiscounted;

        diagnostics.insert_key(DiagKey::AdjustedStrike, adjusted_strike);
        diagnostics.insert_key(DiagKey::Forward, matched.forward);
        diagnostics.insert_key(DiagKey::Vol, matched.vol);
        tracing::debug!(price, fixed = n - m, "asian moment price");
        Ok(PricingResult {
            price,
            diagnostics,
            ..PricingResult::default()
        })
    }
}
