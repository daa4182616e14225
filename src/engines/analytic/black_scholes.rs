//! Module `engines::analytic::black_scholes`.
//!
//! Closed-form Black-Scholes pricing on the forward implied by a [`MarketCurve`].
//!
//! References: Black and Scholes (1973), Black (1976), Hull (11th ed.) Ch. 15 and 19.
//!
//! With `r = fwd(0, T)`, `F = (S - PV(divs)) e^{rT}` and `S1 = +1/-1` for calls/puts:
//! `d1 = (ln(F/K) + σ²T/2) / (σ√T)`, `d2 = d1 - σ√T`,
//! `price = S1 (F N(S1 d1) - K N(S1 d2)) e^{-rT}`.
//! Greeks use the continuous yield `q` equivalent to the discrete dividends over `[0, T]`.
//!
//! When to use: European calls and puts; American exercise and digital payoffs go to the lattice
//! or grid pricers.

use crate::core::{
    DiagKey, Diagnostics, ExerciseStyle, Greeks, OptionType, PricingEngine, PricingError,
    PricingResult,
};
use crate::instruments::OptionSpec;
use crate::market::{DAYS_PER_YEAR, MarketCurve};
use crate::math::{normal_cdf, normal_pdf};

/// Analytic Black-Scholes pricer for European vanilla options.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlackScholesPricer;

impl BlackScholesPricer {
    pub fn new() -> Self {
        Self
    }

    /// Prices against a continuous dividend yield `q` instead of the curve's
    /// discrete dividends. Rates still come from the curve.
    pub fn price_with_yield(
        &self,
        spec: &OptionSpec,
        curve: &MarketCurve,
        dividend_yield: f64,
    ) -> Result<PricingResult, PricingError> {
        let option_type = validate(spec)?;
        let rate = curve.forward_rate(0.0, spec.expiry)?;
        Ok(price_flat(option_type, spec, rate, dividend_yield))
    }
}

fn validate(spec: &OptionSpec) -> Result<OptionType, PricingError> {
    spec.validate()?;
    let option_type = spec.option_type("BlackScholesPricer")?;
    if spec.exercise != ExerciseStyle::European {
        return Err(PricingError::config(
            "BlackScholesPricer supports European exercise only",
        ));
    }
    Ok(option_type)
}

/// Undiscounted Black price on a forward.
///
/// Degenerate inputs (`forward <= 0`, `expiry <= 0` or `vol <= 0`) return the
/// forward intrinsic value.
#[inline]
pub fn black_price(option_type: OptionType, forward: f64, strike: f64, vol: f64, expiry: f64) -> f64 {
    let s1 = option_type.sign();
    if forward <= 0.0 || expiry <= 0.0 || vol <= 0.0 {
        return (s1 * (forward - strike)).max(0.0);
    }
    let (d1, d2) = d1_d2(forward, strike, vol, expiry);
    s1 * (forward * normal_cdf(s1 * d1) - strike * normal_cdf(s1 * d2))
}

#[inline]
fn d1_d2(forward: f64, strike: f64, vol: f64, expiry: f64) -> (f64, f64) {
    let sig_sqrt_t = vol * expiry.sqrt();
    let d1 = ((forward / strike).ln() + 0.5 * vol * vol * expiry) / sig_sqrt_t;
    (d1, d1 - sig_sqrt_t)
}

/// Price and Greeks at flat rate `r` and yield `q` over the option life.
///
/// Vega is per vol point, theta per calendar day, rho per rate point.
fn price_flat(option_type: OptionType, spec: &OptionSpec, rate: f64, dividend_yield: f64) -> PricingResult {
    let OptionSpec {
        spot,
        strike,
        expiry,
        vol,
        ..
    } = *spec;
    let s1 = option_type.sign();
    let mut diagnostics = Diagnostics::new();
    diagnostics.insert_key(DiagKey::Vol, vol);
    diagnostics.insert_key(DiagKey::ForwardRate, rate);

    if expiry <= 0.0 {
        return PricingResult {
            price: spec.intrinsic(spot),
            greeks: Some(Greeks::default()),
            diagnostics,
            ..PricingResult::default()
        };
    }

    let df_r = (-rate * expiry).exp();
    let df_q = (-dividend_yield * expiry).exp();
    let forward = spot * df_q / df_r;
    diagnostics.insert_key(DiagKey::Forward, forward);
    diagnostics.insert_key(DiagKey::DiscountFactor, df_r);

    if vol <= 0.0 {
        let itm = s1 * (forward - strike) > 0.0;
        let price = (s1 * (forward - strike)).max(0.0) * df_r;
        let greeks = Greeks {
            delta: if itm { s1 * df_q } else { 0.0 },
            theta: if itm {
                s1 * (dividend_yield * spot * df_q - rate * strike * df_r) / DAYS_PER_YEAR
            } else {
                0.0
            },
            rho: if itm { s1 * strike * expiry * df_r * 0.01 } else { 0.0 },
            ..Greeks::default()
        };
        return PricingResult {
            price,
            greeks: Some(greeks),
            diagnostics,
            ..PricingResult::default()
        };
    }

    let (d1, d2) = d1_d2(forward, strike, vol, expiry);
    diagnostics.insert_key(DiagKey::D1, d1);
    diagnostics.insert_key(DiagKey::D2, d2);

    let sqrt_t = expiry.sqrt();
    let nd1 = normal_cdf(s1 * d1);
    let nd2 = normal_cdf(s1 * d2);
    let pdf = normal_pdf(d1);

    let price = s1 * (forward * nd1 - strike * nd2) * df_r;
    let delta = s1 * df_q * nd1;
    let gamma = df_q * pdf / (spot * vol * sqrt_t);
    let vega = spot * df_q * pdf * sqrt_t;
    let theta = -spot * df_q * pdf * vol / (2.0 * sqrt_t)
        + s1 * (dividend_yield * spot * df_q * nd1 - rate * strike * df_r * nd2);
    let rho = s1 * strike * expiry * df_r * nd2;

    PricingResult {
        price,
        greeks: Some(Greeks {
            delta,
            gamma,
            vega: vega * 0.01,
            theta: theta / DAYS_PER_YEAR,
            rho: rho * 0.01,
        }),
        diagnostics,
        ..PricingResult::default()
    }
}

impl PricingEngine<OptionSpec> for BlackScholesPricer {
    #[tracing::instrument(skip_all, fields(engine = "black_scholes", expiry = spec.expiry))]
    fn price(&self, spec: &OptionSpec, curve: &MarketCurve) -> Result<PricingResult, PricingError> {
        let option_type = validate(spec)?;
        let rate = curve.forward_rate(0.0, spec.expiry)?;
        let dividend_yield = curve.dividend_yield(spec.spot, spec.expiry)?;
        let mut result = price_flat(option_type, spec, rate, dividend_yield);
        let pv = curve.present_value_of_dividends(0.0, spec.expiry)?;
        result.diagnostics.insert_key(DiagKey::DividendPv, pv);
        tracing::debug!(price = result.price, rate, dividend_yield, "analytic price");
        Ok(result)
    }
}
