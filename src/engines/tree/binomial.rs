//! Module `engines::tree::binomial`.
//!
//! Backward induction on a [`DiscreteDividendTree`] for European and American calls and puts.
//!
//! References: Hull (11th ed.) Ch. 13 and Sec. 21.3, Cox-Ross-Rubinstein (1979),
//! Broadie-Detemple (1996) for the smoothing step.
//!
//! Key types and purpose: `LatticePricer` prices an [`OptionSpec`] and reports finite-difference
//! Greeks; `implied_vol` inverts the lattice price.
//!
//! Numerical considerations: at step `N-1` the three nodes nearest the strike can be replaced by
//! one-period Black-Scholes values, which removes most of the odd/even oscillation in gamma.
//! Delta and gamma come from step 2 of a tree with two extra steps whose step 2 lands on the
//! valuation date. Vega bumps vol by 1% relative and theta rolls the curves forward one day.
//!
//! When to use: American exercise with discrete cash dividends; use the analytic pricer for
//! European options when speed matters.

use crate::core::{
    DiagKey, Diagnostics, Greeks, LatticeSettings, OptionType, PricingEngine, PricingError,
    PricingResult,
};
use crate::engines::analytic::black_price;
use crate::engines::tree::discrete_div_tree::{DiscreteDividendTree, RecombiningTree};
use crate::instruments::OptionSpec;
use crate::market::{DAYS_PER_YEAR, MarketCurve};

const IMPLIED_VOL_MAX_ITERATIONS: usize = 120;

/// Binomial lattice pricer with discrete dividends.
#[derive(Debug, Clone)]
pub struct LatticePricer {
    /// Number of tree steps.
    pub steps: usize,
    /// Replace the values nearest the strike at step `N-1` with Black-Scholes values.
    pub smoothing: bool,
    /// Use one `[0, T]` forward rate on every step.
    pub flat_rate: bool,
}

impl Default for LatticePricer {
    fn default() -> Self {
        Self::from_settings(&LatticeSettings::default())
    }
}

impl LatticePricer {
    /// Creates a pricer with the given number of steps and default switches.
    pub fn new(steps: usize) -> Self {
        Self {
            steps,
            ..Self::default()
        }
    }

    pub fn from_settings(settings: &LatticeSettings) -> Self {
        Self {
            steps: settings.steps,
            smoothing: settings.smoothing,
            flat_rate: settings.flat_rate,
        }
    }

    pub fn with_steps(mut self, steps: usize) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_smoothing(mut self, smoothing: bool) -> Self {
        self.smoothing = smoothing;
        self
    }

    pub fn with_flat_rate(mut self, flat_rate: bool) -> Self {
        self.flat_rate = flat_rate;
        self
    }

    fn check(&self, spec: &OptionSpec) -> Result<OptionType, PricingError> {
        spec.validate()?;
        if self.steps < 3 {
            return Err(PricingError::input("lattice steps must be at least 3"));
        }
        let option_type = spec.option_type("LatticePricer")?;
        if spec.expiry > 0.0 && spec.vol <= 0.0 {
            return Err(PricingError::input("lattice vol must be > 0"));
        }
        Ok(option_type)
    }

    /// Price only, no Greeks.
    pub fn price_value(&self, spec: &OptionSpec, curve: &MarketCurve) -> Result<f64, PricingError> {
        let option_type = self.check(spec)?;
        self.reprice(option_type, spec, curve)
    }

    fn reprice(
        &self,
        option_type: OptionType,
        spec: &OptionSpec,
        curve: &MarketCurve,
    ) -> Result<f64, PricingError> {
        if spec.expiry <= 0.0 {
            return Ok(spec.intrinsic(spec.spot));
        }
        let tree = DiscreteDividendTree::new(
            spec.spot,
            spec.expiry,
            spec.vol,
            self.steps,
            self.flat_rate,
            curve,
        )?;
        let values = self.induct(&tree, option_type, spec, 0);
        Ok(values[0])
    }

    /// Backward induction down to step `stop`; returns the `stop + 1` values at that step.
    fn induct<T: RecombiningTree>(
        &self,
        tree: &T,
        option_type: OptionType,
        spec: &OptionSpec,
        stop: usize,
    ) -> Vec<f64> {
        let n = tree.steps();
        let dt = tree.dt();
        let s1 = option_type.sign();
        let strike = spec.strike;
        let american = spec.exercise.is_american();
        let exercise = |s: f64| (s1 * (s - strike)).max(0.0);

        let mut values: Vec<f64> = (0..=n).map(|j| exercise(tree.underlying(n, j))).collect();

        for i in (stop..n).rev() {
            let p = tree.probability(i);
            let disc = (-tree.rate(i) * dt).exp();
            for j in 0..=i {
                let continuation = disc * (p * values[j + 1] + (1.0 - p) * values[j]);
                values[j] = if american {
                    continuation.max(exercise(tree.underlying(i, j)))
                } else {
                    continuation
                };
            }
            if i == n - 1 && self.smoothing {
                smooth(tree, option_type, strike, &mut values);
            }
        }
        values.truncate(stop + 1);
        values
    }

    /// Delta and gamma from step 2 of a tree with two extra steps.
    fn delta_gamma(
        &self,
        option_type: OptionType,
        spec: &OptionSpec,
        curve: &MarketCurve,
    ) -> Result<(f64, f64), PricingError> {
        let n = self.steps;
        let dt = spec.expiry / n as f64;
        let refined = self.clone().with_steps(n + 2);
        let shifted = curve.shifted(2.0 * dt);
        let tree = DiscreteDividendTree::new(
            spec.spot,
            spec.expiry * (n + 2) as f64 / n as f64,
            spec.vol,
            n + 2,
            self.flat_rate,
            &shifted,
        )?;
        let c = refined.induct(&tree, option_type, spec, 2);
        let s = [
            tree.underlying(2, 0),
            tree.underlying(2, 1),
            tree.underlying(2, 2),
        ];
        Ok(three_point_delta_gamma(s, [c[0], c[1], c[2]]))
    }

    /// Solves for the vol that reproduces `target`.
    ///
    /// Each iteration takes a finite-difference slope over `step` and moves to
    /// its root. Fails on a flat slope, a negative vol, or after 120 iterations.
    pub fn implied_vol(
        &self,
        spec: &OptionSpec,
        curve: &MarketCurve,
        target: f64,
        initial_vol: f64,
        tolerance: f64,
        step: f64,
    ) -> Result<f64, PricingError> {
        let option_type = self.check(&spec.with_vol(initial_vol))?;
        let mut vol = initial_vol;
        let mut f = self.reprice(option_type, &spec.with_vol(vol), curve)? - target;
        for _ in 0..IMPLIED_VOL_MAX_ITERATIONS {
            if f.abs() < tolerance {
                return Ok(vol);
            }
            let f1 = self.reprice(option_type, &spec.with_vol(vol + step), curve)? - target;
            if f1 == f {
                return Err(PricingError::NumericalNonConvergence(format!(
                    "lattice price is flat in vol at {vol}"
                )));
            }
            vol -= f * step / (f1 - f);
            if !(vol > 0.0) {
                return Err(PricingError::NumericalNonConvergence(
                    "lattice implied vol went negative".to_string(),
                ));
            }
            f = self.reprice(option_type, &spec.with_vol(vol), curve)? - target;
        }
        tracing::warn!(vol, residual = f, "lattice implied vol hit iteration cap");
        Err(PricingError::NumericalNonConvergence(format!(
            "lattice implied vol did not converge in {IMPLIED_VOL_MAX_ITERATIONS} iterations"
        )))
    }
}

/// Replaces the values of the three nodes nearest the strike at step `N-1`
/// with one-period Black-Scholes values on the ex-dividend forward.
fn smooth<T: RecombiningTree>(tree: &T, option_type: OptionType, strike: f64, values: &mut [f64]) {
    let n = tree.steps();
    let idx = n - 1;
    let dt = tree.dt();
    let r = tree.rate(idx);

    // First node whose pair straddles or exceeds the strike.
    let mut k = 1;
    while k <= n - 1 && tree.underlying(idx, k - 1) <= strike && tree.underlying(idx, k) <= strike {
        k += 1;
    }
    let centre = if k == 1 {
        2
    } else if k >= n - 1 {
        n - 2
    } else if (tree.underlying(idx, k - 2) / strike - 1.0).abs()
        > (tree.underlying(idx, k + 1) / strike - 1.0).abs()
    {
        k
    } else {
        k - 1
    };
    let centre = centre.min(n - 2);

    let disc = (-r * dt).exp();
    for j in centre - 1..=centre + 1 {
        let forward = (tree.underlying(idx, j) - tree.dividend(idx)) / disc;
        values[j] = black_price(option_type, forward, strike, tree.vol(), dt) * disc;
    }
}

/// Slope and curvature of the parabola through three `(s, c)` points.
#[inline]
fn three_point_delta_gamma(s: [f64; 3], c: [f64; 3]) -> (f64, f64) {
    let denom = (s[1] - s[0]) * (s[2] - s[0]) * (s[2] - s[1]);
    let delta = (s[0] * (2.0 * s[1] - s[0]) * (c[1] - c[2])
        + s[1] * s[1] * (c[2] - c[0])
        + s[2] * (2.0 * s[1] - s[2]) * (c[0] - c[1]))
        / denom;
    let gamma = 2.0 * (s[0] * (c[1] - c[2]) + s[1] * (c[2] - c[0]) + s[2] * (c[0] - c[1])) / denom;
    (delta, gamma)
}

impl PricingEngine<OptionSpec> for LatticePricer {
    #[tracing::instrument(skip_all, fields(engine = "lattice", steps = self.steps))]
    fn price(&self, spec: &OptionSpec, curve: &MarketCurve) -> Result<PricingResult, PricingError> {
        let option_type = self.check(spec)?;

        let mut diagnostics = Diagnostics::new();
        diagnostics.insert_key(DiagKey::NumSteps, self.steps as f64);
        diagnostics.insert_key(DiagKey::Vol, spec.vol);

        if spec.expiry <= 0.0 {
            return Ok(PricingResult {
                price: spec.intrinsic(spec.spot),
                greeks: Some(Greeks::default()),
                diagnostics,
                ..PricingResult::default()
            });
        }

        let price = self.reprice(option_type, spec, curve)?;
        let (delta, gamma) = self.delta_gamma(option_type, spec, curve)?;

        let vega = {
            let up = self.reprice(option_type, &spec.with_vol(1.01 * spec.vol), curve)?;
            let down = self.reprice(option_type, &spec.with_vol(0.99 * spec.vol), curve)?;
            0.01 * (up - down) / (0.02 * spec.vol)
        };

        let theta = {
            let rolled = spec.with_expiry((spec.expiry - 1.0 / DAYS_PER_YEAR).max(0.0));
            self.reprice(option_type, &rolled, &curve.shifted_days(-1.0))? - price
        };

        diagnostics.insert_key(
            DiagKey::DividendPv,
            curve.present_value_of_dividends(0.0, spec.expiry)?,
        );
        tracing::debug!(price, delta, gamma, "lattice price");

        Ok(PricingResult {
            price,
            greeks: Some(Greeks {
                delta,
                gamma,
                vega,
                theta,
                rho: 0.0,
            }),
            diagnostics,
            ..PricingResult::default()
        })
    }
}
