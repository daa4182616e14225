//! Module `engines::tree::discrete_div_tree`.
//!
//! Recombining binomial tree on the dividend-stripped spot.
//!
//! References: Hull (11th ed.) Sec. 21.3 (known cash dividends), Jarrow-Rudd/CRR variants.
//!
//! The tree is built on `S* = S - PV(divs in (0, T])`. Node `(i, j)` holds
//! `S* u_i^j d_i^(i-j) + D_i`, where `D_i` is the value at step time `i dt` of the dividends still
//! to be paid before expiry, so option values see the cum-dividend spot while the stochastic part
//! stays recombining.
//!
//! Per-step moves follow the moment match `a = 1 + e^{(2r + σ²) dt}`,
//! `u = (a + sqrt(a² - 4 e^{2 r dt})) / (2 e^{r dt})`, `d = 1/u`, `p = (e^{r dt} - d) / (u - d)`.

use crate::core::PricingError;
use crate::market::MarketCurve;

/// Read contract a backward-induction pricer needs from a recombining tree.
pub trait RecombiningTree {
    /// Number of time steps.
    fn steps(&self) -> usize;

    /// Tree horizon in years.
    fn horizon(&self) -> f64;

    /// Volatility the tree was built with.
    fn vol(&self) -> f64;

    /// Underlying level at node `node` of step `step`.
    fn underlying(&self, step: usize, node: usize) -> f64;

    /// Up-move probability over step `step`.
    fn probability(&self, step: usize) -> f64;

    /// Continuously compounded rate over step `step`.
    fn rate(&self, step: usize) -> f64;

    /// Value at step `step` of the dividends still to be paid.
    fn dividend(&self, step: usize) -> f64;

    #[inline]
    fn dt(&self) -> f64 {
        self.horizon() / self.steps() as f64
    }
}

/// Binomial tree with discrete cash dividends.
#[derive(Debug, Clone)]
pub struct DiscreteDividendTree {
    steps: usize,
    horizon: f64,
    vol: f64,
    spot_star: f64,
    // Row-major lower triangle: step `i` occupies `i(i+1)/2 .. i(i+1)/2 + i + 1`.
    nodes: Vec<f64>,
    up: Vec<f64>,
    rates: Vec<f64>,
    dividends: Vec<f64>,
}

#[inline]
fn triangle_offset(step: usize) -> usize {
    step * (step + 1) / 2
}

impl DiscreteDividendTree {
    /// Builds the tree to `horizon` with `steps` steps.
    ///
    /// With `flat_rate` every step uses the `[0, T]` forward rate, otherwise
    /// each step reads its own forward from the curve.
    pub fn new(
        spot: f64,
        horizon: f64,
        vol: f64,
        steps: usize,
        flat_rate: bool,
        curve: &MarketCurve,
    ) -> Result<Self, PricingError> {
        if steps == 0 {
            return Err(PricingError::input("tree steps must be > 0"));
        }
        if !(horizon > 0.0) || !(vol > 0.0) {
            return Err(PricingError::input("tree horizon and vol must be > 0"));
        }
        let dt = horizon / steps as f64;

        let spot_star = spot - curve.present_value_of_dividends(0.0, horizon)?;
        if !(spot_star > 0.0) {
            return Err(PricingError::input(format!(
                "dividends to {horizon} exhaust spot {spot}"
            )));
        }

        let flat = if flat_rate {
            Some(curve.forward_rate(0.0, horizon)?)
        } else {
            None
        };
        let mut rates = Vec::with_capacity(steps);
        let mut up = Vec::with_capacity(steps);
        let mut dividends = vec![0.0; steps + 1];
        for i in 0..steps {
            let t = i as f64 * dt;
            let r = match flat {
                Some(r) => r,
                None => curve.forward_rate(t, t + dt)?,
            };
            let growth = (r * dt).exp();
            let a = 1.0 + ((2.0 * r + vol * vol) * dt).exp();
            up.push((a + (a * a - 4.0 * growth * growth).sqrt()) / (2.0 * growth));
            rates.push(r);

            let mut pv = 0.0;
            for div in curve.dividends().points_between(t, horizon) {
                let fwd = curve.forward_rate(t, div.time)?;
                pv += div.value * (-fwd * (div.time - t)).exp();
            }
            dividends[i] = pv;
        }

        let mut nodes = Vec::with_capacity(triangle_offset(steps + 1));
        nodes.push(spot_star + dividends[0]);
        for i in 1..=steps {
            let u = up[i - 1];
            let d = 1.0 / u;
            let mut level = spot_star * d.powi(i as i32);
            let ratio = u / d;
            for _ in 0..=i {
                nodes.push(level + dividends[i]);
                level *= ratio;
            }
        }

        Ok(Self {
            steps,
            horizon,
            vol,
            spot_star,
            nodes,
            up,
            rates,
            dividends,
        })
    }

    /// Spot net of the dividends paid before the horizon.
    #[inline]
    pub fn spot_star(&self) -> f64 {
        self.spot_star
    }
}

impl RecombiningTree for DiscreteDividendTree {
    #[inline]
    fn steps(&self) -> usize {
        self.steps
    }

    #[inline]
    fn horizon(&self) -> f64 {
        self.horizon
    }

    #[inline]
    fn vol(&self) -> f64 {
        self.vol
    }

    #[inline]
    fn underlying(&self, step: usize, node: usize) -> f64 {
        self.nodes[triangle_offset(step) + node]
    }

    #[inline]
    fn probability(&self, step: usize) -> f64 {
        let u = self.up[step];
        let d = 1.0 / u;
        ((self.rates[step] * self.dt()).exp() - d) / (u - d)
    }

    #[inline]
    fn rate(&self, step: usize) -> f64 {
        self.rates[step]
    }

    #[inline]
    fn dividend(&self, step: usize) -> f64 {
        self.dividends[step]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::DiscreteCurve;
    use approx::assert_relative_eq;

    #[test]
    fn tree_without_dividends_recombines_around_spot() {
        let curve = MarketCurve::flat(0.05).unwrap();
        let tree = DiscreteDividendTree::new(100.0, 1.0, 0.2, 50, true, &curve).unwrap();
        assert_relative_eq!(tree.underlying(0, 0), 100.0);
        assert_relative_eq!(tree.underlying(2, 1), 100.0, epsilon = 1e-10);
        let p = tree.probability(0);
        assert!(p > 0.0 && p < 1.0);

        // Martingale under the step rate.
        let dt = tree.dt();
        let expected = p * tree.underlying(1, 1) + (1.0 - p) * tree.underlying(1, 0);
        assert_relative_eq!(expected, 100.0 * (0.05 * dt).exp(), epsilon = 1e-10);
    }

    #[test]
    fn dividends_sit_on_top_of_the_stripped_spot() {
        let curve = MarketCurve::flat(0.03)
            .unwrap()
            .with_dividends(DiscreteCurve::from_days(&[100], &[3.0]).unwrap());
        let tree = DiscreteDividendTree::new(100.0, 1.0, 0.25, 100, false, &curve).unwrap();
        let pv = 3.0 * (-0.03_f64 * 100.0 / 365.0).exp();
        assert_relative_eq!(tree.spot_star(), 100.0 - pv, epsilon = 1e-12);
        assert_relative_eq!(tree.underlying(0, 0), 100.0, epsilon = 1e-12);
        assert_eq!(tree.dividend(99), 0.0);
        assert!(tree.dividend(10) > 0.0);
    }

    #[test]
    fn zero_vol_or_steps_are_rejected() {
        let curve = MarketCurve::flat(0.0).unwrap();
        assert!(DiscreteDividendTree::new(100.0, 1.0, 0.0, 10, true, &curve).is_err());
        assert!(DiscreteDividendTree::new(100.0, 1.0, 0.2, 0, true, &curve).is_err());
    }
}
