//! Path-dependent payoffs evaluated on a full vector of reset levels.
//!
//! The reset vector holds historical fixings first and simulated levels
//! after them, in schedule order. Every payoff is a pure function of that
//! vector.

use crate::core::{Instrument, OptionType, PricingError};
use crate::instruments::ResetSchedule;

/// Closed set of payoffs supported by the path pricer.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PathPayoff {
    /// `max(S1 (R_last - K), 0)` on the final reset.
    Vanilla { option_type: OptionType, strike: f64 },
    /// `max(mean(out window) / mean(in window) - K, 0)` where the in window is
    /// the first `in_count` resets and the out window the next `out_count`.
    AsianInOut {
        strike: f64,
        in_count: usize,
        out_count: usize,
    },
    /// `max(sum_i clamp(R_i / R_{i-1} - K, local_floor, local_cap), global_floor)`.
    Cliquet {
        strike: f64,
        local_cap: f64,
        local_floor: Option<f64>,
        global_floor: f64,
    },
}

impl PathPayoff {
    /// Payoff of one realised reset vector.
    pub fn evaluate(&self, resets: &[f64]) -> f64 {
        match *self {
            Self::Vanilla {
                option_type,
                strike,
            } => {
                let last = resets.last().copied().unwrap_or(0.0);
                (option_type.sign() * (last - strike)).max(0.0)
            }
            Self::AsianInOut {
                strike,
                in_count,
                out_count,
            } => {
                let avg_in = resets[..in_count].iter().sum::<f64>() / in_count as f64;
                let avg_out =
                    resets[in_count..in_count + out_count].iter().sum::<f64>() / out_count as f64;
                (avg_out / avg_in - strike).max(0.0)
            }
            Self::Cliquet {
                strike,
                local_cap,
                local_floor,
                global_floor,
            } => {
                let total: f64 = resets
                    .windows(2)
                    .map(|w| {
                        let ret = (w[1] / w[0] - strike).min(local_cap);
                        match local_floor {
                            Some(floor) => ret.max(floor),
                            None => ret,
                        }
                    })
                    .sum();
                total.max(global_floor)
            }
        }
    }

    /// Checks the payoff parameters against a schedule of `n_resets` dates.
    pub fn validate(&self, n_resets: usize) -> Result<(), PricingError> {
        match *self {
            Self::Vanilla { strike, .. } => {
                if !strike.is_finite() || strike < 0.0 {
                    return Err(PricingError::input("vanilla strike must be finite and >= 0"));
                }
            }
            Self::AsianInOut {
                strike,
                in_count,
                out_count,
            } => {
                if !strike.is_finite() {
                    return Err(PricingError::input("asian in/out strike must be finite"));
                }
                if in_count == 0 || out_count == 0 {
                    return Err(PricingError::input(
                        "asian in/out windows need at least one reset each",
                    ));
                }
                if in_count + out_count > n_resets {
                    return Err(PricingError::input(format!(
                        "asian in/out windows ({in_count} + {out_count}) exceed {n_resets} resets"
                    )));
                }
            }
            Self::Cliquet {
                strike,
                local_cap,
                local_floor,
                global_floor,
            } => {
                if !strike.is_finite() {
                    return Err(PricingError::input("cliquet strike must be finite"));
                }
                if local_cap.is_nan() || global_floor.is_nan() {
                    return Err(PricingError::input("cliquet cap and floor cannot be NaN"));
                }
                if let Some(floor) = local_floor {
                    if !(floor <= local_cap) {
                        return Err(PricingError::input("cliquet local floor exceeds local cap"));
                    }
                }
                if n_resets < 2 {
                    return Err(PricingError::input("cliquet needs at least two resets"));
                }
            }
        }
        Ok(())
    }
}

/// Path-dependent option: payoff, reset schedule and payment time.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PathOption {
    /// Underlying spot.
    pub spot: f64,
    /// Payment time in years, used for discounting.
    pub expiry: f64,
    pub payoff: PathPayoff,
    pub resets: ResetSchedule,
}

impl PathOption {
    pub fn new(spot: f64, expiry: f64, payoff: PathPayoff, resets: ResetSchedule) -> Self {
        Self {
            spot,
            expiry,
            payoff,
            resets,
        }
    }

    /// Validates instrument fields.
    pub fn validate(&self) -> Result<(), PricingError> {
        if !self.spot.is_finite() || self.spot <= 0.0 {
            return Err(PricingError::input("path option spot must be finite and > 0"));
        }
        if !self.expiry.is_finite() || self.expiry <= 0.0 {
            return Err(PricingError::input("path option expiry must be finite and > 0"));
        }
        if self.expiry < self.resets.last_time() {
            return Err(PricingError::input(
                "path option expiry must not be before the last reset",
            ));
        }
        if self.resets.future_count() == 0 {
            return Err(PricingError::input("path option needs at least one future reset"));
        }
        if let Some(first) = self.resets.future().first() {
            if !(first.vol > 0.0) {
                return Err(PricingError::input(
                    "vol to the first future reset must be > 0",
                ));
            }
        }
        self.payoff.validate(self.resets.len())
    }
}

impl Instrument for PathOption {
    fn instrument_type(&self) -> &str {
        "PathOption"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruments::ResetPoint;
    use approx::assert_relative_eq;

    #[test]
    fn cliquet_caps_each_period_and_floors_the_sum() {
        let payoff = PathPayoff::Cliquet {
            strike: 1.0,
            local_cap: 0.05,
            local_floor: None,
            global_floor: 0.0,
        };
        // Returns: +10% (capped to 5%), -2%, +3%.
        let resets = [100.0, 110.0, 107.8, 111.034];
        assert_relative_eq!(payoff.evaluate(&resets), 0.05 - 0.02 + 0.03, epsilon = 1e-12);

        let falling = [100.0, 80.0, 60.0];
        assert_eq!(payoff.evaluate(&falling), 0.0);

        let floored = PathPayoff::Cliquet {
            strike: 1.0,
            local_cap: 0.05,
            local_floor: Some(-0.1),
            global_floor: -1.0,
        };
        assert_relative_eq!(floored.evaluate(&falling), -0.1 - 0.1, epsilon = 1e-12);
    }

    #[test]
    fn asian_in_out_compares_window_averages() {
        let payoff = PathPayoff::AsianInOut {
            strike: 1.0,
            in_count: 2,
            out_count: 2,
        };
        let resets = [100.0, 102.0, 110.0, 114.0];
        assert_relative_eq!(payoff.evaluate(&resets), 112.0 / 101.0 - 1.0, epsilon = 1e-14);
        assert!(payoff.validate(3).is_err());
        assert!(payoff.validate(4).is_ok());
    }

    #[test]
    fn payment_before_the_last_reset_is_rejected() {
        let resets = ResetSchedule::new(vec![
            ResetPoint::future(91, 0.2),
            ResetPoint::future(182, 0.2),
        ])
        .unwrap();
        let payoff = PathPayoff::Vanilla {
            option_type: OptionType::Call,
            strike: 100.0,
        };
        let early = PathOption::new(100.0, 0.25, payoff, resets.clone());
        assert!(matches!(early.validate(), Err(PricingError::InvalidInput(_))));

        let on_last = PathOption::new(100.0, 182.0 / 365.0, payoff, resets);
        assert!(on_last.validate().is_ok());
    }

    #[test]
    fn vanilla_reads_the_final_reset() {
        let call = PathPayoff::Vanilla {
            option_type: OptionType::Call,
            strike: 100.0,
        };
        let put = PathPayoff::Vanilla {
            option_type: OptionType::Put,
            strike: 100.0,
        };
        assert_eq!(call.evaluate(&[90.0, 120.0]), 20.0);
        assert_eq!(put.evaluate(&[90.0, 120.0]), 0.0);
        assert_eq!(put.evaluate(&[120.0, 90.0]), 10.0);
    }
}
