//! Engine trait, result payloads and inline diagnostics.

use crate::core::PricingError;
use crate::market::MarketCurve;

/// Price sensitivities reported by the engines.
///
/// Every engine reports the same units: vega per volatility point (0.01),
/// theta per calendar day (1/365) and rho per rate point (0.01).
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct Greeks {
    /// `dV/dS`.
    pub delta: f64,
    /// `d²V/dS²`.
    pub gamma: f64,
    /// Change for a one-point vol move.
    pub vega: f64,
    /// Change over one calendar day.
    pub theta: f64,
    /// Change for a one-point rate move.
    pub rho: f64,
}

/// Standard errors of simulated Greeks, aligned field by field with [`Greeks`].
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct GreekErrors {
    pub delta: f64,
    pub gamma: f64,
    pub vega: f64,
    pub theta: f64,
    pub rho: f64,
}

/// Anything an engine can price.
pub trait Instrument: std::fmt::Debug {
    /// Short type name used in logs.
    fn instrument_type(&self) -> &str;
}

/// Prices instruments of type `I` against a [`MarketCurve`].
pub trait PricingEngine<I: Instrument> {
    /// Prices an instrument against read-only rate and dividend curves.
    fn price(&self, instrument: &I, curve: &MarketCurve) -> Result<PricingResult, PricingError>;
}

/// Compact key set for engine diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagKey {
    AdjustedStrike,
    D1,
    D2,
    DiscountFactor,
    DividendPv,
    Forward,
    ForwardRate,
    NumNodes,
    NumPaths,
    NumSteps,
    NumTimeSteps,
    SorSweeps,
    Vol,
}

const DIAG_CAPACITY: usize = 8;

const DIAG_NAMES: [(DiagKey, &str); 13] = [
    (DiagKey::AdjustedStrike, "adjusted_strike"),
    (DiagKey::D1, "d1"),
    (DiagKey::D2, "d2"),
    (DiagKey::DiscountFactor, "discount_factor"),
    (DiagKey::DividendPv, "dividend_pv"),
    (DiagKey::Forward, "forward"),
    (DiagKey::ForwardRate, "forward_rate"),
    (DiagKey::NumNodes, "num_nodes"),
    (DiagKey::NumPaths, "num_paths"),
    (DiagKey::NumSteps, "num_steps"),
    (DiagKey::NumTimeSteps, "num_time_steps"),
    (DiagKey::SorSweeps, "sor_sweeps"),
    (DiagKey::Vol, "vol"),
];

impl DiagKey {
    /// Snake-case name used in logs and lookups.
    #[inline]
    pub fn as_str(self) -> &'static str {
        DIAG_NAMES
            .iter()
            .find_map(|&(key, name)| (key == self).then_some(name))
            .unwrap_or("unknown")
    }
}

impl std::str::FromStr for DiagKey {
    type Err = ();

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        DIAG_NAMES
            .iter()
            .find_map(|&(key, name)| (name == raw).then_some(key))
            .ok_or(())
    }
}

/// Fixed-capacity diagnostics attached to a [`PricingResult`].
///
/// Entries keep insertion order; once [`Diagnostics::CAPACITY`] distinct keys
/// are stored, new keys are dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Diagnostics {
    slots: [Option<(DiagKey, f64)>; DIAG_CAPACITY],
    used: usize,
}

impl Diagnostics {
    pub const CAPACITY: usize = DIAG_CAPACITY;

    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.used
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.used == 0
    }

    /// Stores `value` under `key` and returns the value it replaced.
    pub fn insert_key(&mut self, key: DiagKey, value: f64) -> Option<f64> {
        let mut stored = self.slots[..self.used].iter_mut().flatten();
        if let Some(slot) = stored.find(|entry| entry.0 == key) {
            return Some(std::mem::replace(&mut slot.1, value));
        }
        if self.used == Self::CAPACITY {
            tracing::debug!(key = key.as_str(), "diagnostics capacity exceeded");
            return None;
        }
        self.slots[self.used] = Some((key, value));
        self.used += 1;
        None
    }

    pub fn get_key(&self, key: DiagKey) -> Option<f64> {
        self.iter_stored()
            .find_map(|&(k, v)| (k == key).then_some(v))
    }

    /// Lookup by snake-case name.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.get_key(name.parse().ok()?)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        self.iter_stored().map(|&(k, v)| (k.as_str(), v))
    }

    fn iter_stored(&self) -> impl Iterator<Item = &(DiagKey, f64)> {
        self.slots[..self.used].iter().flatten()
    }
}

/// Unified engine result payload.
#[derive(Debug, Clone, Default)]
pub struct PricingResult {
    /// Present value.
    pub price: f64,
    /// Standard error (Monte Carlo only).
    pub stderr: Option<f64>,
    /// Greeks when available from the engine.
    pub greeks: Option<Greeks>,
    /// Standard errors of the Greeks (Monte Carlo only).
    pub greek_errors: Option<GreekErrors>,
    /// Engine-specific scalar diagnostics.
    pub diagnostics: Diagnostics,
}

impl PricingResult {
    /// Result with a price and nothing else.
    pub fn price_only(price: f64) -> Self {
        Self {
            price,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostics_overwrite_and_lookup_by_name() {
        let mut diag = Diagnostics::new();
        assert!(diag.is_empty());
        assert_eq!(diag.insert_key(DiagKey::NumSteps, 200.0), None);
        assert_eq!(diag.insert_key(DiagKey::NumSteps, 202.0), Some(200.0));
        diag.insert_key(DiagKey::Vol, 0.2);

        assert_eq!(diag.len(), 2);
        assert_eq!(diag.get("num_steps"), Some(202.0));
        assert_eq!(diag.get_key(DiagKey::Vol), Some(0.2));
        assert_eq!(diag.get("unknown"), None);
    }

    #[test]
    fn diagnostics_beyond_capacity_are_dropped() {
        let mut diag = Diagnostics::new();
        let keys = [
            DiagKey::AdjustedStrike,
            DiagKey::D1,
            DiagKey::D2,
            DiagKey::DiscountFactor,
            DiagKey::DividendPv,
            DiagKey::Forward,
            DiagKey::ForwardRate,
            DiagKey::NumNodes,
            DiagKey::NumPaths,
        ];
        for (i, key) in keys.iter().enumerate() {
            diag.insert_key(*key, i as f64);
        }
        assert_eq!(diag.len(), Diagnostics::CAPACITY);
        assert_eq!(diag.get_key(DiagKey::NumPaths), None);
    }
}
