use std::str::FromStr;

use crate::core::PricingError;

/// Plain-vanilla option side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum OptionType {
    /// Call option payoff profile.
    Call,
    /// Put option payoff profile.
    Put,
}

impl OptionType {
    /// Returns +1.0 for calls and -1.0 for puts.
    pub fn sign(self) -> f64 {
        match self {
            Self::Call => 1.0,
            Self::Put => -1.0,
        }
    }
}

impl FromStr for OptionType {
    type Err = PricingError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "c" | "call" => Ok(Self::Call),
            "p" | "put" => Ok(Self::Put),
            other => Err(PricingError::config(format!("unknown option type `{other}`"))),
        }
    }
}

/// Exercise rights for an option contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub enum ExerciseStyle {
    /// Exercise only at expiry.
    #[default]
    European,
    /// Exercise at any time up to expiry.
    American,
}

impl ExerciseStyle {
    #[inline]
    pub fn is_american(self) -> bool {
        matches!(self, Self::American)
    }
}

impl FromStr for ExerciseStyle {
    type Err = PricingError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "e" | "european" => Ok(Self::European),
            "a" | "american" => Ok(Self::American),
            other => Err(PricingError::config(format!(
                "unknown exercise style `{other}`"
            ))),
        }
    }
}

/// Terminal payoff profile of a single-asset option.
///
/// `Call`/`Put` are supported by every engine. The digital and unit-bond
/// profiles are only understood by the finite-difference grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Payoff {
    /// `max(S - K, 0)`.
    Call,
    /// `max(K - S, 0)`.
    Put,
    /// Pays one unit when `S > K`.
    DigitalCall,
    /// Pays one unit when `S <= K`.
    DigitalPut,
    /// Pays one unit in every state.
    UnitBond,
}

impl Payoff {
    /// Payoff value for terminal underlying `spot`.
    #[inline]
    pub fn intrinsic(self, spot: f64, strike: f64) -> f64 {
        match self {
            Self::Call => (spot - strike).max(0.0),
            Self::Put => (strike - spot).max(0.0),
            Self::DigitalCall => {
                if spot > strike {
                    1.0
                } else {
                    0.0
                }
            }
            Self::DigitalPut => {
                if spot > strike {
                    0.0
                } else {
                    1.0
                }
            }
            Self::UnitBond => 1.0,
        }
    }

    /// Vanilla side when the payoff is a plain call or put.
    #[inline]
    pub fn option_type(self) -> Option<OptionType> {
        match self {
            Self::Call => Some(OptionType::Call),
            Self::Put => Some(OptionType::Put),
            _ => None,
        }
    }

    /// Same as [`Payoff::option_type`], failing with a configuration error for
    /// engines that only price vanillas.
    pub fn require_vanilla(self, engine: &str) -> Result<OptionType, PricingError> {
        self.option_type().ok_or_else(|| {
            PricingError::config(format!("{engine} supports call/put payoffs only, got {self:?}"))
        })
    }
}

impl From<OptionType> for Payoff {
    fn from(option_type: OptionType) -> Self {
        match option_type {
            OptionType::Call => Self::Call,
            OptionType::Put => Self::Put,
        }
    }
}

impl FromStr for Payoff {
    type Err = PricingError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "c" | "call" => Ok(Self::Call),
            "p" | "put" => Ok(Self::Put),
            "a" | "digitalcall" | "digital_call" => Ok(Self::DigitalCall),
            "b" | "digitalput" | "digital_put" => Ok(Self::DigitalPut),
            "t" | "bond" | "unitbond" | "unit_bond" => Ok(Self::UnitBond),
            other => Err(PricingError::config(format!("unknown payoff `{other}`"))),
        }
    }
}
