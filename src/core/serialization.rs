//! Serde payloads exchanged with the calling valuation layer.
//!
//! # Examples
//! ```rust
//! use openferric_equity::core::{from_json, to_json_pretty, PricedInstrument, PricingRecord};
//! use openferric_equity::core::{ExerciseStyle, Greeks, Payoff};
//! use openferric_equity::instruments::OptionSpec;
//!
//! let record = PricingRecord {
//!     engine: "analytic".to_string(),
//!     instrument: PricedInstrument::Vanilla(OptionSpec::new(
//!         100.0, 100.0, Payoff::Call, 1.0, 0.2, ExerciseStyle::European,
//!     )),
//!     price: 10.45,
//!     stderr: None,
//!     greeks: Some(Greeks::default()),
//! };
//!
//! let json = to_json_pretty(&record).expect("json serialization");
//! let decoded: PricingRecord = from_json(&json).expect("json deserialization");
//! assert_eq!(decoded, record);
//! ```

use serde::de::DeserializeOwned;

use crate::core::{Greeks, PricingResult};
use crate::instruments::{AsianOption, OptionSpec, PathOption};

/// Instrument payload tagged by `product_type` in JSON.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "product_type", content = "payload", rename_all = "snake_case")]
pub enum PricedInstrument {
    Vanilla(OptionSpec),
    Asian(AsianOption),
    Path(PathOption),
}

/// Audit payload for one pricing call.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PricingRecord {
    pub engine: String,
    pub instrument: PricedInstrument,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stderr: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub greeks: Option<Greeks>,
}

impl PricingRecord {
    pub fn from_result(
        engine: impl Into<String>,
        instrument: PricedInstrument,
        result: &PricingResult,
    ) -> Self {
        Self {
            engine: engine.into(),
            instrument,
            price: result.price,
            stderr: result.stderr,
            greeks: result.greeks,
        }
    }
}

/// Serialize a value to pretty JSON.
pub fn to_json_pretty<T: serde::Serialize>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}

/// Deserialize a value from JSON.
pub fn from_json<T: DeserializeOwned>(payload: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(payload)
}
