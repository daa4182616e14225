//! Instrument definitions.

pub mod asian;
pub mod path_payoff;
pub mod reset;
pub mod vanilla;

pub use asian::AsianOption;
pub use path_payoff::{PathOption, PathPayoff};
pub use reset::{ResetPoint, ResetSchedule};
pub use vanilla::OptionSpec;
