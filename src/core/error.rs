/// Engine, curve and configuration errors surfaced by the API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PricingError {
    /// Rate or dividend curve knots are missing, unordered, or carry a negative time.
    #[error("invalid curve input: {0}")]
    InvalidCurveInput(String),
    /// Unknown payoff/style/compounding identifier or unsupported engine combination.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// An iterative solver exhausted its cap and strict convergence was requested.
    #[error("numerical non-convergence: {0}")]
    NumericalNonConvergence(String),
    /// Input validation error on an option or engine parameter.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl PricingError {
    pub(crate) fn curve(msg: impl Into<String>) -> Self {
        Self::InvalidCurveInput(msg.into())
    }

    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub(crate) fn input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::PricingError;

    #[test]
    fn display_names_the_failure_category() {
        let err = PricingError::curve("rate curve needs at least one knot");
        assert_eq!(
            err.to_string(),
            "invalid curve input: rate curve needs at least one knot"
        );
        assert!(
            PricingError::config("unknown payoff `X`")
                .to_string()
                .starts_with("configuration error")
        );
    }
}
