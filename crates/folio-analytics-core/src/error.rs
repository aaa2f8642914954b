use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("Invalid input: {field} ({reason})")]
    InvalidInput { field: String, reason: String },

    /// A NAV below zero; zero is a valid (wiped-out) value.
    #[error("Negative NAV: {context} has NAV {nav}")]
    NegativeNav { context: String, nav: Decimal },

    #[error("Too many portfolios: {selected} selected, at most {max} can be compared")]
    TooManySeries { selected: usize, max: usize },

    #[error("Convergence failure: {function} did not converge after {iterations} iterations (delta: {last_delta})")]
    ConvergenceFailure {
        function: String,
        iterations: u32,
        last_delta: Decimal,
    },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Date error: {0}")]
    DateError(String),
}

impl AnalyticsError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        AnalyticsError::InvalidInput {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}
