use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LeaseNpvError {
    #[error("Invalid broker structure: '{value}' is not in {allowed:?}")]
    InvalidBrokerStructure { value: String, allowed: Vec<String> },

    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Convergence failure: {function} did not converge after {iterations} iterations (delta: {last_delta})")]
    ConvergenceFailure {
        function: String,
        iterations: u32,
        last_delta: Decimal,
    },

    #[error("No solution found in bracket [{lower_bound}, {upper_bound}]")]
    BracketExhausted {
        lower_bound: Decimal,
        upper_bound: Decimal,
    },

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },
}
