use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("Not enough cash available to execute fill. Required: {required}, Available: {available}")]
    InsufficientCash { required: String, available: String },

    #[error("Fill would close more than the open quantity. Requested: {requested}, Available: {available}")]
    InvalidClosingQuantity { requested: String, available: String },

    #[error("Portfolio invariant violated: {0}")]
    InvariantViolation(String),
}
