use thiserror::Error;

/// Errors raised by the transport core.
///
/// Contract violations are reported synchronously by the call that commits
/// them. Out-of-bounds geometry queries are not errors and resolve to the
/// default material instead.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Non-finite {quantity} after transport step: {value}")]
    NumericSingularity { quantity: &'static str, value: f64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type TransportResult<T> = Result<T, TransportError>;

impl TransportError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        TransportError::InvalidArgument(message.into())
    }
}
