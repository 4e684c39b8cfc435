//! Shared error type across vitals crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Invalid input / malformed configuration.
    BadRequest,
    /// Metric or label identifier outside the exposition grammar.
    InvalidName,
    /// Sample value violates its family's type rules.
    InvalidSample,
    /// Unsupported config version.
    UnsupportedVersion,
    /// Internal server error.
    Internal,
}

impl ClientCode {
    /// String representation used in JSON responses and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::BadRequest => "BAD_REQUEST",
            ClientCode::InvalidName => "INVALID_NAME",
            ClientCode::InvalidSample => "INVALID_SAMPLE",
            ClientCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, VitalsError>;

/// Unified error type used by core and server.
#[derive(Debug, Error)]
pub enum VitalsError {
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("invalid metric name: {0:?}")]
    InvalidMetricName(String),
    #[error("invalid label name {label:?} on metric {metric}")]
    InvalidLabelName { metric: String, label: String },
    #[error("negative counter value {value} on metric {metric}")]
    NegativeCounter { metric: String, value: f64 },
    #[error("invalid histogram: {0}")]
    InvalidHistogram(String),
    #[error("unsupported config version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl VitalsError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            VitalsError::BadRequest(_) => ClientCode::BadRequest,
            VitalsError::InvalidMetricName(_) | VitalsError::InvalidLabelName { .. } => {
                ClientCode::InvalidName
            }
            VitalsError::NegativeCounter { .. } | VitalsError::InvalidHistogram(_) => {
                ClientCode::InvalidSample
            }
            VitalsError::UnsupportedVersion => ClientCode::UnsupportedVersion,
            VitalsError::Internal(_) => ClientCode::Internal,
        }
    }
}
