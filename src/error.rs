//! Error taxonomy for the ITS data clients.
//!
//! A missing zone is not an error here: lookups return `Option` instead.

use thiserror::Error;

/// Failures surfaced by the fetch, parse and publish stages.
#[derive(Debug, Error)]
pub enum ItsError {
    // ---
    /// Transport level failure: connection, TLS, timeout or a non-2xx status.
    #[error("Network error: {0}")]
    Network(String),

    /// The fetched JSON did not match the expected schema.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// A derived metric was asked to divide by zero.
    #[error("Division by zero while deriving {metric}")]
    DivisionByZero { metric: String },

    /// The event port refused a zone transition event.
    #[error("Event publish failed: {0}")]
    Publish(String),
}

impl From<serde_json::Error> for ItsError {
    fn from(err: serde_json::Error) -> Self {
        ItsError::MalformedPayload(err.to_string())
    }
}

impl From<reqwest::Error> for ItsError {
    fn from(err: reqwest::Error) -> Self {
        ItsError::Network(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ItsError>;
