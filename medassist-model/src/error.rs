//! Error types for model providers.

use thiserror::Error;

/// Errors returned by a [`ModelProvider`](crate::ModelProvider).
#[derive(Debug, Error)]
pub enum ModelError {
    /// The provider's API key is not configured.
    #[error("{provider} is not configured: set {env_var}")]
    MissingCredential {
        /// Provider display name.
        provider: String,
        /// Environment variable expected to hold the key.
        env_var: String,
    },

    /// A provider name that is not recognised.
    #[error("Unknown model provider: {0}")]
    UnknownProvider(String),

    /// The request did not complete within the configured timeout.
    #[error("{provider} request timed out")]
    Timeout {
        /// Provider display name.
        provider: String,
    },

    /// The request could not be sent or the connection failed.
    #[error("{provider} connection error: {message}")]
    Connection {
        /// Provider display name.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The API answered with a non-success status.
    #[error("{provider} API error ({status}): {message}")]
    Api {
        /// Provider display name.
        provider: String,
        /// HTTP status code.
        status: u16,
        /// Error message extracted from the response body.
        message: String,
    },

    /// The API answered successfully but the body could not be used.
    #[error("{provider} returned an invalid response: {message}")]
    InvalidResponse {
        /// Provider display name.
        provider: String,
        /// A description of the problem.
        message: String,
    },
}

impl ModelError {
    /// Whether retrying the same request may succeed.
    ///
    /// Timeouts, connection failures, rate limits (429) and server errors
    /// (5xx) are transient; everything else is permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            ModelError::Timeout { .. } | ModelError::Connection { .. } => true,
            ModelError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
