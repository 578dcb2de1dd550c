//! Error types for client operations.

use thiserror::Error;

/// Errors that can occur while driving a gateway request.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Envelope protocol failure (padding, crypto, classes, shapes).
    #[error("Envelope error: {0}")]
    Envelope(#[from] zkgw_protocol::EnvelopeError),

    /// The ticket source has no usable ticket for the requested class.
    #[error("Ticket exhausted: {0}")]
    TicketExhausted(String),

    /// The gateway answered with a non-2xx status and no structured error.
    #[error("HTTP error: status {0}")]
    Http(u16),

    /// The gateway returned a structured error payload.
    #[error("Gateway error {code}: {message}")]
    Gateway {
        /// Stable machine-readable error code.
        code: String,
        /// Human-readable message.
        message: String,
    },

    /// The configured timeout cancelled the in-flight transport call.
    #[error("Request timed out")]
    Timeout,

    /// The transport failed before a status was available.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Invalid client configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
