//! Error types for envelope protocol operations.

use thiserror::Error;

/// Errors that can occur during envelope protocol operations.
#[derive(Error, Debug)]
pub enum EnvelopeError {
    /// The size-class name or id was not recognized.
    #[error("Invalid token class: {0:?}")]
    InvalidTokenClass(String),

    /// The gateway public key was not exactly 32 base64-decoded bytes.
    #[error("Invalid gateway public key: {0}")]
    InvalidGatewayPublicKey(String),

    /// A base64 field failed to decode.
    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// A padded frame was structurally invalid.
    #[error("Invalid padding: {0}")]
    InvalidPadding(String),

    /// The payload does not fit the padding target.
    #[error("Payload too large: {actual} bytes exceeds limit {limit}")]
    PayloadTooLarge {
        /// Actual payload size in bytes.
        actual: usize,
        /// Maximum payload size for the target length.
        limit: usize,
    },

    /// A cryptographic operation failed.
    #[error("Crypto error: {0}")]
    Crypto(#[from] zkgw_crypto::CryptoError),

    /// The peer violated the protocol (bad shapes, bad JSON, missing fields).
    #[error("Protocol error: {0}")]
    Protocol(String),
}

/// Result type for envelope protocol operations.
pub type Result<T> = std::result::Result<T, EnvelopeError>;
