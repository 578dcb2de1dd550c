//! # zkgw-protocol
//!
//! The envelope protocol core for the zk-llm-gateway: a hybrid-encryption
//! request/response scheme designed to interoperate bit-exactly with peer
//! implementations in other languages.
//!
//! - **Size classes**: coarse buckets selecting the padded plaintext length
//! - **Padding codec**: frames a payload to an exact target length
//! - **Envelope**: per-request ephemeral X25519 + HKDF-SHA-256 key schedule
//!   + ChaCha20-Poly1305, with direction-separated keys and version/class
//!   bound into the associated data
//! - **Tickets**: the opaque single-use authorization record carried in
//!   every sealed request
//!
//! ## Privacy Design
//!
//! The padded frame lives entirely inside the ciphertext, so an observer
//! sees only one of five fixed envelope sizes per direction. The response
//! is bound to the in-flight request by echoing the client's ephemeral
//! public key and is opened with a key that only that exchange can derive.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod envelope;
pub mod error;
pub mod padding;
pub mod ticket;
pub mod token_class;

pub use envelope::{
    derive_envelope_keys, open, request_aad, response_aad, seal, Envelope, GatewayPublicKey,
    SealState, PROTOCOL_VERSION,
};
pub use error::{EnvelopeError, Result};
pub use padding::{pad, unpad, FRAME_OVERHEAD, FRAME_TAG};
pub use ticket::Ticket;
pub use token_class::TokenClass;
