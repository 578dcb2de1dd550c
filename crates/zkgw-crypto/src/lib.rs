//! # zkgw-crypto
//!
//! Cryptographic primitives for the zk-llm-gateway envelope protocol:
//!
//! - **Key agreement**: X25519 with a fresh ephemeral key pair per request
//! - **AEAD**: ChaCha20-Poly1305 with additional authenticated data
//! - **Key wrapping**: raw ↔ SPKI DER conversion for X25519 public keys
//!
//! ## Security
//!
//! Secret material (ephemeral/static private keys, shared secrets,
//! symmetric keys) is zeroized on drop and redacted from `Debug` output.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod aead;
pub mod error;
pub mod x25519;

pub use aead::{decrypt, encrypt, Nonce, SymmetricKey, KEY_SIZE, NONCE_SIZE, TAG_SIZE};
pub use error::{CryptoError, Result};
pub use x25519::{
    SharedSecret, X25519EphemeralKeyPair, X25519PublicKey, X25519StaticPrivateKey,
    PUBLIC_KEY_SIZE, SHARED_SECRET_SIZE,
};
