//! X25519 Diffie-Hellman key exchange.
//!
//! One envelope exchange uses exactly one ephemeral key pair on the client
//! side against the gateway's long-lived static public key. The gateway key
//! is stored as 32 raw bytes and wrapped into SPKI DER form only where an
//! interface demands it.
//!
//! ## Security Notes
//!
//! - Ephemeral private keys are consumed by the key exchange
//! - Static private keys and shared secrets are zeroized on drop
//! - Uses `OsRng` for key generation

use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use x25519_dalek::{EphemeralSecret, PublicKey, StaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{CryptoError, Result};

/// Size of an X25519 public key in bytes.
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Size of an X25519 shared secret in bytes.
pub const SHARED_SECRET_SIZE: usize = 32;

/// DER prefix of an X25519 SubjectPublicKeyInfo structure.
///
/// `SEQUENCE { SEQUENCE { OID 1.3.101.110 }, BIT STRING (32 bytes) }`
const SPKI_PREFIX: [u8; 12] = [
    0x30, 0x2a, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x6e, 0x03, 0x21, 0x00,
];

/// X25519 public key.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct X25519PublicKey {
    bytes: [u8; PUBLIC_KEY_SIZE],
}

impl X25519PublicKey {
    /// Create from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not exactly 32 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != PUBLIC_KEY_SIZE {
            return Err(CryptoError::InvalidKeyLength {
                expected: PUBLIC_KEY_SIZE,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; PUBLIC_KEY_SIZE];
        arr.copy_from_slice(bytes);
        Ok(Self { bytes: arr })
    }

    /// Get the key as a byte array reference.
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.bytes
    }

    /// Convert to a byte array.
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        self.bytes
    }

    /// Wrap the raw key into X25519 SPKI DER form.
    pub fn to_spki_der(&self) -> Vec<u8> {
        let mut der = Vec::with_capacity(SPKI_PREFIX.len() + PUBLIC_KEY_SIZE);
        der.extend_from_slice(&SPKI_PREFIX);
        der.extend_from_slice(&self.bytes);
        der
    }

    /// Unwrap an X25519 SPKI DER structure back into the raw key.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::InvalidSpki` if the header or the total
    /// length does not match the fixed X25519 SPKI layout.
    pub fn from_spki_der(der: &[u8]) -> Result<Self> {
        if der.len() != SPKI_PREFIX.len() + PUBLIC_KEY_SIZE {
            return Err(CryptoError::InvalidSpki(format!(
                "expected {} bytes, got {}",
                SPKI_PREFIX.len() + PUBLIC_KEY_SIZE,
                der.len()
            )));
        }
        if der[..SPKI_PREFIX.len()] != SPKI_PREFIX {
            return Err(CryptoError::InvalidSpki(
                "unexpected SPKI header for X25519".to_string(),
            ));
        }
        Self::from_bytes(&der[SPKI_PREFIX.len()..])
    }
}

impl std::fmt::Debug for X25519PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "X25519PublicKey({:02x}{:02x}..)",
            self.bytes[0], self.bytes[1]
        )
    }
}

impl From<PublicKey> for X25519PublicKey {
    fn from(key: PublicKey) -> Self {
        Self {
            bytes: key.to_bytes(),
        }
    }
}

impl From<&X25519PublicKey> for PublicKey {
    fn from(key: &X25519PublicKey) -> Self {
        PublicKey::from(key.bytes)
    }
}

/// X25519 static private key.
///
/// The client never holds one of these for the live protocol; they exist
/// for the gateway side of the exchange, which local tools and test
/// harnesses simulate when answering sealed requests.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct X25519StaticPrivateKey {
    bytes: [u8; 32],
}

impl X25519StaticPrivateKey {
    /// Generate a new random private key.
    pub fn generate() -> Self {
        let secret = StaticSecret::random_from_rng(OsRng);
        Self {
            bytes: secret.to_bytes(),
        }
    }

    /// Get the corresponding public key.
    pub fn public_key(&self) -> X25519PublicKey {
        let secret = StaticSecret::from(self.bytes);
        X25519PublicKey::from(PublicKey::from(&secret))
    }

    /// Perform Diffie-Hellman with a peer public key.
    pub fn diffie_hellman(&self, peer_public: &X25519PublicKey) -> SharedSecret {
        let secret = StaticSecret::from(self.bytes);
        let shared = secret.diffie_hellman(&PublicKey::from(peer_public));
        SharedSecret {
            bytes: shared.to_bytes(),
        }
    }
}

impl std::fmt::Debug for X25519StaticPrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "X25519StaticPrivateKey([REDACTED])")
    }
}

/// X25519 ephemeral key pair for a single envelope exchange.
///
/// The private half is destroyed by `diffie_hellman`; only the public half
/// survives into the envelope and seal state.
pub struct X25519EphemeralKeyPair {
    secret: EphemeralSecret,
    public: X25519PublicKey,
}

impl X25519EphemeralKeyPair {
    /// Generate a new ephemeral key pair.
    pub fn generate() -> Self {
        let secret = EphemeralSecret::random_from_rng(OsRng);
        let public = X25519PublicKey::from(PublicKey::from(&secret));
        Self { secret, public }
    }

    /// Get the public key.
    pub fn public_key(&self) -> &X25519PublicKey {
        &self.public
    }

    /// Perform Diffie-Hellman and consume the ephemeral key.
    pub fn diffie_hellman(self, peer_public: &X25519PublicKey) -> SharedSecret {
        let shared = self.secret.diffie_hellman(&PublicKey::from(peer_public));
        SharedSecret {
            bytes: shared.to_bytes(),
        }
    }
}

impl std::fmt::Debug for X25519EphemeralKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "X25519EphemeralKeyPair {{ public: {:?} }}", self.public)
    }
}

/// Shared secret derived from Diffie-Hellman key exchange.
///
/// Always 32 bytes by construction. Input to the envelope key schedule,
/// never used as an encryption key directly.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SharedSecret {
    bytes: [u8; SHARED_SECRET_SIZE],
}

impl SharedSecret {
    /// Get the shared secret as bytes.
    pub fn as_bytes(&self) -> &[u8; SHARED_SECRET_SIZE] {
        &self.bytes
    }
}

impl std::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SharedSecret([REDACTED])")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ephemeral_static_exchange_agrees() {
        let gateway = X25519StaticPrivateKey::generate();
        let gateway_public = gateway.public_key();

        let ephemeral = X25519EphemeralKeyPair::generate();
        let ephemeral_public = ephemeral.public_key().clone();

        let client_shared = ephemeral.diffie_hellman(&gateway_public);
        let gateway_shared = gateway.diffie_hellman(&ephemeral_public);

        assert_eq!(client_shared.as_bytes(), gateway_shared.as_bytes());
    }

    #[test]
    fn test_different_ephemerals_produce_different_secrets() {
        let gateway = X25519StaticPrivateKey::generate();
        let gateway_public = gateway.public_key();

        let shared_a = X25519EphemeralKeyPair::generate().diffie_hellman(&gateway_public);
        let shared_b = X25519EphemeralKeyPair::generate().diffie_hellman(&gateway_public);

        assert_ne!(shared_a.as_bytes(), shared_b.as_bytes());
    }

    #[test]
    fn test_public_key_roundtrip() {
        let key = X25519StaticPrivateKey::generate().public_key();
        let restored = X25519PublicKey::from_bytes(&key.to_bytes()).unwrap();
        assert_eq!(key, restored);
    }

    #[test]
    fn test_public_key_invalid_length() {
        let short = [0u8; 16];
        assert!(matches!(
            X25519PublicKey::from_bytes(&short),
            Err(CryptoError::InvalidKeyLength {
                expected: 32,
                actual: 16
            })
        ));
    }

    #[test]
    fn test_spki_roundtrip() {
        let key = X25519StaticPrivateKey::generate().public_key();
        let der = key.to_spki_der();

        assert_eq!(der.len(), 44);
        assert_eq!(&der[..12], &SPKI_PREFIX);

        let restored = X25519PublicKey::from_spki_der(&der).unwrap();
        assert_eq!(key, restored);
    }

    #[test]
    fn test_spki_rejects_wrong_header() {
        let key = X25519StaticPrivateKey::generate().public_key();
        let mut der = key.to_spki_der();
        der[4] ^= 0x01;

        assert!(matches!(
            X25519PublicKey::from_spki_der(&der),
            Err(CryptoError::InvalidSpki(_))
        ));
    }

    #[test]
    fn test_spki_rejects_wrong_length() {
        assert!(matches!(
            X25519PublicKey::from_spki_der(&[0u8; 20]),
            Err(CryptoError::InvalidSpki(_))
        ));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let private = X25519StaticPrivateKey::generate();
        let shared = private.diffie_hellman(&X25519StaticPrivateKey::generate().public_key());

        assert!(format!("{:?}", private).contains("REDACTED"));
        assert!(format!("{:?}", shared).contains("REDACTED"));
    }
}
