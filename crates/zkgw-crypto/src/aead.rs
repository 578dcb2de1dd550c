//! ChaCha20-Poly1305 authenticated encryption.
//!
//! IETF ChaCha20-Poly1305 with 256-bit keys, 96-bit nonces, and a 128-bit
//! authentication tag appended to the ciphertext. The nonce is drawn fresh
//! from `OsRng` for every message and travels alongside the ciphertext in
//! the envelope, never prepended to it.
//!
//! ## Security Notes
//!
//! - Keys are zeroized on drop
//! - The associated data is bound into the tag but not encrypted
//! - NEVER reuse a nonce with the same key

use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    ChaCha20Poly1305,
};
use rand::rngs::OsRng;
use rand::RngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::{CryptoError, Result};

/// Size of a symmetric key in bytes (256 bits).
pub const KEY_SIZE: usize = 32;

/// Size of a nonce in bytes (96 bits, IETF ChaCha20-Poly1305).
pub const NONCE_SIZE: usize = 12;

/// Size of the authentication tag in bytes.
pub const TAG_SIZE: usize = 16;

/// A 256-bit symmetric key for ChaCha20-Poly1305.
///
/// The key is automatically zeroized when dropped.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey {
    bytes: [u8; KEY_SIZE],
}

impl SymmetricKey {
    /// Create a key from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not exactly 32 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != KEY_SIZE {
            return Err(CryptoError::InvalidKeyLength {
                expected: KEY_SIZE,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; KEY_SIZE];
        arr.copy_from_slice(bytes);
        Ok(Self { bytes: arr })
    }

    /// Get the key as a byte slice.
    ///
    /// # Security
    ///
    /// Avoid logging or persisting the returned bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SymmetricKey([REDACTED])")
    }
}

/// A 96-bit nonce for ChaCha20-Poly1305.
#[derive(Clone, PartialEq, Eq)]
pub struct Nonce {
    bytes: [u8; NONCE_SIZE],
}

impl Nonce {
    /// Generate a new random nonce.
    pub fn generate() -> Self {
        let mut bytes = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut bytes);
        Self { bytes }
    }

    /// Create a nonce from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not exactly 12 bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != NONCE_SIZE {
            return Err(CryptoError::InvalidNonceLength {
                expected: NONCE_SIZE,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; NONCE_SIZE];
        arr.copy_from_slice(bytes);
        Ok(Self { bytes: arr })
    }

    /// Get the nonce as a byte slice.
    pub fn as_bytes(&self) -> &[u8; NONCE_SIZE] {
        &self.bytes
    }
}

impl std::fmt::Debug for Nonce {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Nonce({:02x}{:02x}..)", self.bytes[0], self.bytes[1])
    }
}

/// Encrypt plaintext under the given key, nonce, and associated data.
///
/// Returns the ciphertext with the 16-byte authentication tag appended.
///
/// # Errors
///
/// Returns `CryptoError::Encryption` if the cipher rejects the input.
pub fn encrypt(
    key: &SymmetricKey,
    nonce: &Nonce,
    plaintext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new(key.as_bytes().into());
    cipher
        .encrypt(
            nonce.as_bytes().into(),
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|_| CryptoError::Encryption("ChaCha20-Poly1305 encryption failed".into()))
}

/// Decrypt ciphertext under the given key, nonce, and associated data.
///
/// # Errors
///
/// Returns `CryptoError::Decryption` if the tag does not verify, which
/// covers a wrong key, a tampered ciphertext, or mismatched associated
/// data.
pub fn decrypt(
    key: &SymmetricKey,
    nonce: &Nonce,
    ciphertext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>> {
    let cipher = ChaCha20Poly1305::new(key.as_bytes().into());
    cipher
        .decrypt(
            nonce.as_bytes().into(),
            Payload {
                msg: ciphertext,
                aad,
            },
        )
        .map_err(|_| CryptoError::Decryption)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn encrypt_decrypt_roundtrip(plaintext: Vec<u8>, aad: Vec<u8>) {
            let key = {
                let mut bytes = [0u8; KEY_SIZE];
                OsRng.fill_bytes(&mut bytes);
                SymmetricKey::from_bytes(&bytes).unwrap()
            };
            let nonce = Nonce::generate();

            let ciphertext = encrypt(&key, &nonce, &plaintext, &aad).unwrap();
            prop_assert_eq!(ciphertext.len(), plaintext.len() + TAG_SIZE);

            let decrypted = decrypt(&key, &nonce, &ciphertext, &aad).unwrap();
            prop_assert_eq!(decrypted, plaintext);
        }

        #[test]
        fn flipped_aad_bit_rejects(plaintext: Vec<u8>, bit in 0usize..24) {
            let key = {
                let mut bytes = [0u8; KEY_SIZE];
                OsRng.fill_bytes(&mut bytes);
                SymmetricKey::from_bytes(&bytes).unwrap()
            };
            let nonce = Nonce::generate();
            let aad = [1u8, 2, 3];

            let ciphertext = encrypt(&key, &nonce, &plaintext, &aad).unwrap();

            let mut bad_aad = aad;
            bad_aad[bit / 8] ^= 1 << (bit % 8);
            let result = decrypt(&key, &nonce, &ciphertext, &bad_aad);
            prop_assert!(matches!(result, Err(CryptoError::Decryption)));
        }
    }
}
