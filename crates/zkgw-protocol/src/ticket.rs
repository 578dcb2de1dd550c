//! Single-use authorization tickets.
//!
//! A ticket is an opaque record presented alongside every request. The
//! gateway consumes the nullifier to prevent replay; the client treats the
//! whole record as pass-through material and never inspects the proof.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::token_class::TokenClass;

/// An opaque, single-use authorization record.
///
/// All byte-string fields are base64-encoded. `proof` may be empty in
/// development modes; `commitment_root` may be the 32-byte zero value when
/// unused.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// 32-byte anti-replay witness.
    pub nullifier: String,
    /// 32-byte commitment root, zero-filled when unused.
    pub commitment_root: String,
    /// The size class this ticket authorizes.
    pub token_class: TokenClass,
    /// Opaque proof bytes, possibly empty.
    pub proof: String,
}

impl Ticket {
    /// Base64 encoding of a 32-byte zero commitment root.
    pub fn zero_commitment_root() -> String {
        STANDARD.encode([0u8; 32])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_commitment_root_decodes_to_32_zero_bytes() {
        let decoded = STANDARD.decode(Ticket::zero_commitment_root()).unwrap();
        assert_eq!(decoded, vec![0u8; 32]);
    }

    #[test]
    fn test_serde_roundtrip() {
        let ticket = Ticket {
            nullifier: STANDARD.encode([7u8; 32]),
            commitment_root: Ticket::zero_commitment_root(),
            token_class: TokenClass::C2048,
            proof: String::new(),
        };

        let json = serde_json::to_string(&ticket).unwrap();
        assert!(json.contains("\"token_class\":\"c2048\""));

        let restored: Ticket = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, ticket);
    }
}
