//! Ticket sources.
//!
//! A [`TicketSource`] hands out single-use authorization tickets, one per
//! request. The pool variant consumes entries from a pre-issued JSON file;
//! the dummy variant fabricates tickets for development against gateways
//! running with proof checking disabled.

use std::path::Path;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::debug;

use zkgw_protocol::{Ticket, TokenClass};

use crate::error::{ClientError, Result};

/// Pluggable provider of single-use authorization tickets.
///
/// Implementations must never return the same ticket twice, and the
/// returned ticket's class must equal the requested class.
#[async_trait]
pub trait TicketSource: Send + Sync {
    /// Produce the next ticket for the given size class.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::TicketExhausted` when no usable ticket
    /// remains for the class.
    async fn next_ticket(&self, class: TokenClass) -> Result<Ticket>;
}

/// Development-only source fabricating a fresh random ticket per call.
///
/// The nullifier is 32 random bytes, the commitment root is zero-filled,
/// and the proof is empty. Only useful against a gateway that skips proof
/// verification.
#[derive(Clone, Copy, Debug, Default)]
pub struct DummyTicketSource;

impl DummyTicketSource {
    /// Create a dummy source.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TicketSource for DummyTicketSource {
    async fn next_ticket(&self, class: TokenClass) -> Result<Ticket> {
        let mut nullifier = [0u8; 32];
        OsRng.fill_bytes(&mut nullifier);

        Ok(Ticket {
            nullifier: STANDARD.encode(nullifier),
            commitment_root: Ticket::zero_commitment_root(),
            token_class: class,
            proof: String::new(),
        })
    }
}

/// A raw ticket-file entry before normalization.
///
/// Peer tooling spells the byte-string fields with or without a `_b64`
/// suffix; both are accepted. The class may be absent, marking the entry
/// as a wildcard usable for any request.
#[derive(Clone, Debug, Deserialize)]
struct RawTicketEntry {
    #[serde(default, alias = "nullifier_b64")]
    nullifier: Option<String>,
    #[serde(default, alias = "commitment_root_b64")]
    commitment_root: Option<String>,
    #[serde(default, alias = "proof_b64")]
    proof: Option<String>,
    #[serde(default)]
    token_class: Option<String>,
}

impl RawTicketEntry {
    /// Declared class, if present and recognizable.
    fn declared_class(&self) -> Option<TokenClass> {
        self.token_class
            .as_deref()
            .and_then(|s| TokenClass::parse(s).ok())
    }

    /// Normalize into a usable ticket stamped with `class`.
    fn normalize(self, class: TokenClass) -> Result<Ticket> {
        let nullifier = self
            .nullifier
            .ok_or_else(|| ClientError::TicketExhausted("ticket entry missing nullifier".into()))?;

        Ok(Ticket {
            nullifier,
            commitment_root: self
                .commitment_root
                .unwrap_or_else(Ticket::zero_commitment_root),
            token_class: class,
            proof: self.proof.unwrap_or_default(),
        })
    }
}

/// A file-backed pool of pre-issued tickets.
///
/// Loaded eagerly from a UTF-8 JSON array; non-object entries are dropped
/// at load time. Each [`next_ticket`](TicketSource::next_ticket) removes
/// exactly one entry atomically, preferring the first entry declared for
/// the requested class and falling back to the first untyped (wildcard)
/// entry. Consumption is memory-only and not persisted across restarts.
#[derive(Debug)]
pub struct FileTicketPool {
    entries: Mutex<Vec<RawTicketEntry>>,
}

impl FileTicketPool {
    /// Load a pool from a JSON ticket file.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::TicketExhausted` when the file cannot be
    /// read or is not a JSON array.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            ClientError::TicketExhausted(format!("cannot read ticket file {}: {e}", path.display()))
        })?;
        let pool = Self::from_json(&text)?;
        debug!(path = %path.display(), "loaded ticket pool");
        Ok(pool)
    }

    /// Build a pool from the JSON text of a ticket file.
    pub fn from_json(text: &str) -> Result<Self> {
        let values: Vec<serde_json::Value> = serde_json::from_str(text)
            .map_err(|e| ClientError::TicketExhausted(format!("ticket file is not a JSON array: {e}")))?;

        let entries: Vec<RawTicketEntry> = values
            .into_iter()
            .filter(|v| v.is_object())
            .filter_map(|v| serde_json::from_value(v).ok())
            .collect();

        Ok(Self {
            entries: Mutex::new(entries),
        })
    }

    /// Number of tickets remaining in the pool.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Whether the pool is empty.
    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl TicketSource for FileTicketPool {
    async fn next_ticket(&self, class: TokenClass) -> Result<Ticket> {
        let mut entries = self.entries.lock().await;

        // Prefer an entry declared for this class, then the first
        // wildcard. Entries declaring a different class are skipped.
        let index = entries
            .iter()
            .position(|e| e.declared_class() == Some(class))
            .or_else(|| entries.iter().position(|e| e.token_class.is_none()));

        let Some(index) = index else {
            return Err(ClientError::TicketExhausted(format!(
                "no ticket available for class {class}"
            )));
        };

        // Removed before normalization: a selected entry is spent even if
        // it turns out to be malformed.
        let entry = entries.remove(index);
        drop(entries);

        entry.normalize(class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_dummy_source_matches_class_and_varies() {
        let source = DummyTicketSource::new();

        let a = source.next_ticket(TokenClass::C512).await.unwrap();
        let b = source.next_ticket(TokenClass::C512).await.unwrap();

        assert_eq!(a.token_class, TokenClass::C512);
        assert_eq!(STANDARD.decode(&a.nullifier).unwrap().len(), 32);
        assert_eq!(a.commitment_root, Ticket::zero_commitment_root());
        assert!(a.proof.is_empty());
        assert_ne!(a.nullifier, b.nullifier);
    }

    #[tokio::test]
    async fn test_pool_single_use() {
        let pool = FileTicketPool::from_json(
            r#"[{"nullifier": "AA==", "token_class": "c2048", "proof": ""}]"#,
        )
        .unwrap();

        let ticket = pool.next_ticket(TokenClass::C2048).await.unwrap();
        assert_eq!(ticket.token_class, TokenClass::C2048);
        assert_eq!(ticket.nullifier, "AA==");
        assert_eq!(pool.len().await, 0);

        let second = pool.next_ticket(TokenClass::C2048).await;
        assert!(matches!(second, Err(ClientError::TicketExhausted(_))));
    }

    #[tokio::test]
    async fn test_pool_prefers_matching_class() {
        let pool = FileTicketPool::from_json(
            r#"[
                {"nullifier": "MQ==", "token_class": "c1024"},
                {"nullifier": "Mg==", "token_class": "c2048"}
            ]"#,
        )
        .unwrap();

        let ticket = pool.next_ticket(TokenClass::C2048).await.unwrap();
        assert_eq!(ticket.nullifier, "Mg==");
        assert_eq!(pool.len().await, 1);
    }

    #[tokio::test]
    async fn test_pool_wildcard_fallback_is_stamped() {
        let pool = FileTicketPool::from_json(
            r#"[
                {"nullifier": "MQ==", "token_class": "c1024"},
                {"nullifier": "Mg=="}
            ]"#,
        )
        .unwrap();

        let ticket = pool.next_ticket(TokenClass::C4096).await.unwrap();
        assert_eq!(ticket.nullifier, "Mg==");
        assert_eq!(ticket.token_class, TokenClass::C4096);
    }

    #[tokio::test]
    async fn test_pool_mismatched_classes_rejected() {
        let pool = FileTicketPool::from_json(
            r#"[{"nullifier": "MQ==", "token_class": "c1024"}]"#,
        )
        .unwrap();

        let result = pool.next_ticket(TokenClass::C2048).await;
        assert!(matches!(result, Err(ClientError::TicketExhausted(_))));
        assert_eq!(pool.len().await, 1);
    }

    #[tokio::test]
    async fn test_pool_accepts_b64_aliases_and_defaults() {
        let pool = FileTicketPool::from_json(
            r#"[{
                "nullifier_b64": "MQ==",
                "proof_b64": "cHJvb2Y="
            }]"#,
        )
        .unwrap();

        let ticket = pool.next_ticket(TokenClass::C256).await.unwrap();
        assert_eq!(ticket.nullifier, "MQ==");
        assert_eq!(ticket.proof, "cHJvb2Y=");
        assert_eq!(ticket.commitment_root, Ticket::zero_commitment_root());
    }

    #[tokio::test]
    async fn test_pool_malformed_entry_is_spent() {
        let pool = FileTicketPool::from_json(r#"[{"token_class": "c512"}]"#).unwrap();

        let result = pool.next_ticket(TokenClass::C512).await;
        assert!(matches!(result, Err(ClientError::TicketExhausted(_))));
        // The malformed entry was consumed by the failed selection.
        assert_eq!(pool.len().await, 0);
    }

    #[tokio::test]
    async fn test_pool_drops_non_object_entries() {
        let pool = FileTicketPool::from_json(
            r#"[42, "junk", {"nullifier": "MQ=="}, null]"#,
        )
        .unwrap();

        assert_eq!(pool.len().await, 1);
    }

    #[test]
    fn test_pool_rejects_non_array_file() {
        let result = FileTicketPool::from_json(r#"{"not": "an array"}"#);
        assert!(matches!(result, Err(ClientError::TicketExhausted(_))));
    }

    #[tokio::test]
    async fn test_pool_load_from_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("tickets.json");
        std::fs::write(
            &path,
            r#"[{"nullifier": "AA==", "token_class": "c2048", "proof": ""}]"#,
        )
        .unwrap();

        let pool = FileTicketPool::load(&path).unwrap();
        assert_eq!(pool.len().await, 1);

        let ticket = pool.next_ticket(TokenClass::C2048).await.unwrap();
        assert_eq!(ticket.token_class, TokenClass::C2048);
        assert!(pool.is_empty().await);
    }

    #[test]
    fn test_pool_load_missing_file() {
        let result = FileTicketPool::load("/nonexistent/tickets.json");
        assert!(matches!(result, Err(ClientError::TicketExhausted(_))));
    }
}
