//! String redaction for prompts and logs.
//!
//! Replaces sensitive substrings (email addresses, API keys) with short
//! placeholders before text leaves the process, and restores them on the
//! way back. The redactor is stateless apart from a random per-instance
//! salt: placeholders are salted digests of the original value bound to a
//! kind label, so in stable mode identical inputs yield identical
//! placeholders within one instance while revealing nothing across
//! instances.

use std::sync::LazyLock;

use rand::rngs::OsRng;
use rand::RngCore;
use regex::Regex;
use sha2::{Digest, Sha256};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("email regex compiles")
});

static API_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bsk-[A-Za-z0-9]{8,}\b").expect("api key regex compiles"));

/// How placeholders are derived from values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RedactionMode {
    /// Identical inputs yield identical placeholders within one instance.
    StablePerValue,
    /// Every occurrence gets a fresh random placeholder.
    Unique,
}

/// Redacts sensitive substrings from text.
#[derive(Debug)]
pub struct Redactor {
    salt: [u8; 32],
    mode: RedactionMode,
}

impl Redactor {
    /// Create a redactor in stable-per-value mode with a random salt.
    pub fn new() -> Self {
        Self::with_mode(RedactionMode::StablePerValue)
    }

    /// Create a redactor with an explicit mode.
    pub fn with_mode(mode: RedactionMode) -> Self {
        let mut salt = [0u8; 32];
        OsRng.fill_bytes(&mut salt);
        Self { salt, mode }
    }

    /// Redact email addresses and API keys from `text`.
    pub fn redact(&self, text: &str) -> Redacted {
        let mut substitutions: Vec<(String, String)> = Vec::new();

        let pass1 = self.apply(&API_KEY_RE, "api-key", text, &mut substitutions);
        let pass2 = self.apply(&EMAIL_RE, "email", &pass1, &mut substitutions);

        Redacted {
            text: pass2,
            substitutions,
        }
    }

    fn apply(
        &self,
        re: &Regex,
        kind: &str,
        text: &str,
        substitutions: &mut Vec<(String, String)>,
    ) -> String {
        re.replace_all(text, |caps: &regex::Captures<'_>| {
            let original = caps[0].to_string();
            let placeholder = self.placeholder(kind, &original);
            if !substitutions.iter().any(|(p, _)| p == &placeholder) {
                substitutions.push((placeholder.clone(), original));
            }
            placeholder
        })
        .into_owned()
    }

    fn placeholder(&self, kind: &str, value: &str) -> String {
        let digest = match self.mode {
            RedactionMode::StablePerValue => {
                let mut hasher = Sha256::new();
                hasher.update(self.salt);
                hasher.update(kind.as_bytes());
                hasher.update(value.as_bytes());
                let out = hasher.finalize();
                hex8(&out[..4])
            }
            RedactionMode::Unique => {
                let mut bytes = [0u8; 4];
                OsRng.fill_bytes(&mut bytes);
                hex8(&bytes)
            }
        };
        format!("[{kind}:{digest}]")
    }
}

impl Default for Redactor {
    fn default() -> Self {
        Self::new()
    }
}

fn hex8(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// The result of a redaction pass: the redacted text plus the mapping
/// needed to restore it.
#[derive(Clone, Debug)]
pub struct Redacted {
    text: String,
    substitutions: Vec<(String, String)>,
}

impl Redacted {
    /// The redacted text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of distinct placeholders produced.
    pub fn placeholder_count(&self) -> usize {
        self.substitutions.len()
    }

    /// Restore the original text by substituting placeholders back.
    pub fn rehydrate(&self) -> String {
        self.rehydrate_text(&self.text)
    }

    /// Substitute this redaction's placeholders back into arbitrary text,
    /// e.g. a model reply that quotes a placeholder.
    pub fn rehydrate_text(&self, text: &str) -> String {
        let mut restored = text.to_string();
        for (placeholder, original) in &self.substitutions {
            restored = restored.replace(placeholder, original);
        }
        restored
    }
}
