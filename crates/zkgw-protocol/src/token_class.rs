//! The size-class table.
//!
//! A closed enumeration of coarse buckets. Each class fixes the padded
//! request and response lengths on the wire and a max-output-tokens hint
//! for the upstream model call. The table is part of the wire contract and
//! must match peer implementations exactly.

use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{EnvelopeError, Result};
use crate::padding::FRAME_OVERHEAD;

/// A coarse size bucket selecting the padded plaintext length.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenClass {
    /// Up to 256 output tokens; 8 KiB request frame.
    C256,
    /// Up to 512 output tokens; 12 KiB request frame.
    C512,
    /// Up to 1024 output tokens; 20 KiB request frame.
    C1024,
    /// Up to 2048 output tokens; 36 KiB request frame.
    C2048,
    /// Up to 4096 output tokens; 68 KiB request frame.
    C4096,
}

impl TokenClass {
    /// All classes, in ascending order.
    pub const ALL: [TokenClass; 5] = [
        TokenClass::C256,
        TokenClass::C512,
        TokenClass::C1024,
        TokenClass::C2048,
        TokenClass::C4096,
    ];

    /// Parse a class from its symbolic name or bare numeric suffix.
    ///
    /// Case-insensitive and whitespace-trimmed: `"c2048"`, `"C2048"` and
    /// `"2048"` all name the same class.
    ///
    /// # Errors
    ///
    /// Returns `EnvelopeError::InvalidTokenClass` for anything else.
    pub fn parse(text: &str) -> Result<Self> {
        let normalized = text.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "c256" | "256" => Ok(TokenClass::C256),
            "c512" | "512" => Ok(TokenClass::C512),
            "c1024" | "1024" => Ok(TokenClass::C1024),
            "c2048" | "2048" => Ok(TokenClass::C2048),
            "c4096" | "4096" => Ok(TokenClass::C4096),
            _ => Err(EnvelopeError::InvalidTokenClass(text.to_string())),
        }
    }

    /// The symbolic name carried on the wire.
    pub const fn as_str(self) -> &'static str {
        match self {
            TokenClass::C256 => "c256",
            TokenClass::C512 => "c512",
            TokenClass::C1024 => "c1024",
            TokenClass::C2048 => "c2048",
            TokenClass::C4096 => "c4096",
        }
    }

    /// The single-byte class id mixed into the key schedule and AAD.
    pub const fn id(self) -> u8 {
        match self {
            TokenClass::C256 => 1,
            TokenClass::C512 => 2,
            TokenClass::C1024 => 3,
            TokenClass::C2048 => 4,
            TokenClass::C4096 => 5,
        }
    }

    /// Padded length of the request frame in bytes.
    pub const fn request_padded_len(self) -> usize {
        match self {
            TokenClass::C256 => 8_192,
            TokenClass::C512 => 12_288,
            TokenClass::C1024 => 20_480,
            TokenClass::C2048 => 36_864,
            TokenClass::C4096 => 69_632,
        }
    }

    /// Padded length of the response frame in bytes.
    pub const fn response_padded_len(self) -> usize {
        match self {
            TokenClass::C256 => 8_192,
            TokenClass::C512 => 16_384,
            TokenClass::C1024 => 32_768,
            TokenClass::C2048 => 65_536,
            TokenClass::C4096 => 131_072,
        }
    }

    /// Largest serialized request payload that fits the request frame.
    pub const fn max_prompt_bytes(self) -> usize {
        self.request_padded_len() - FRAME_OVERHEAD
    }

    /// Suggested `max_tokens` when the caller does not set one.
    pub const fn max_output_tokens_hint(self) -> u32 {
        match self {
            TokenClass::C256 => 256,
            TokenClass::C512 => 512,
            TokenClass::C1024 => 1_024,
            TokenClass::C2048 => 2_048,
            TokenClass::C4096 => 4_096,
        }
    }
}

impl fmt::Display for TokenClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TokenClass {
    type Err = EnvelopeError;

    fn from_str(s: &str) -> Result<Self> {
        TokenClass::parse(s)
    }
}

impl Serialize for TokenClass {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TokenClass {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        TokenClass::parse(&s).map_err(D::Error::custom)
    }
}
