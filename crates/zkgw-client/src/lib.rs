//! # zkgw-client
//!
//! Client for the zk-llm-gateway encrypted infer endpoint. Builds on the
//! envelope protocol core in `zkgw-protocol`:
//!
//! - **[`GatewayClient`]**: drives one request at a time through
//!   seal → submit → open and maps the decrypted reply into a typed result
//! - **Ticket sources**: pluggable providers of single-use authorization
//!   tickets (`DummyTicketSource` for development, `FileTicketPool` for
//!   pre-issued pools)
//! - **Transport**: an object-safe [`InferTransport`] seam with a
//!   `reqwest`-backed [`HttpTransport`] implementation
//! - **Extras**: a chat-completions convenience wrapper and a string
//!   redaction utility
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use zkgw_client::{DummyTicketSource, GatewayClient, GatewayConfig};
//! use zkgw_protocol::TokenClass;
//!
//! let config = GatewayConfig::builder()
//!     .with_base_url("https://gateway.example.com")
//!     .with_public_key_b64(&std::env::var("GATEWAY_PUBLIC_KEY_B64")?)
//!     .build()?;
//!
//! let client = GatewayClient::new(config, Arc::new(DummyTicketSource::new()))?;
//! let reply = client
//!     .infer(TokenClass::C1024, serde_json::json!({
//!         "model": "demo",
//!         "messages": [{"role": "user", "content": "hello"}],
//!     }))
//!     .await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod chat;
pub mod client;
pub mod config;
pub mod error;
pub mod redact;
pub mod ticket_source;
pub mod transport;

pub use client::GatewayClient;
pub use config::{GatewayConfig, GatewayConfigBuilder};
pub use error::{ClientError, Result};
pub use redact::{Redacted, RedactionMode, Redactor};
pub use ticket_source::{DummyTicketSource, FileTicketPool, TicketSource};
pub use transport::{HttpTransport, InferTransport, TransportReply};
