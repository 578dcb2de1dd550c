//! Sample entry point for the zk-llm-gateway client.
//!
//! Sends one encrypted chat request and prints the reply.
//!
//! ## Environment
//!
//! - `GATEWAY_URL` - base URL of the gateway (required)
//! - `GATEWAY_PUBLIC_KEY_B64` - the gateway's 32-byte X25519 public key (required)
//! - `MODEL` - upstream model name (default `default`)
//! - `TICKET_FILE` - optional JSON ticket pool; without it a dummy ticket
//!   source is used, which only works against dev-mode gateways
//!
//! ## Usage
//!
//! ```text
//! GATEWAY_URL=http://localhost:8080 \
//! GATEWAY_PUBLIC_KEY_B64=... \
//! cargo run -p infer-cli -- c1024 "What is a nullifier?"
//! ```

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde_json::json;
use tracing::info;

use zkgw_client::{DummyTicketSource, FileTicketPool, GatewayClient, GatewayConfig, TicketSource};
use zkgw_protocol::TokenClass;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let class = match args.next() {
        Some(text) => TokenClass::parse(&text).context("unrecognized token class")?,
        None => TokenClass::C1024,
    };
    let prompt = args.collect::<Vec<_>>().join(" ");
    if prompt.is_empty() {
        bail!("usage: infer-cli [token-class] <prompt>");
    }

    let gateway_url = std::env::var("GATEWAY_URL").context("GATEWAY_URL is not set")?;
    let public_key_b64 =
        std::env::var("GATEWAY_PUBLIC_KEY_B64").context("GATEWAY_PUBLIC_KEY_B64 is not set")?;
    let model = std::env::var("MODEL").unwrap_or_else(|_| "default".to_string());

    let config = GatewayConfig::builder()
        .with_base_url(gateway_url)
        .with_public_key_b64(&public_key_b64)
        .build()?;

    let tickets: Arc<dyn TicketSource> = match std::env::var("TICKET_FILE") {
        Ok(path) => {
            let pool = FileTicketPool::load(&path)?;
            info!(path, "using file-backed ticket pool");
            Arc::new(pool)
        }
        Err(_) => Arc::new(DummyTicketSource::new()),
    };

    let client = GatewayClient::new(config, tickets)?;
    info!(%class, model, "sending encrypted infer request");

    let reply = client
        .chat_completions(
            class,
            json!({
                "model": model,
                "messages": [{"role": "user", "content": prompt}],
            }),
        )
        .await?;

    println!("{}", serde_json::to_string_pretty(&reply)?);
    Ok(())
}
