//! The request orchestrator.
//!
//! [`GatewayClient`] drives one call at a time: acquire a ticket, assemble
//! the plaintext payload, seal it, submit the envelope, open the reply
//! with the retained seal state, and map the decrypted value into a typed
//! result or a typed error.

use std::sync::Arc;

use serde_json::{json, Map, Value};
use tokio::time::timeout;
use tracing::debug;
use uuid::Uuid;

use zkgw_protocol::{open, seal, Envelope, EnvelopeError, Ticket, TokenClass};

use crate::config::GatewayConfig;
use crate::error::{ClientError, Result};
use crate::ticket_source::TicketSource;
use crate::transport::{HttpTransport, InferTransport};

/// Client for the encrypted infer endpoint.
///
/// A single instance may be used concurrently from multiple tasks as long
/// as its transport and ticket source are themselves safe for concurrent
/// use; the client holds no mutable state beyond the per-call seal state.
pub struct GatewayClient {
    config: GatewayConfig,
    transport: Arc<dyn InferTransport>,
    tickets: Arc<dyn TicketSource>,
}

impl GatewayClient {
    /// Create a client with the HTTP transport and the given ticket source.
    pub fn new(config: GatewayConfig, tickets: Arc<dyn TicketSource>) -> Result<Self> {
        config.validate()?;
        let transport = Arc::new(HttpTransport::new(&config)?);
        Ok(Self {
            config,
            transport,
            tickets,
        })
    }

    /// Create a client with a custom transport (used by tests and tools
    /// that tunnel the envelope over something other than plain HTTP).
    pub fn with_transport(
        config: GatewayConfig,
        transport: Arc<dyn InferTransport>,
        tickets: Arc<dyn TicketSource>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            transport,
            tickets,
        })
    }

    /// The client configuration.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Run one inference call, pulling a ticket from the source.
    ///
    /// `upstream` is either a chat-style object (`{model, messages, …}`)
    /// or a transport-envelope-style object (`{path, body}`).
    pub async fn infer(&self, class: TokenClass, upstream: Value) -> Result<Value> {
        let ticket = self.tickets.next_ticket(class).await?;
        self.run(class, ticket, upstream).await
    }

    /// Run one inference call with a caller-supplied ticket.
    ///
    /// # Errors
    ///
    /// Returns a protocol error when the ticket's class does not match
    /// `class`, before anything is sent.
    pub async fn infer_with_ticket(
        &self,
        class: TokenClass,
        ticket: Ticket,
        upstream: Value,
    ) -> Result<Value> {
        if ticket.token_class != class {
            return Err(EnvelopeError::Protocol(format!(
                "ticket class {} does not match requested class {}",
                ticket.token_class, class
            ))
            .into());
        }
        self.run(class, ticket, upstream).await
    }

    async fn run(&self, class: TokenClass, ticket: Ticket, upstream: Value) -> Result<Value> {
        let payload = build_request_payload(class, ticket, &upstream)?;
        let (envelope, state) = seal(&payload, class, &self.config.public_key)?;
        debug!(%class, "request sealed");

        let reply = match timeout(self.config.request_timeout, self.transport.submit(&envelope))
            .await
        {
            Ok(reply) => reply?,
            // The transport future is dropped here, aborting the
            // outstanding send/receive; the seal state dies with us.
            Err(_) => {
                debug!(%class, "infer call timed out");
                return Err(ClientError::Timeout);
            }
        };

        let response_env: Envelope = match serde_json::from_slice(&reply.body) {
            Ok(env) => env,
            Err(e) if reply.is_success() => {
                return Err(
                    EnvelopeError::Protocol(format!("reply is not an envelope: {e}")).into(),
                );
            }
            Err(_) => return Err(ClientError::Http(reply.status)),
        };

        let decrypted = match open(state, &response_env) {
            Ok(value) => value,
            Err(e) if reply.is_success() => return Err(e.into()),
            // A structured gateway error takes priority over the status,
            // but an undecryptable body on a failed status is just HTTP.
            Err(_) => return Err(ClientError::Http(reply.status)),
        };

        interpret_reply(decrypted, reply.status)
    }
}

impl std::fmt::Debug for GatewayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayClient")
            .field("url", &self.config.infer_url())
            .finish()
    }
}

/// Assemble the plaintext request payload around the upstream body.
fn build_request_payload(class: TokenClass, ticket: Ticket, upstream: &Value) -> Result<Value> {
    let chat = coerce_upstream(upstream)?;

    let model = chat
        .get("model")
        .and_then(Value::as_str)
        .ok_or_else(|| EnvelopeError::Protocol("upstream payload missing model".into()))?;
    let messages = chat
        .get("messages")
        .filter(|m| m.is_array())
        .ok_or_else(|| EnvelopeError::Protocol("upstream payload missing messages".into()))?;

    let max_tokens = chat
        .get("max_tokens")
        .and_then(Value::as_u64)
        .unwrap_or(u64::from(class.max_output_tokens_hint()));

    let mut payload = Map::new();
    payload.insert("request_id".into(), json!(Uuid::new_v4().to_string()));
    payload.insert("model".into(), json!(model));
    payload.insert("messages".into(), messages.clone());
    payload.insert("max_tokens".into(), json!(max_tokens));
    if let Some(temperature) = chat.get("temperature").filter(|t| t.is_number()) {
        payload.insert("temperature".into(), temperature.clone());
    }
    payload.insert("token_class".into(), json!(class));
    payload.insert(
        "ticket".into(),
        serde_json::to_value(ticket)
            .map_err(|e| EnvelopeError::Protocol(format!("ticket serialization failed: {e}")))?,
    );

    Ok(Value::Object(payload))
}

/// Accept a chat-style object directly, or unwrap `{path, body}`.
fn coerce_upstream(upstream: &Value) -> Result<&Map<String, Value>> {
    let obj = upstream
        .as_object()
        .ok_or_else(|| EnvelopeError::Protocol("upstream payload is not an object".into()))?;

    if obj.contains_key("messages") {
        return Ok(obj);
    }
    if obj.contains_key("path") {
        if let Some(body) = obj.get("body").and_then(Value::as_object) {
            return Ok(body);
        }
    }
    Err(EnvelopeError::Protocol("unsupported upstream payload shape".into()).into())
}

/// Map the decrypted reply into the caller's result.
///
/// Precedence: tagged `ok`, tagged `err`, legacy `error`, HTTP status,
/// legacy `upstream`, then a missing-payload protocol error.
fn interpret_reply(decrypted: Value, status: u16) -> Result<Value> {
    let obj = decrypted
        .as_object()
        .ok_or_else(|| EnvelopeError::Protocol("decrypted payload is not an object".into()))?;

    match obj.get("kind").and_then(Value::as_str) {
        Some("ok") => {
            return obj
                .get("response")
                .cloned()
                .ok_or_else(|| EnvelopeError::Protocol("ok reply missing response".into()).into());
        }
        Some("err") => return Err(gateway_error(obj.get("error"))),
        _ => {}
    }

    if let Some(error) = obj.get("error").filter(|e| e.is_object()) {
        return Err(gateway_error(Some(error)));
    }
    if !(200..300).contains(&status) {
        return Err(ClientError::Http(status));
    }
    if let Some(upstream) = obj.get("upstream") {
        return Ok(upstream.clone());
    }
    Err(EnvelopeError::Protocol("missing response payload".into()).into())
}

fn gateway_error(error: Option<&Value>) -> ClientError {
    let code = error
        .and_then(|e| e.get("code"))
        .map(|c| match c {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .unwrap_or_default();
    let message = error
        .and_then(|e| e.get("message"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    ClientError::Gateway { code, message }
}
