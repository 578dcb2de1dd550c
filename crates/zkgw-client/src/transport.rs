//! Transport abstraction for the encrypted infer endpoint.
//!
//! The orchestrator only needs one operation: submit an envelope, get back
//! an HTTP status and a body. Keeping that seam object-safe lets tests
//! drive the full seal → open path against an in-process gateway.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use tracing::debug;

use zkgw_protocol::Envelope;

use crate::config::GatewayConfig;
use crate::error::{ClientError, Result};

/// The raw reply to a submitted envelope.
#[derive(Clone, Debug)]
pub struct TransportReply {
    /// HTTP status code.
    pub status: u16,
    /// Raw response body; an envelope on the happy path, anything on
    /// error paths.
    pub body: Vec<u8>,
}

impl TransportReply {
    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// One-shot submission of a sealed envelope.
#[async_trait]
pub trait InferTransport: Send + Sync {
    /// POST the envelope and return the reply.
    ///
    /// Cancellation is driven from outside: dropping the returned future
    /// must abort the outstanding send/receive and release its resources.
    async fn submit(&self, envelope: &Envelope) -> Result<TransportReply>;
}

/// `reqwest`-backed transport posting JSON envelopes.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    bearer_token: Option<String>,
    extra_headers: HeaderMap,
}

impl HttpTransport {
    /// Build a transport from the client configuration.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Config` when an extra header name or value
    /// is not a valid HTTP header, or the underlying client cannot be
    /// constructed.
    pub fn new(config: &GatewayConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ClientError::Config(format!("cannot build HTTP client: {e}")))?;

        let mut extra_headers = HeaderMap::new();
        for (name, value) in &config.extra_headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ClientError::Config(format!("invalid header name {name:?}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ClientError::Config(format!("invalid header value: {e}")))?;
            extra_headers.insert(name, value);
        }

        Ok(Self {
            client,
            url: config.infer_url(),
            bearer_token: config.bearer_token.clone(),
            extra_headers,
        })
    }
}

#[async_trait]
impl InferTransport for HttpTransport {
    async fn submit(&self, envelope: &Envelope) -> Result<TransportReply> {
        let mut request = self
            .client
            .post(&self.url)
            .header(ACCEPT, "application/json")
            .headers(self.extra_headers.clone())
            .json(envelope);

        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();

        debug!(status, bytes = body.len(), "infer reply received");
        Ok(TransportReply { status, body })
    }
}
