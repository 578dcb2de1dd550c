//! Configuration for the gateway client.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use zkgw_client::GatewayConfig;
//!
//! let config = GatewayConfig::builder()
//!     .with_base_url("https://gateway.example.com")
//!     .with_public_key_b64("…44 chars of base64…")
//!     .with_bearer_token("secret")
//!     .with_request_timeout(Duration::from_secs(30))
//!     .build()?;
//! ```

use std::time::Duration;

use zkgw_protocol::GatewayPublicKey;

use crate::error::{ClientError, Result};

/// Default path of the encrypted infer endpoint.
pub const DEFAULT_INFER_PATH: &str = "/v1/infer";

/// Default per-request timeout.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Configuration for a [`crate::GatewayClient`].
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    /// Base URL of the gateway, without a trailing slash.
    pub base_url: String,

    /// Path of the encrypted infer endpoint.
    pub infer_path: String,

    /// The gateway's static X25519 public key.
    pub public_key: GatewayPublicKey,

    /// Optional bearer token sent as `authorization: Bearer <token>`.
    pub bearer_token: Option<String>,

    /// Extra headers attached to every request.
    pub extra_headers: Vec<(String, String)>,

    /// Timeout cancelling the in-flight transport call.
    pub request_timeout: Duration,
}

impl GatewayConfig {
    /// Create a configuration builder.
    pub fn builder() -> GatewayConfigBuilder {
        GatewayConfigBuilder::new()
    }

    /// Full URL of the infer endpoint.
    pub fn infer_url(&self) -> String {
        format!("{}{}", self.base_url, self.infer_path)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(ClientError::Config("base_url cannot be empty".into()));
        }
        if !self.infer_path.starts_with('/') {
            return Err(ClientError::Config(format!(
                "infer_path must start with '/': {:?}",
                self.infer_path
            )));
        }
        if self.request_timeout.is_zero() {
            return Err(ClientError::Config(
                "request_timeout must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

/// Builder for [`GatewayConfig`].
#[derive(Clone, Debug, Default)]
pub struct GatewayConfigBuilder {
    base_url: Option<String>,
    infer_path: Option<String>,
    public_key: Option<GatewayPublicKey>,
    bearer_token: Option<String>,
    extra_headers: Vec<(String, String)>,
    request_timeout: Option<Duration>,
}

impl GatewayConfigBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the gateway base URL. A trailing slash is stripped.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        let url: String = url.into();
        self.base_url = Some(url.trim_end_matches('/').to_string());
        self
    }

    /// Override the infer endpoint path (default `/v1/infer`).
    pub fn with_infer_path(mut self, path: impl Into<String>) -> Self {
        self.infer_path = Some(path.into());
        self
    }

    /// Set the gateway public key from its base64 form.
    ///
    /// # Errors
    ///
    /// The error is deferred to [`build`](Self::build) so builder chains
    /// stay infallible; an invalid key fails the build.
    pub fn with_public_key_b64(mut self, b64: &str) -> Self {
        self.public_key = GatewayPublicKey::from_base64(b64).ok();
        self
    }

    /// Set the gateway public key directly.
    pub fn with_public_key(mut self, key: GatewayPublicKey) -> Self {
        self.public_key = Some(key);
        self
    }

    /// Set the bearer token.
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Attach an extra header to every request.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra_headers.push((name.into(), value.into()));
        self
    }

    /// Override the per-request timeout (default 60 s).
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Config` when a required field is missing or
    /// invalid.
    pub fn build(self) -> Result<GatewayConfig> {
        let base_url = self
            .base_url
            .ok_or_else(|| ClientError::Config("base_url is required".into()))?;
        let public_key = self
            .public_key
            .ok_or_else(|| ClientError::Config("a valid gateway public key is required".into()))?;

        let config = GatewayConfig {
            base_url,
            infer_path: self
                .infer_path
                .unwrap_or_else(|| DEFAULT_INFER_PATH.to_string()),
            public_key,
            bearer_token: self.bearer_token,
            extra_headers: self.extra_headers,
            request_timeout: self.request_timeout.unwrap_or(DEFAULT_REQUEST_TIMEOUT),
        };
        config.validate()?;
        Ok(config)
    }
}
