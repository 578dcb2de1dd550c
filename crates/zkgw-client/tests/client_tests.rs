//! Integration tests for the gateway client.
//!
//! These tests drive the full seal → submit → open path against an
//! in-process mock gateway that holds the static secret and runs the same
//! key schedule from the other side of the exchange.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{json, Value};
use tokio::sync::Mutex;

use zkgw_client::{
    ClientError, DummyTicketSource, FileTicketPool, GatewayClient, GatewayConfig, InferTransport,
    TransportReply,
};
use zkgw_crypto::{aead, Nonce, X25519PublicKey, X25519StaticPrivateKey};
use zkgw_protocol::{
    derive_envelope_keys, pad, request_aad, response_aad, unpad, Envelope, EnvelopeError,
    GatewayPublicKey, Ticket, TokenClass, PROTOCOL_VERSION,
};

/// What the mock gateway should answer with.
#[derive(Clone)]
enum Behavior {
    /// Sealed tagged-ok reply with the given response object.
    Ok(Value),
    /// Sealed tagged-err reply with the given status.
    Err {
        code: &'static str,
        message: &'static str,
        status: u16,
    },
    /// Sealed untagged reply (legacy shapes, missing payloads).
    Plain(Value),
    /// Raw unencrypted body with the given status.
    Raw { status: u16, body: &'static str },
    /// Correct reply, but carrying a foreign ephemeral key.
    WrongEphemeral,
    /// Sleep without answering, to trip the client timeout.
    Hang,
}

/// In-process gateway: decrypts the request, records it, answers per the
/// configured behavior.
struct MockGateway {
    secret: X25519StaticPrivateKey,
    behavior: Behavior,
    seen_requests: Mutex<Vec<Value>>,
}

impl MockGateway {
    fn new(behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            secret: X25519StaticPrivateKey::generate(),
            behavior,
            seen_requests: Mutex::new(Vec::new()),
        })
    }

    fn public_key(&self) -> GatewayPublicKey {
        GatewayPublicKey::from_bytes(self.secret.public_key().as_bytes()).unwrap()
    }

    fn config(&self) -> GatewayConfig {
        GatewayConfig::builder()
            .with_base_url("https://gateway.test")
            .with_public_key(self.public_key())
            .with_request_timeout(Duration::from_millis(250))
            .build()
            .unwrap()
    }

    async fn seen(&self) -> Vec<Value> {
        self.seen_requests.lock().await.clone()
    }

    fn open_request(&self, envelope: &Envelope) -> Value {
        let eph_bytes = STANDARD.decode(&envelope.eph_pubkey_b64).unwrap();
        let eph = X25519PublicKey::from_bytes(&eph_bytes).unwrap();
        let shared = self.secret.diffie_hellman(&eph);
        let (k_req, _) = derive_envelope_keys(&shared, envelope.token_class).unwrap();

        let nonce = Nonce::from_bytes(&STANDARD.decode(&envelope.nonce_b64).unwrap()).unwrap();
        let ciphertext = STANDARD.decode(&envelope.ciphertext_b64).unwrap();
        let frame = aead::decrypt(
            &k_req,
            &nonce,
            &ciphertext,
            &request_aad(envelope.token_class),
        )
        .unwrap();
        serde_json::from_slice(unpad(&frame).unwrap()).unwrap()
    }

    fn seal_reply(&self, request_envelope: &Envelope, payload: &Value, eph_b64: &str) -> Envelope {
        let class = request_envelope.token_class;
        let eph_bytes = STANDARD.decode(&request_envelope.eph_pubkey_b64).unwrap();
        let eph = X25519PublicKey::from_bytes(&eph_bytes).unwrap();
        let shared = self.secret.diffie_hellman(&eph);
        let (_, k_resp) = derive_envelope_keys(&shared, class).unwrap();

        let bytes = serde_json::to_vec(payload).unwrap();
        let frame = pad(&bytes, class.response_padded_len()).unwrap();
        let nonce = Nonce::generate();
        let ciphertext = aead::encrypt(&k_resp, &nonce, &frame, &response_aad(class)).unwrap();

        Envelope {
            v: PROTOCOL_VERSION,
            token_class: class,
            eph_pubkey_b64: eph_b64.to_string(),
            nonce_b64: STANDARD.encode(nonce.as_bytes()),
            ciphertext_b64: STANDARD.encode(&ciphertext),
        }
    }
}

#[async_trait]
impl InferTransport for MockGateway {
    async fn submit(&self, envelope: &Envelope) -> Result<TransportReply, ClientError> {
        if matches!(self.behavior, Behavior::Hang) {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if let Behavior::Raw { status, body } = &self.behavior {
            return Ok(TransportReply {
                status: *status,
                body: body.as_bytes().to_vec(),
            });
        }

        let request = self.open_request(envelope);
        self.seen_requests.lock().await.push(request);

        let (payload, status, eph_b64) = match &self.behavior {
            Behavior::Ok(response) => (
                json!({"kind": "ok", "response": response}),
                200,
                envelope.eph_pubkey_b64.clone(),
            ),
            Behavior::Err {
                code,
                message,
                status,
            } => (
                json!({"kind": "err", "error": {"code": code, "message": message}}),
                *status,
                envelope.eph_pubkey_b64.clone(),
            ),
            Behavior::Plain(payload) => (payload.clone(), 200, envelope.eph_pubkey_b64.clone()),
            Behavior::WrongEphemeral => (
                json!({"kind": "ok", "response": {}}),
                200,
                STANDARD.encode([0x42u8; 32]),
            ),
            Behavior::Raw { .. } | Behavior::Hang => unreachable!(),
        };

        let reply = self.seal_reply(envelope, &payload, &eph_b64);
        Ok(TransportReply {
            status,
            body: serde_json::to_vec(&reply).unwrap(),
        })
    }
}

fn client_with(gateway: &Arc<MockGateway>) -> GatewayClient {
    GatewayClient::with_transport(
        gateway.config(),
        gateway.clone(),
        Arc::new(DummyTicketSource::new()),
    )
    .unwrap()
}

fn chat_upstream() -> Value {
    json!({
        "model": "demo-model",
        "messages": [{"role": "user", "content": "hello"}],
    })
}

#[tokio::test]
async fn infer_roundtrip_returns_ok_response() {
    let response = json!({
        "request_id": "filled-by-gateway",
        "model": "demo-model",
        "output": "hi!",
        "billed_token_class": "c1024",
    });
    let gateway = MockGateway::new(Behavior::Ok(response.clone()));
    let client = client_with(&gateway);

    let result = client
        .infer(TokenClass::C1024, chat_upstream())
        .await
        .unwrap();
    assert_eq!(result, response);

    let seen = gateway.seen().await;
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0]["model"], "demo-model");
    assert_eq!(seen[0]["token_class"], "c1024");
    assert_eq!(seen[0]["max_tokens"], 1024);
    assert_eq!(
        STANDARD
            .decode(seen[0]["ticket"]["nullifier"].as_str().unwrap())
            .unwrap()
            .len(),
        32
    );
}

#[tokio::test]
async fn gateway_error_beats_http_status() {
    let gateway = MockGateway::new(Behavior::Err {
        code: "quota_exceeded",
        message: "ticket spent",
        status: 500,
    });
    let client = client_with(&gateway);

    let result = client.infer(TokenClass::C512, chat_upstream()).await;
    assert!(matches!(
        result,
        Err(ClientError::Gateway { code, message })
            if code == "quota_exceeded" && message == "ticket spent"
    ));
}

#[tokio::test]
async fn unstructured_failure_surfaces_http_status() {
    let gateway = MockGateway::new(Behavior::Raw {
        status: 500,
        body: "internal server error",
    });
    let client = client_with(&gateway);

    let result = client.infer(TokenClass::C256, chat_upstream()).await;
    assert!(matches!(result, Err(ClientError::Http(500))));
}

#[tokio::test]
async fn legacy_upstream_shape_is_returned() {
    let gateway = MockGateway::new(Behavior::Plain(json!({"upstream": {"ok": true}})));
    let client = client_with(&gateway);

    let result = client
        .infer(TokenClass::C256, chat_upstream())
        .await
        .unwrap();
    assert_eq!(result, json!({"ok": true}));
}

#[tokio::test]
async fn empty_reply_is_a_protocol_error() {
    let gateway = MockGateway::new(Behavior::Plain(json!({})));
    let client = client_with(&gateway);

    let result = client.infer(TokenClass::C256, chat_upstream()).await;
    assert!(matches!(
        result,
        Err(ClientError::Envelope(EnvelopeError::Protocol(_)))
    ));
}

#[tokio::test]
async fn non_envelope_success_body_is_a_protocol_error() {
    let gateway = MockGateway::new(Behavior::Raw {
        status: 200,
        body: "not an envelope",
    });
    let client = client_with(&gateway);

    let result = client.infer(TokenClass::C256, chat_upstream()).await;
    assert!(matches!(
        result,
        Err(ClientError::Envelope(EnvelopeError::Protocol(_)))
    ));
}

#[tokio::test]
async fn foreign_ephemeral_is_a_crypto_error() {
    let gateway = MockGateway::new(Behavior::WrongEphemeral);
    let client = client_with(&gateway);

    let result = client.infer(TokenClass::C256, chat_upstream()).await;
    assert!(matches!(
        result,
        Err(ClientError::Envelope(EnvelopeError::Crypto(_)))
    ));
}

#[tokio::test]
async fn timeout_cancels_the_call() {
    let gateway = MockGateway::new(Behavior::Hang);
    let client = client_with(&gateway);

    let started = std::time::Instant::now();
    let result = client.infer(TokenClass::C256, chat_upstream()).await;

    assert!(matches!(result, Err(ClientError::Timeout)));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn mismatched_ticket_class_fails_before_sending() {
    let gateway = MockGateway::new(Behavior::Ok(json!({})));
    let client = client_with(&gateway);

    let ticket = Ticket {
        nullifier: STANDARD.encode([9u8; 32]),
        commitment_root: Ticket::zero_commitment_root(),
        token_class: TokenClass::C512,
        proof: String::new(),
    };

    let result = client
        .infer_with_ticket(TokenClass::C1024, ticket, chat_upstream())
        .await;

    assert!(matches!(
        result,
        Err(ClientError::Envelope(EnvelopeError::Protocol(_)))
    ));
    assert!(gateway.seen().await.is_empty());
}

#[tokio::test]
async fn caller_supplied_ticket_is_forwarded_verbatim() {
    let gateway = MockGateway::new(Behavior::Ok(json!({"output": "ok"})));
    let ticket = Ticket {
        nullifier: STANDARD.encode([9u8; 32]),
        commitment_root: Ticket::zero_commitment_root(),
        token_class: TokenClass::C512,
        proof: "cHJvb2Y=".to_string(),
    };

    let client = client_with(&gateway);
    client
        .infer_with_ticket(TokenClass::C512, ticket.clone(), chat_upstream())
        .await
        .unwrap();

    let seen = gateway.seen().await;
    assert_eq!(seen[0]["ticket"]["nullifier"], ticket.nullifier);
    assert_eq!(seen[0]["ticket"]["proof"], "cHJvb2Y=");
}

#[tokio::test]
async fn file_pool_drains_across_calls() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("tickets.json");
    std::fs::write(
        &path,
        r#"[{"nullifier": "AA==", "token_class": "c2048", "proof": ""}]"#,
    )
    .unwrap();

    let gateway = MockGateway::new(Behavior::Ok(json!({"output": "ok"})));
    let pool = Arc::new(FileTicketPool::load(&path).unwrap());
    let client =
        GatewayClient::with_transport(gateway.config(), gateway.clone(), pool.clone()).unwrap();

    client
        .infer(TokenClass::C2048, chat_upstream())
        .await
        .unwrap();
    assert_eq!(pool.len().await, 0);

    let second = client.infer(TokenClass::C2048, chat_upstream()).await;
    assert!(matches!(second, Err(ClientError::TicketExhausted(_))));
    // The second call never reached the gateway.
    assert_eq!(gateway.seen().await.len(), 1);
}

#[tokio::test]
async fn chat_completions_repackages_the_reply() {
    let gateway = MockGateway::new(Behavior::Ok(json!({
        "request_id": "req-9",
        "model": "demo-model",
        "output": "hello back",
        "billed_token_class": "c512",
    })));
    let client = client_with(&gateway);

    let chat = client
        .chat_completions(TokenClass::C512, chat_upstream())
        .await
        .unwrap();

    assert_eq!(chat["object"], "chat.completion");
    assert_eq!(chat["choices"][0]["finish_reason"], "stop");
    assert_eq!(chat["choices"][0]["message"]["role"], "assistant");
    assert_eq!(chat["choices"][0]["message"]["content"], "hello back");
}
