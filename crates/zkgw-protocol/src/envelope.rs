//! Envelope sealing and opening.
//!
//! Every request establishes a fresh ephemeral X25519 key against the
//! gateway's static public key. The shared secret feeds an HKDF-SHA-256
//! schedule that derives one key per direction, bound to the size class;
//! the padded frame is then encrypted with ChaCha20-Poly1305 under a
//! 3-byte AAD of `[version, class id, direction]`.
//!
//! ## Direction Separation
//!
//! The same ephemeral exchange covers both directions, so the two keys are
//! domain-separated through the HKDF `info` input (`/req` vs `/resp`).
//! Mixing the class id into both the `info` and the AAD is deliberate: the
//! AAD protects the on-wire header, the `info` binding protects against
//! key reuse across classes should a caller ever reuse a shared secret.
//!
//! ## Response Binding
//!
//! The gateway echoes the client's ephemeral public key verbatim in its
//! reply. [`open`] requires the echoed key to match the seal state
//! byte-for-byte, tying a response to the exact in-flight request.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use hkdf::Hkdf;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::Zeroize;

use zkgw_crypto::{
    aead, CryptoError, Nonce, SharedSecret, SymmetricKey, X25519EphemeralKeyPair, X25519PublicKey,
    PUBLIC_KEY_SIZE,
};

use crate::error::{EnvelopeError, Result};
use crate::padding::{pad, unpad};
use crate::token_class::TokenClass;

/// Protocol version carried in every envelope.
pub const PROTOCOL_VERSION: u8 = 1;

/// Context string opening the HKDF `info` input.
const KDF_CONTEXT: &[u8] = b"zk-llm-gateway-envelope-v1";

/// HKDF salt: 32 zero bytes, fixed by the wire contract.
const KDF_SALT: [u8; 32] = [0u8; 32];

/// Direction byte for client → gateway.
const DIRECTION_REQUEST: u8 = 1;

/// Direction byte for gateway → client.
const DIRECTION_RESPONSE: u8 = 2;

/// The gateway's static X25519 public key.
///
/// Stored as the 32 raw bytes; SPKI DER wrapping happens only at
/// interfaces that demand it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GatewayPublicKey(X25519PublicKey);

impl GatewayPublicKey {
    /// Build the key from exactly 32 base64-decoded bytes.
    ///
    /// # Errors
    ///
    /// Returns `EnvelopeError::InvalidGatewayPublicKey` on a decode
    /// failure or any other length.
    pub fn from_base64(text: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(text.trim())
            .map_err(|e| EnvelopeError::InvalidGatewayPublicKey(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Build the key from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        X25519PublicKey::from_bytes(bytes)
            .map(Self)
            .map_err(|e| EnvelopeError::InvalidGatewayPublicKey(e.to_string()))
    }

    /// The raw key bytes.
    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        self.0.as_bytes()
    }

    /// Base64 of the raw key bytes.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0.as_bytes())
    }

    /// The key wrapped into X25519 SPKI DER form.
    pub fn to_spki_der(&self) -> Vec<u8> {
        self.0.to_spki_der()
    }

    /// Unwrap a key from X25519 SPKI DER form.
    pub fn from_spki_der(der: &[u8]) -> Result<Self> {
        X25519PublicKey::from_spki_der(der)
            .map(Self)
            .map_err(|e| EnvelopeError::InvalidGatewayPublicKey(e.to_string()))
    }
}

/// The wire envelope carried in both directions.
///
/// Peer implementations may spell the ephemeral field `kem_pub_b64` and
/// the version field `version`; both are accepted on parse. Emission
/// always uses `eph_pubkey_b64` and `v`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Envelope {
    /// Protocol version, currently 1.
    #[serde(alias = "version")]
    pub v: u8,
    /// Symbolic size class.
    pub token_class: TokenClass,
    /// Base64 of the 32-byte ephemeral sender public key. A response
    /// echoes the client's ephemeral key verbatim.
    #[serde(alias = "kem_pub_b64")]
    pub eph_pubkey_b64: String,
    /// Base64 of the 12-byte AEAD nonce for this direction.
    pub nonce_b64: String,
    /// Base64 of the ciphertext with its 16-byte tag appended.
    pub ciphertext_b64: String,
}

/// Per-request secret context retained between sealing and opening.
///
/// Created by [`seal`], consumed by [`open`]; it must never outlive a
/// single request/response pair. The derived keys zeroize themselves on
/// drop, so a seal state abandoned by a cancelled call leaks nothing.
pub struct SealState {
    class: TokenClass,
    eph_pubkey: [u8; PUBLIC_KEY_SIZE],
    k_req: SymmetricKey,
    k_resp: SymmetricKey,
}

impl SealState {
    /// The size class this exchange was sealed at.
    pub fn token_class(&self) -> TokenClass {
        self.class
    }

    /// The ephemeral public key the gateway must echo.
    pub fn eph_pubkey(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.eph_pubkey
    }

    /// The client → gateway key for this exchange.
    ///
    /// # Security
    ///
    /// Exposed for gateway-side harnesses; avoid logging or persisting.
    pub fn request_key(&self) -> &SymmetricKey {
        &self.k_req
    }

    /// The gateway → client key for this exchange.
    ///
    /// # Security
    ///
    /// Exposed for gateway-side harnesses; avoid logging or persisting.
    pub fn response_key(&self) -> &SymmetricKey {
        &self.k_resp
    }
}

impl std::fmt::Debug for SealState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SealState")
            .field("class", &self.class)
            .field("keys", &"[REDACTED]")
            .finish()
    }
}

/// AAD for the client → gateway direction.
pub const fn request_aad(class: TokenClass) -> [u8; 3] {
    [PROTOCOL_VERSION, class.id(), DIRECTION_REQUEST]
}

/// AAD for the gateway → client direction.
pub const fn response_aad(class: TokenClass) -> [u8; 3] {
    [PROTOCOL_VERSION, class.id(), DIRECTION_RESPONSE]
}

fn derive_direction_key(
    shared: &SharedSecret,
    suffix: &[u8],
    class: TokenClass,
) -> Result<SymmetricKey> {
    let hk = Hkdf::<Sha256>::new(Some(&KDF_SALT), shared.as_bytes());

    let mut info = Vec::with_capacity(KDF_CONTEXT.len() + suffix.len() + 1);
    info.extend_from_slice(KDF_CONTEXT);
    info.extend_from_slice(suffix);
    info.push(class.id());

    let mut okm = [0u8; 32];
    hk.expand(&info, &mut okm)
        .map_err(|_| CryptoError::KeyDerivation("HKDF expand failed".to_string()))?;

    let key = SymmetricKey::from_bytes(&okm)?;
    okm.zeroize();
    Ok(key)
}

/// Derive the direction-separated envelope keys `(K_req, K_resp)`.
///
/// Both sides of the exchange run this with the same shared secret; the
/// gateway uses it to open requests and seal responses.
pub fn derive_envelope_keys(
    shared: &SharedSecret,
    class: TokenClass,
) -> Result<(SymmetricKey, SymmetricKey)> {
    let k_req = derive_direction_key(shared, b"/req", class)?;
    let k_resp = derive_direction_key(shared, b"/resp", class)?;
    Ok((k_req, k_resp))
}

/// Seal a payload into a request envelope.
///
/// Serializes the payload to compact JSON, pads it to the class's request
/// length, performs the ephemeral key exchange and key schedule, and
/// encrypts under `K_req` with a fresh random nonce.
///
/// Returns the envelope together with the seal state needed to open the
/// gateway's reply.
pub fn seal(
    payload: &serde_json::Value,
    class: TokenClass,
    gateway_key: &GatewayPublicKey,
) -> Result<(Envelope, SealState)> {
    let payload_bytes = serde_json::to_vec(payload)
        .map_err(|e| EnvelopeError::Protocol(format!("payload serialization failed: {e}")))?;
    let frame = pad(&payload_bytes, class.request_padded_len())?;

    let ephemeral = X25519EphemeralKeyPair::generate();
    let eph_pubkey = ephemeral.public_key().to_bytes();

    let shared = ephemeral.diffie_hellman(&gateway_key.0);
    let (k_req, k_resp) = derive_envelope_keys(&shared, class)?;

    let nonce = Nonce::generate();
    let ciphertext = aead::encrypt(&k_req, &nonce, &frame, &request_aad(class))?;

    let envelope = Envelope {
        v: PROTOCOL_VERSION,
        token_class: class,
        eph_pubkey_b64: STANDARD.encode(eph_pubkey),
        nonce_b64: STANDARD.encode(nonce.as_bytes()),
        ciphertext_b64: STANDARD.encode(&ciphertext),
    };

    let state = SealState {
        class,
        eph_pubkey,
        k_req,
        k_resp,
    };

    Ok((envelope, state))
}

/// Open a response envelope, consuming the seal state.
///
/// Verifies the protocol version, the declared size class, and the echoed
/// ephemeral key before decrypting under `K_resp` with the response AAD,
/// unpadding, and parsing the payload as JSON.
///
/// # Errors
///
/// Every header or authentication failure surfaces as
/// `EnvelopeError::Crypto` with a short reason; JSON well-formedness
/// failures after decryption surface as `EnvelopeError::Protocol`.
pub fn open(state: SealState, envelope: &Envelope) -> Result<serde_json::Value> {
    if envelope.v != PROTOCOL_VERSION {
        return Err(CryptoError::Binding(format!(
            "unsupported envelope version {}",
            envelope.v
        ))
        .into());
    }
    if envelope.token_class != state.class {
        return Err(CryptoError::Binding(format!(
            "token class mismatch: sealed {}, response {}",
            state.class, envelope.token_class
        ))
        .into());
    }

    let eph = STANDARD.decode(&envelope.eph_pubkey_b64)?;
    if eph != state.eph_pubkey {
        return Err(CryptoError::Binding("unexpected eph_pubkey in response".to_string()).into());
    }

    let nonce = Nonce::from_bytes(&STANDARD.decode(&envelope.nonce_b64)?)?;
    let ciphertext = STANDARD.decode(&envelope.ciphertext_b64)?;

    let frame = aead::decrypt(
        &state.k_resp,
        &nonce,
        &ciphertext,
        &response_aad(state.class),
    )?;
    let payload = unpad(&frame)?;

    serde_json::from_slice(payload)
        .map_err(|e| EnvelopeError::Protocol(format!("invalid JSON in decrypted payload: {e}")))
}
