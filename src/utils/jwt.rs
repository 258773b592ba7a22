//! JWT claim shapes shared by the token builder, token validator, and
//! the OTP service, plus the RSA-backed signer all three lean on.
//!
//! Claim structs are kept close to the wire: every kind carries its
//! required fields as named struct members, with a `#[serde(flatten)]`
//! map for the open-ended user-attribute/extension claims each kind
//! describes. Signing/verification crosses a `serde_json::Value` boundary
//! (see `services::signing::JwtSigner`) so the trait stays object-safe
//! across all four claim shapes.

use std::collections::HashMap;

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::error::SignerError;

/// Delegation-chain actor descriptor (the `act` claim). Built as an
/// immutable nested record: each new actor
/// wraps the previous one rather than mutating a shared map, so the
/// chain reads newest-outermost.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Actor {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub act: Option<Box<Actor>>,
}

/// Access-token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    pub sub: String,
    pub aud: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    pub client_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub act: Option<Actor>,
    /// Projected user attributes / pass-through claims from the subject
    /// token (token-exchange). Reserved names never collide since the
    /// attribute intersection already excludes them.
    #[serde(flatten)]
    pub user_attributes: HashMap<String, Value>,
}

/// ID-token claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdTokenClaims {
    pub sub: String,
    pub aud: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    pub auth_time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<String>>,
    #[serde(flatten)]
    pub claims: HashMap<String, Value>,
}

/// Refresh-token claims. The refresh token is itself the
/// server-side state: no separate persisted record exists, so every
/// later validation derives solely from these claims plus the signing key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenClaims {
    pub sub: String,
    pub aud: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
    pub client_id: String,
    pub grant_type: String,
    pub scopes: Vec<String>,
    pub access_token_sub: String,
    pub access_token_aud: String,
}

/// Logical payload carried by an OTP session JWT. Never
/// persisted — the JWT itself is the only record of an in-flight OTP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpData {
    pub recipient: String,
    pub channel: String,
    pub sender_id: String,
    /// Thumbprint of the OTP plaintext (never the plaintext itself).
    pub otp_value: String,
    /// Milliseconds since epoch.
    pub expiry_time: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OtpSessionClaims {
    pub iss: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
    pub otp_data: OtpData,
}

/// RSA key pair used to sign and verify every JWT this service issues —
/// access/ID/refresh tokens and OTP session tokens alike.
/// Supports both PKCS#1 and PKCS#8 PEM encodings of the private key.
#[derive(Clone)]
pub struct JwtManager {
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
}

impl JwtManager {
    pub fn new(private_key_pem: &str, public_key_pem: &str) -> Result<Self, SignerError> {
        let encoding_key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
            .map_err(|e| SignerError::EncodingFailed(format!("invalid private key: {e}")))?;
        let decoding_key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())
            .map_err(|e| SignerError::EncodingFailed(format!("invalid public key: {e}")))?;

        Ok(Self {
            encoding_key: Arc::new(encoding_key),
            decoding_key: Arc::new(decoding_key),
        })
    }

    /// Sign arbitrary claims with RS256. Every token-issuing operation calls
    /// this exactly once.
    pub fn sign(&self, claims: &Value) -> Result<String, SignerError> {
        encode(&Header::new(Algorithm::RS256), claims, &self.encoding_key)
            .map_err(|e| SignerError::EncodingFailed(e.to_string()))
    }

    /// Verify the signature and decode to a raw `Value`. Temporal claims
    /// (`exp`/`nbf`) are deliberately left unchecked here — the caller
    /// enforces them so it can report the exact RFC-mandated failure kind
    /// instead of a generic decode error.
    pub fn decode_unchecked(&self, token: &str) -> Result<Value, SignerError> {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.required_spec_claims.clear();

        decode::<Value>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| SignerError::EncodingFailed(e.to_string()))
    }
}

/// Current time as a Unix timestamp in seconds, for claim assembly.
pub fn now_ts() -> i64 {
    Utc::now().timestamp()
}

/// Current time as milliseconds since epoch, for OTP expiry claims.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}
