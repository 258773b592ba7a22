//! Object-safe signer boundary so the token builder and token validator
//! depend on a trait rather than the concrete `JwtManager`.
//! Claim structs differ in shape across access/ID/refresh/OTP tokens, so
//! the trait crosses at `serde_json::Value` rather than exposing a
//! generic `<T: Serialize>` method, which would not be object-safe.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::SignerError;
use crate::utils::jwt::JwtManager;

#[async_trait]
pub trait JwtSigner: Send + Sync {
    async fn sign(&self, claims: &Value) -> Result<String, SignerError>;

    /// Signature-verified, temporal-claims-unchecked decode (see
    /// `JwtManager::decode_unchecked` for why `exp`/`nbf` are deferred
    /// to the caller).
    async fn decode_unchecked(&self, token: &str) -> Result<Value, SignerError>;
}

#[async_trait]
impl JwtSigner for JwtManager {
    async fn sign(&self, claims: &Value) -> Result<String, SignerError> {
        JwtManager::sign(self, claims)
    }

    async fn decode_unchecked(&self, token: &str) -> Result<Value, SignerError> {
        JwtManager::decode_unchecked(self, token)
    }
}
