//! Random opaque-token generation and client-secret hashing.
//!
//! Authorization codes are opaque, high-entropy strings; client secrets
//! on `OAuthApplication` records are bcrypt hashes supplied by the external
//! application store. These helpers are the shared primitives both lean on.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::RngCore;

use crate::error::CryptoError;

/// Bcrypt cost factor used when verifying/hashing client secrets.
pub const BCRYPT_COST: u32 = 12;

/// Default length (bytes of entropy before encoding) for an authorization code.
const AUTH_CODE_ENTROPY_BYTES: usize = 32;

/// Generate a cryptographically secure, URL-safe opaque authorization code.
pub fn generate_authorization_code() -> String {
    let mut bytes = [0u8; AUTH_CODE_ENTROPY_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Hash a client secret using bcrypt, for stores that need to persist one.
pub fn hash_client_secret(secret: &str) -> Result<String, CryptoError> {
    bcrypt::hash(secret, BCRYPT_COST).map_err(|e| CryptoError::HashingFailed(e.to_string()))
}

/// Verify a client secret against a stored bcrypt hash.
///
/// Returns `Ok(false)` (not an error) when the secret simply doesn't match;
/// errors are reserved for a malformed stored hash.
pub fn verify_client_secret(secret: &str, hash: &str) -> Result<bool, CryptoError> {
    bcrypt::verify(secret, hash).map_err(|e| CryptoError::HashingFailed(e.to_string()))
}
