//! Symmetric encryption for marked-secret sender properties.
//!
//! Notification-sender properties such as a Twilio auth token or a Vonage
//! api_secret are stored encrypted at rest. Encryption is AEAD (AES-256-GCM):
//! a fresh random nonce is generated per call and prefixed to the ciphertext,
//! then the whole thing is base64-encoded for storage in a text column.

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, AeadCore, Key, Nonce};
use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::CryptoError;

const NONCE_LEN: usize = 12;

/// Symmetric encryptor/decryptor for sender-property secrets.
///
/// Constructed once at process start from `Config.crypto_key` and shared
/// (it is `Clone` + cheap: `Aes256Gcm` holds only the expanded key schedule).
#[derive(Clone)]
pub struct PropertyCrypto {
    cipher: Aes256Gcm,
}

impl PropertyCrypto {
    /// Build from a raw 32-byte key.
    pub fn new(key_bytes: &[u8; 32]) -> Self {
        let key = Key::<Aes256Gcm>::from_slice(key_bytes);
        Self {
            cipher: Aes256Gcm::new(key),
        }
    }

    /// Build from a base64-encoded 32-byte key, as read from config/env.
    pub fn from_base64_key(encoded: &str) -> Result<Self, CryptoError> {
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| CryptoError::InvalidKey("encryption key must be 32 bytes".to_string()))?;
        Ok(Self::new(&bytes))
    }

    /// Encrypt `plaintext`, returning a base64-encoded `nonce || ciphertext`.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| CryptoError::EncryptionFailed)?;

        let mut combined = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        combined.extend_from_slice(&nonce);
        combined.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(combined))
    }

    /// Decrypt a value produced by [`encrypt`](Self::encrypt).
    pub fn decrypt(&self, encoded: &str) -> Result<String, CryptoError> {
        let combined = STANDARD
            .decode(encoded)
            .map_err(|_| CryptoError::DecryptionFailed)?;
        if combined.len() < NONCE_LEN {
            return Err(CryptoError::DecryptionFailed);
        }
        let (nonce_bytes, ciphertext) = combined.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);

        let plaintext = self
            .cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| CryptoError::DecryptionFailed)?;

        String::from_utf8(plaintext).map_err(|_| CryptoError::DecryptionFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_crypto() -> PropertyCrypto {
        PropertyCrypto::new(&[7u8; 32])
    }

    #[test]
    fn encrypt_then_decrypt_round_trips() {
        let crypto = test_crypto();
        let ciphertext = crypto.encrypt("AC1234567890abcdef1234567890abcd").unwrap();
        let plaintext = crypto.decrypt(&ciphertext).unwrap();
        assert_eq!(plaintext, "AC1234567890abcdef1234567890abcd");
    }

    #[test]
    fn ciphertext_never_equals_plaintext() {
        let crypto = test_crypto();
        let plaintext = "super-secret-auth-token";
        let ciphertext = crypto.encrypt(plaintext).unwrap();
        assert_ne!(ciphertext, plaintext);
    }

    #[test]
    fn two_encryptions_of_same_plaintext_differ() {
        // Fresh random nonce each call.
        let crypto = test_crypto();
        let a = crypto.encrypt("same-value").unwrap();
        let b = crypto.encrypt("same-value").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn decrypt_rejects_tampered_ciphertext() {
        let crypto = test_crypto();
        let mut ciphertext = crypto.encrypt("value").unwrap();
        ciphertext.push('A');
        assert!(crypto.decrypt(&ciphertext).is_err());
    }

    #[test]
    fn from_base64_key_rejects_wrong_length() {
        let short_key = STANDARD.encode([1u8; 16]);
        assert!(PropertyCrypto::from_base64_key(&short_key).is_err());
    }
}
