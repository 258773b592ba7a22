//! OTP service. Generates, sends, and verifies one-time passwords
//! as signed session tokens; no server-side state survives between send
//! and verify beyond the JWT itself.

use std::sync::Arc;

use rand::Rng;
use sha2::{Digest, Sha256};

use crate::error::OtpError;
use crate::services::notification_client::NotificationClientProvider;
use crate::services::notification_sender_management::NotificationSenderManagement;
use crate::services::signing::JwtSigner;
use crate::utils::crypto::PropertyCrypto;
use crate::utils::jwt::{now_ms, now_ts, OtpData, OtpSessionClaims};

const DEFAULT_OTP_LENGTH: usize = 6;
const DIGITS_CHARSET: &str = "9245378016";
const ALPHANUMERIC_CHARSET: &str = "KIGXHOYSPRWCEFMVUQLZDNABJT9245378016";

#[derive(Debug, Clone)]
pub struct OtpConfig {
    pub length: usize,
    pub alphanumeric: bool,
    pub validity_ms: i64,
    pub issuer: String,
    pub audience: String,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            length: DEFAULT_OTP_LENGTH,
            alphanumeric: false,
            validity_ms: 5 * 60 * 1000,
            issuer: "token-issuance-core".to_string(),
            audience: "otp-service".to_string(),
        }
    }
}

impl OtpConfig {
    fn charset(&self) -> &'static str {
        if self.alphanumeric { ALPHANUMERIC_CHARSET } else { DIGITS_CHARSET }
    }
}

/// Deterministic, collision-resistant hash of the OTP plaintext, used in
/// place of the plaintext for equality checks.
fn thumbprint(code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(code.as_bytes());
    hex::encode(hasher.finalize())
}

fn generate_otp(config: &OtpConfig) -> Result<String, OtpError> {
    let charset = config.charset().as_bytes();
    let mut rng = rand::thread_rng();
    if charset.is_empty() {
        return Err(OtpError::InternalError("otp charset is empty".into()));
    }
    Ok((0..config.length)
        .map(|_| {
            let idx = rng.gen_range(0..charset.len());
            charset[idx] as char
        })
        .collect())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyStatus {
    Verified,
    Invalid,
}

#[derive(Debug, Clone)]
pub struct VerifyResult {
    pub status: VerifyStatus,
    pub recipient: Option<String>,
}

pub struct OtpService {
    signer: Arc<dyn JwtSigner>,
    senders: Arc<NotificationSenderManagement>,
    clients: NotificationClientProvider,
    crypto: PropertyCrypto,
    config: OtpConfig,
}

impl OtpService {
    pub fn new(
        signer: Arc<dyn JwtSigner>,
        senders: Arc<NotificationSenderManagement>,
        clients: NotificationClientProvider,
        crypto: PropertyCrypto,
        config: OtpConfig,
    ) -> Self {
        Self { signer, senders, clients, crypto, config }
    }

    /// `SendOTP`.
    pub async fn send_otp(&self, recipient: &str, sender_id: &str, channel: &str) -> Result<String, OtpError> {
        if recipient.trim().is_empty() || sender_id.trim().is_empty() {
            return Err(OtpError::InvalidRecipient);
        }
        if channel.trim().is_empty() {
            return Err(OtpError::InvalidChannel);
        }
        if channel != "sms" {
            return Err(OtpError::UnsupportedChannel);
        }

        let sender = self.senders.get(sender_id).await?;

        let otp = generate_otp(&self.config)?;
        let otp_value = thumbprint(&otp);
        let expiry_time = now_ms() + self.config.validity_ms;

        let claims = OtpSessionClaims {
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
            iat: now_ts(),
            exp: now_ts() + self.config.validity_ms / 1000,
            otp_data: OtpData {
                recipient: recipient.to_string(),
                channel: channel.to_string(),
                sender_id: sender_id.to_string(),
                otp_value,
                expiry_time,
            },
        };

        let value = serde_json::to_value(&claims).map_err(|e| OtpError::InternalError(e.to_string()))?;
        let session_token = self.signer.sign(&value).await.map_err(OtpError::from)?;

        let client = self.clients.client_for(sender.provider)?;
        client
            .send(&sender, recipient, &format!("Your verification code is {otp}"), &self.crypto)
            .await?;

        Ok(session_token)
    }

    /// `VerifyOTP`. An expired or mismatched code is a
    /// `{status: INVALID}` result, never an error — only a malformed or
    /// unverifiable session token produces `InvalidSessionToken`.
    pub async fn verify_otp(&self, session_token: &str, code: &str) -> Result<VerifyResult, OtpError> {
        if session_token.trim().is_empty() || code.trim().is_empty() {
            return Err(OtpError::InvalidSessionToken);
        }

        let value = self.signer.decode_unchecked(session_token).await.map_err(|_| OtpError::InvalidSessionToken)?;

        let aud = value.get("aud").and_then(|v| v.as_str());
        if aud != Some(self.config.audience.as_str()) {
            return Err(OtpError::InvalidSessionToken);
        }

        let claims: OtpSessionClaims = serde_json::from_value(value).map_err(|_| OtpError::InvalidSessionToken)?;

        if claims.otp_data.expiry_time < now_ms() {
            return Ok(VerifyResult { status: VerifyStatus::Invalid, recipient: None });
        }

        if thumbprint(code) != claims.otp_data.otp_value {
            return Ok(VerifyResult { status: VerifyStatus::Invalid, recipient: None });
        }

        Ok(VerifyResult { status: VerifyStatus::Verified, recipient: Some(claims.otp_data.recipient) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::notification_client::NotificationClientProvider;
    use crate::services::notification_sender_management::NotificationSenderManagement;
    use crate::test_support::FakeNotificationSenderStore;
    use crate::utils::crypto::PropertyCrypto;
    use crate::utils::jwt::JwtManager;

    #[test]
    fn thumbprint_never_reveals_plaintext() {
        let t = thumbprint("123456");
        assert_ne!(t, "123456");
        assert_eq!(t.len(), 64);
    }

    #[test]
    fn generate_otp_respects_configured_length_and_charset() {
        let config = OtpConfig { length: 8, ..Default::default() };
        let otp = generate_otp(&config).unwrap();
        assert_eq!(otp.len(), 8);
        assert!(otp.chars().all(|c| DIGITS_CHARSET.contains(c)));
    }

    #[test]
    fn generate_otp_alphanumeric_uses_expanded_charset() {
        let config = OtpConfig { alphanumeric: true, length: 20, ..Default::default() };
        let otp = generate_otp(&config).unwrap();
        assert!(otp.chars().all(|c| ALPHANUMERIC_CHARSET.contains(c)));
    }

    fn test_service() -> OtpService {
        let private_key = std::fs::read_to_string("keys/private.pem").unwrap();
        let public_key = std::fs::read_to_string("keys/public.pem").unwrap();
        let signer: Arc<dyn JwtSigner> = Arc::new(JwtManager::new(&private_key, &public_key).unwrap());
        let senders = Arc::new(NotificationSenderManagement::new(
            Arc::new(FakeNotificationSenderStore::default()),
            PropertyCrypto::new(&[7u8; 32]),
        ));
        OtpService::new(
            signer,
            senders,
            NotificationClientProvider::new(),
            PropertyCrypto::new(&[7u8; 32]),
            OtpConfig::default(),
        )
    }

    /// Builds a session token the way `send_otp` would, without going
    /// through the outbound SMS client.
    async fn session_token_for(service: &OtpService, code: &str, expiry_time: i64) -> String {
        let claims = OtpSessionClaims {
            iss: service.config.issuer.clone(),
            aud: service.config.audience.clone(),
            iat: now_ts(),
            exp: now_ts() + 300,
            otp_data: OtpData {
                recipient: "+15551234567".into(),
                channel: "sms".into(),
                sender_id: "sender-1".into(),
                otp_value: thumbprint(code),
                expiry_time,
            },
        };
        let value = serde_json::to_value(&claims).unwrap();
        service.signer.sign(&value).await.unwrap()
    }

    #[tokio::test]
    async fn verify_otp_happy_path_then_rejects_wrong_code() {
        let service = test_service();
        let token = session_token_for(&service, "654321", now_ms() + 60_000).await;

        let wrong = service.verify_otp(&token, "000000").await.unwrap();
        assert_eq!(wrong.status, VerifyStatus::Invalid);

        let correct = service.verify_otp(&token, "654321").await.unwrap();
        assert_eq!(correct.status, VerifyStatus::Verified);
        assert_eq!(correct.recipient.as_deref(), Some("+15551234567"));
    }

    #[tokio::test]
    async fn verify_otp_rejects_expired_session_as_invalid_not_error() {
        let service = test_service();
        let token = session_token_for(&service, "654321", now_ms() - 1).await;

        let result = service.verify_otp(&token, "654321").await.unwrap();
        assert_eq!(result.status, VerifyStatus::Invalid);
    }
}
