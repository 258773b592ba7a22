//! Domain error taxonomy for the token-issuance core.
//!
//! Each public-facing enum maps onto the RFC 6749/6750/7636/7523/8693/8707
//! error codes, and implements `IntoResponse` so handlers
//! can propagate a typed `Result` straight out to axum. Internal-only error
//! types (`ValidationError`, `SignerError`, `CryptoError`) never reach a
//! client directly — every boundary converts them into the appropriate
//! domain error's `ServerError`/`InternalError` variant, carrying the
//! original error in a logged field per the propagation policy.

use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use serde::Serialize;

/// Wire shape for every error response: `{code, message, description}`.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub description: String,
}

impl ErrorResponse {
    fn new(code: &str, message: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            description: description.into(),
        }
    }
}

/// Errors raised while validating or executing a grant, surfaced
/// by the token endpoint.
#[derive(Debug, thiserror::Error)]
pub enum GrantError {
    #[error("invalid_request: {0}")]
    InvalidRequest(String),

    #[error("invalid_client")]
    InvalidClient,

    #[error("invalid_grant: {0}")]
    InvalidGrant(String),

    #[error("unauthorized_client")]
    UnauthorizedClient,

    #[error("unsupported_grant_type")]
    UnsupportedGrantType,

    #[error("invalid_scope: {0}")]
    InvalidScope(String),

    #[error("invalid_target: {0}")]
    InvalidTarget(String),

    #[error("server_error: {0}")]
    ServerError(String),
}

impl GrantError {
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::InvalidClient => "invalid_client",
            Self::InvalidGrant(_) => "invalid_grant",
            Self::UnauthorizedClient => "unauthorized_client",
            Self::UnsupportedGrantType => "unsupported_grant_type",
            Self::InvalidScope(_) => "invalid_scope",
            Self::InvalidTarget(_) => "invalid_target",
            Self::ServerError(_) => "server_error",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::ServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    fn description(&self) -> String {
        match self {
            Self::InvalidRequest(d)
            | Self::InvalidGrant(d)
            | Self::InvalidScope(d)
            | Self::InvalidTarget(d)
            | Self::ServerError(d) => d.clone(),
            Self::InvalidClient => "client authentication failed".to_string(),
            Self::UnauthorizedClient => "client is not authorized for this grant type".to_string(),
            Self::UnsupportedGrantType => "the grant type is not recognized".to_string(),
        }
    }
}

impl IntoResponse for GrantError {
    fn into_response(self) -> Response {
        if let Self::ServerError(detail) = &self {
            tracing::error!(error = %detail, "grant handling failed");
        }
        let body = ErrorResponse::new(self.code(), self.to_string(), self.description());
        (self.status(), Json(body)).into_response()
    }
}

impl From<SignerError> for GrantError {
    fn from(e: SignerError) -> Self {
        tracing::error!(error = %e, "signer failure during grant handling");
        Self::ServerError(e.to_string())
    }
}

impl From<ValidationError> for GrantError {
    fn from(e: ValidationError) -> Self {
        Self::InvalidGrant(e.to_string())
    }
}

/// Errors raised by the notification-sender store/management layer.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("invalid_sender_name: {0}")]
    InvalidSenderName(String),

    #[error("invalid_sender_id")]
    InvalidSenderId,

    #[error("invalid_provider: {0}")]
    InvalidProvider(String),

    #[error("invalid_request: {0}")]
    InvalidRequest(String),

    #[error("duplicate_sender_name")]
    DuplicateSenderName,

    #[error("sender_not_found")]
    SenderNotFound,

    #[error("sender_type_update_not_allowed")]
    SenderTypeUpdateNotAllowed,

    #[error("invalid_request: store is read-only")]
    ReadOnlyStore,

    #[error("internal_server_error: {0}")]
    InternalError(String),
}

impl NotificationError {
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidSenderName(_) => "invalid_sender_name",
            Self::InvalidSenderId => "invalid_sender_id",
            Self::InvalidProvider(_) => "invalid_provider",
            Self::InvalidRequest(_) => "invalid_request",
            Self::DuplicateSenderName => "duplicate_sender_name",
            Self::SenderNotFound => "sender_not_found",
            Self::SenderTypeUpdateNotAllowed => "sender_type_update_not_allowed",
            Self::ReadOnlyStore => "invalid_request",
            Self::InternalError(_) => "internal_server_error",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::SenderNotFound => StatusCode::NOT_FOUND,
            Self::DuplicateSenderName => StatusCode::CONFLICT,
            Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for NotificationError {
    fn into_response(self) -> Response {
        if let Self::InternalError(detail) = &self {
            tracing::error!(error = %detail, "notification-sender operation failed");
        }
        let description = self.to_string();
        let body = ErrorResponse::new(self.code(), self.to_string(), description);
        (self.status(), Json(body)).into_response()
    }
}

impl From<CryptoError> for NotificationError {
    fn from(e: CryptoError) -> Self {
        tracing::error!(error = %e, "property crypto failure");
        Self::InternalError(e.to_string())
    }
}

impl From<SignerError> for NotificationError {
    fn from(e: SignerError) -> Self {
        tracing::error!(error = %e, "signer failure during notification-sender operation");
        Self::InternalError(e.to_string())
    }
}

/// Errors raised by the OTP service.
#[derive(Debug, thiserror::Error)]
pub enum OtpError {
    #[error("invalid_recipient")]
    InvalidRecipient,

    #[error("invalid_channel")]
    InvalidChannel,

    #[error("unsupported_channel")]
    UnsupportedChannel,

    #[error("sender_not_found")]
    SenderNotFound,

    #[error("invalid_session_token")]
    InvalidSessionToken,

    #[error("invalid_otp")]
    InvalidOtp,

    #[error("internal_server_error: {0}")]
    InternalError(String),
}

impl OtpError {
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidRecipient => "invalid_recipient",
            Self::InvalidChannel => "invalid_channel",
            Self::UnsupportedChannel => "unsupported_channel",
            Self::SenderNotFound => "sender_not_found",
            Self::InvalidSessionToken => "invalid_session_token",
            Self::InvalidOtp => "invalid_otp",
            Self::InternalError(_) => "internal_server_error",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::SenderNotFound => StatusCode::NOT_FOUND,
            Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for OtpError {
    fn into_response(self) -> Response {
        if let Self::InternalError(detail) = &self {
            tracing::error!(error = %detail, "otp operation failed");
        }
        let description = self.to_string();
        let body = ErrorResponse::new(self.code(), self.to_string(), description);
        (self.status(), Json(body)).into_response()
    }
}

impl From<NotificationError> for OtpError {
    fn from(e: NotificationError) -> Self {
        match e {
            NotificationError::SenderNotFound => Self::SenderNotFound,
            other => Self::InternalError(other.to_string()),
        }
    }
}

impl From<CryptoError> for OtpError {
    fn from(e: CryptoError) -> Self {
        tracing::error!(error = %e, "otp crypto failure");
        Self::InternalError(e.to_string())
    }
}

impl From<SignerError> for OtpError {
    fn from(e: SignerError) -> Self {
        tracing::error!(error = %e, "signer failure during otp operation");
        Self::InternalError(e.to_string())
    }
}

impl From<ValidationError> for OtpError {
    fn from(_: ValidationError) -> Self {
        Self::InvalidSessionToken
    }
}

/// Internal token-decode/verify failures. Never serialized directly;
/// callers fold these into `GrantError::InvalidGrant` or `OtpError::InvalidSessionToken`.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ValidationError {
    #[error("token could not be decoded")]
    Decode,

    #[error("token signature is invalid")]
    Signature,

    #[error("token has expired")]
    Expired,

    #[error("token is not yet valid")]
    NotYetValid,

    #[error("required claim missing: {0}")]
    MissingClaim(&'static str),

    #[error("token issuer is not trusted")]
    UntrustedIssuer,

    #[error("token client_id does not match expected client")]
    ClientMismatch,
}

/// Internal signer failures. Folded into `GrantError::ServerError` /
/// `OtpError::InternalError` at call sites.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SignerError {
    #[error("token encoding failed: {0}")]
    EncodingFailed(String),
}

/// Internal symmetric-crypto failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CryptoError {
    #[error("invalid encryption key: {0}")]
    InvalidKey(String),

    #[error("encryption failed")]
    EncryptionFailed,

    #[error("decryption failed")]
    DecryptionFailed,

    #[error("hashing failed: {0}")]
    HashingFailed(String),
}
