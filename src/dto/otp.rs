//! OTP send/verify DTOs.

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct SendOtpRequest {
    pub recipient: String,
    pub sender_id: String,
    pub channel: String,
}

#[derive(Debug, Serialize)]
pub struct SendOtpResponse {
    pub session_token: String,
    pub status: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub session_token: String,
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyOtpResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
}
