//! One-time-password send/verify handlers, thin wrappers
//! over [`crate::services::otp::OtpService`].

use axum::{extract::State, Json};

use crate::config::AppState;
use crate::dto::otp::{SendOtpRequest, SendOtpResponse, VerifyOtpRequest, VerifyOtpResponse};
use crate::error::OtpError;
use crate::services::otp::VerifyStatus;

pub async fn send_otp_handler(
    State(state): State<AppState>,
    Json(req): Json<SendOtpRequest>,
) -> Result<Json<SendOtpResponse>, OtpError> {
    let session_token = state.otp.send_otp(&req.recipient, &req.sender_id, &req.channel).await?;
    Ok(Json(SendOtpResponse { session_token, status: "SUCCESS" }))
}

pub async fn verify_otp_handler(
    State(state): State<AppState>,
    Json(req): Json<VerifyOtpRequest>,
) -> Result<Json<VerifyOtpResponse>, OtpError> {
    let result = state.otp.verify_otp(&req.session_token, &req.code).await?;
    let status = match result.status {
        VerifyStatus::Verified => "VERIFIED",
        VerifyStatus::Invalid => "INVALID",
    };
    Ok(Json(VerifyOtpResponse { status, recipient: result.recipient }))
}
