//! Outbound dispatch targets. Each `MessageSender` implementation wraps one
//! provider's HTTP API; property lookups come from the `NotificationSender`
//! record resolved by `NotificationClientProvider`.

use async_trait::async_trait;

use crate::error::OtpError;
use crate::models::NotificationSender;
use crate::utils::crypto::PropertyCrypto;

#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send(
        &self,
        sender: &NotificationSender,
        recipient: &str,
        message: &str,
        crypto: &PropertyCrypto,
    ) -> Result<(), OtpError>;
}

fn reveal(sender: &NotificationSender, name: &str, crypto: &PropertyCrypto) -> Result<String, OtpError> {
    let property = sender
        .property(name)
        .ok_or_else(|| OtpError::InternalError(format!("{} sender missing {name}", sender.provider.as_str())))?;
    property
        .reveal(crypto)
        .map_err(|e| OtpError::InternalError(format!("failed to reveal {name}: {e}")))
}

/// Twilio Programmable Messaging API client.
pub struct TwilioClient {
    http: reqwest::Client,
}

impl TwilioClient {
    pub fn new() -> Self {
        Self { http: reqwest::Client::new() }
    }
}

#[async_trait]
impl MessageSender for TwilioClient {
    async fn send(
        &self,
        sender: &NotificationSender,
        recipient: &str,
        message: &str,
        crypto: &PropertyCrypto,
    ) -> Result<(), OtpError> {
        let account_sid = reveal(sender, "account_sid", crypto)?;
        let auth_token = reveal(sender, "auth_token", crypto)?;
        let from = reveal(sender, "sender_id", crypto)?;

        let url = format!("https://api.twilio.com/2010-04-01/Accounts/{account_sid}/Messages.json");
        let response = self
            .http
            .post(url)
            .basic_auth(account_sid, Some(auth_token))
            .form(&[("From", from.as_str()), ("To", recipient), ("Body", message)])
            .send()
            .await
            .map_err(|e| OtpError::InternalError(format!("twilio request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(OtpError::InternalError(format!(
                "twilio responded with {}",
                response.status()
            )));
        }
        Ok(())
    }
}

/// Vonage (Nexmo) SMS API client.
pub struct VonageClient {
    http: reqwest::Client,
}

impl VonageClient {
    pub fn new() -> Self {
        Self { http: reqwest::Client::new() }
    }
}

#[async_trait]
impl MessageSender for VonageClient {
    async fn send(
        &self,
        sender: &NotificationSender,
        recipient: &str,
        message: &str,
        crypto: &PropertyCrypto,
    ) -> Result<(), OtpError> {
        let api_key = reveal(sender, "api_key", crypto)?;
        let api_secret = reveal(sender, "api_secret", crypto)?;
        let from = reveal(sender, "sender_id", crypto)?;

        let response = self
            .http
            .post("https://rest.nexmo.com/sms/json")
            .form(&[
                ("api_key", api_key.as_str()),
                ("api_secret", api_secret.as_str()),
                ("from", from.as_str()),
                ("to", recipient),
                ("text", message),
            ])
            .send()
            .await
            .map_err(|e| OtpError::InternalError(format!("vonage request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(OtpError::InternalError(format!(
                "vonage responded with {}",
                response.status()
            )));
        }
        Ok(())
    }
}

/// Arbitrary webhook-shaped provider: posts `{recipient, message}` as JSON
/// to the configured `url` property, optionally bearer-authenticated.
pub struct CustomClient {
    http: reqwest::Client,
}

impl CustomClient {
    pub fn new() -> Self {
        Self { http: reqwest::Client::new() }
    }
}

#[async_trait]
impl MessageSender for CustomClient {
    async fn send(
        &self,
        sender: &NotificationSender,
        recipient: &str,
        message: &str,
        crypto: &PropertyCrypto,
    ) -> Result<(), OtpError> {
        let endpoint = reveal(sender, "url", crypto)?;
        let http_method = sender.property("http_method").map(|p| p.value.as_str()).unwrap_or("POST");
        let content_type = sender.property("content_type").map(|p| p.value.as_str()).unwrap_or("JSON");

        let payload = serde_json::json!({"recipient": recipient, "message": message});

        let builder = match http_method.to_ascii_uppercase().as_str() {
            "GET" => self.http.get(&endpoint),
            _ => self.http.post(&endpoint),
        };

        let mut request = match content_type.to_ascii_uppercase().as_str() {
            "FORM" => builder.form(&[("recipient", recipient), ("message", message)]),
            _ => builder.json(&payload),
        };

        if sender.property("bearer_token").is_some() {
            let token = reveal(sender, "bearer_token", crypto)?;
            request = request.bearer_auth(&token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| OtpError::InternalError(format!("custom sender request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(OtpError::InternalError(format!(
                "custom sender responded with {}",
                response.status()
            )));
        }
        Ok(())
    }
}
