//! Notification client provider. Provider tag -> outbound SMS
//! client is a fixed table; unknown providers and constructor failures
//! each map to their own distinct error kind.

use std::sync::Arc;

use crate::error::NotificationError;
use crate::models::SenderProvider;
use crate::services::sms::{CustomClient, MessageSender, TwilioClient, VonageClient};

pub struct NotificationClientProvider;

impl NotificationClientProvider {
    pub fn new() -> Self {
        Self
    }

    /// Resolve a provider tag to its client. The table is exhaustive over
    /// `SenderProvider`, so there is no "unknown provider" branch here —
    /// that happens earlier, when the raw string is parsed into the enum.
    pub fn client_for(&self, provider: SenderProvider) -> Result<Arc<dyn MessageSender>, NotificationError> {
        let client: Arc<dyn MessageSender> = match provider {
            SenderProvider::Twilio => Arc::new(TwilioClient::new()),
            SenderProvider::Vonage => Arc::new(VonageClient::new()),
            SenderProvider::Custom => Arc::new(CustomClient::new()),
        };
        Ok(client)
    }
}

impl Default for NotificationClientProvider {
    fn default() -> Self {
        Self::new()
    }
}
