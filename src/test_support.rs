//! In-memory fakes for the capability traits in `repositories::traits`,
//! shared by the grant-handler, token-builder and OTP test modules so
//! each doesn't need its own ad-hoc mock. Test-only: gated behind
//! `#[cfg(test)]` at the declaration site in `main.rs`.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::NotificationError;
use crate::models::{AuthorizationCode, CodeState, NotificationSender, OAuthApp};
use crate::repositories::traits::{
    AuthorizationCodeStore, MutableNotificationSenderStore, OAuthAppRepository, ReadOnlyNotificationSenderStore,
    UserAttributeProvider,
};

#[derive(Default)]
pub struct FakeAuthorizationCodeStore {
    pub codes: Mutex<HashMap<String, AuthorizationCode>>,
    pub issued_tokens: Mutex<Vec<String>>,
    pub revoked: Mutex<Vec<String>>,
}

#[async_trait]
impl AuthorizationCodeStore for FakeAuthorizationCodeStore {
    async fn create(&self, code: AuthorizationCode) -> anyhow::Result<()> {
        self.codes.lock().unwrap().insert(code.code_id.clone(), code);
        Ok(())
    }

    async fn get_by_client_and_code(&self, client_id: &str, code: &str) -> anyhow::Result<Option<AuthorizationCode>> {
        Ok(self
            .codes
            .lock()
            .unwrap()
            .values()
            .find(|c| c.client_id == client_id && c.code == code)
            .cloned())
    }

    async fn mark_inactive(&self, code_id: &str) -> anyhow::Result<bool> {
        let mut codes = self.codes.lock().unwrap();
        if let Some(entry) = codes.get_mut(code_id) {
            if entry.is_active() {
                entry.state = CodeState::Inactive;
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn record_issued_token(&self, code_id: &str) -> anyhow::Result<()> {
        self.issued_tokens.lock().unwrap().push(code_id.to_string());
        Ok(())
    }

    async fn revoke_tokens_for_code(&self, code_id: &str) {
        self.issued_tokens.lock().unwrap().retain(|c| c != code_id);
        self.revoked.lock().unwrap().push(code_id.to_string());
    }
}

#[derive(Default)]
pub struct FakeOAuthAppRepository {
    pub apps: Mutex<HashMap<String, OAuthApp>>,
}

impl FakeOAuthAppRepository {
    pub fn insert(&self, app: OAuthApp) {
        self.apps.lock().unwrap().insert(app.client_id.clone(), app);
    }
}

#[async_trait]
impl OAuthAppRepository for FakeOAuthAppRepository {
    async fn get_by_client_id(&self, client_id: &str) -> anyhow::Result<Option<OAuthApp>> {
        Ok(self.apps.lock().unwrap().get(client_id).cloned())
    }
}

#[derive(Default)]
pub struct FakeUserAttributeProvider {
    pub attributes: Mutex<HashMap<String, HashMap<String, Value>>>,
    pub groups: Mutex<HashMap<String, Vec<String>>>,
}

impl FakeUserAttributeProvider {
    pub fn set(&self, user_id: &str, attrs: HashMap<String, Value>) {
        self.attributes.lock().unwrap().insert(user_id.to_string(), attrs);
    }
}

#[async_trait]
impl UserAttributeProvider for FakeUserAttributeProvider {
    async fn get_attributes(&self, user_id: &str) -> anyhow::Result<HashMap<String, Value>> {
        Ok(self.attributes.lock().unwrap().get(user_id).cloned().unwrap_or_default())
    }

    async fn get_groups(&self, user_id: &str) -> anyhow::Result<Vec<String>> {
        Ok(self.groups.lock().unwrap().get(user_id).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
pub struct FakeNotificationSenderStore {
    pub senders: Mutex<HashMap<String, NotificationSender>>,
}

#[async_trait]
impl ReadOnlyNotificationSenderStore for FakeNotificationSenderStore {
    async fn get_by_id(&self, id: &str) -> Result<Option<NotificationSender>, NotificationError> {
        Ok(self.senders.lock().unwrap().get(id).cloned())
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<NotificationSender>, NotificationError> {
        Ok(self.senders.lock().unwrap().values().find(|s| s.name == name).cloned())
    }

    async fn list(&self) -> Result<Vec<NotificationSender>, NotificationError> {
        Ok(self.senders.lock().unwrap().values().cloned().collect())
    }
}

#[async_trait]
impl MutableNotificationSenderStore for FakeNotificationSenderStore {
    async fn create(&self, sender: NotificationSender) -> Result<(), NotificationError> {
        let mut senders = self.senders.lock().unwrap();
        if senders.values().any(|s| s.name == sender.name) {
            return Err(NotificationError::DuplicateSenderName);
        }
        senders.insert(sender.id.to_string(), sender);
        Ok(())
    }

    async fn update(&self, sender: NotificationSender) -> Result<(), NotificationError> {
        let mut senders = self.senders.lock().unwrap();
        if senders.values().any(|s| s.name == sender.name && s.id != sender.id) {
            return Err(NotificationError::DuplicateSenderName);
        }
        senders.insert(sender.id.to_string(), sender);
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), NotificationError> {
        self.senders.lock().unwrap().remove(id);
        Ok(())
    }
}
