//! Notification sender management. Validation, uniqueness, and
//! lifecycle rules layered in front of the store.

use std::sync::LazyLock;

use regex::Regex;
use uuid::Uuid;

use std::sync::Arc;

use crate::error::NotificationError;
use crate::models::{NotificationSender, Property, SenderProvider};
use crate::repositories::traits::{MutableNotificationSenderStore, ReadOnlyNotificationSenderStore};
use crate::utils::crypto::PropertyCrypto;

static TWILIO_ACCOUNT_SID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^AC[0-9a-fA-F]{32}$").unwrap());

/// Raw, unsanitized request to create or update a sender.
#[derive(Debug, Clone)]
pub struct SenderInput {
    pub name: String,
    pub description: String,
    pub provider: String,
    pub properties: Vec<PropertyInput>,
}

#[derive(Debug, Clone)]
pub struct PropertyInput {
    pub name: String,
    pub value: String,
    pub is_secret: bool,
}

/// Trim and strip control characters before delegating to the store.
fn sanitize(raw: &str) -> String {
    raw.trim().chars().filter(|c| !c.is_control()).collect()
}

fn provider_property(properties: &[PropertyInput], name: &str) -> Option<&PropertyInput> {
    properties.iter().find(|p| p.name == name)
}

fn require_property<'a>(properties: &'a [PropertyInput], name: &str) -> Result<&'a PropertyInput, NotificationError> {
    provider_property(properties, name).ok_or_else(|| NotificationError::InvalidRequest(format!("missing required property: {name}")))
}

fn validate_provider_properties(provider: SenderProvider, properties: &[PropertyInput]) -> Result<(), NotificationError> {
    match provider {
        SenderProvider::Twilio => {
            let account_sid = require_property(properties, "account_sid")?;
            if !TWILIO_ACCOUNT_SID.is_match(&account_sid.value) {
                return Err(NotificationError::InvalidRequest("account_sid must match ^AC[0-9a-fA-F]{32}$".into()));
            }
            require_property(properties, "auth_token")?;
            require_property(properties, "sender_id")?;
        }
        SenderProvider::Vonage => {
            require_property(properties, "api_key")?;
            require_property(properties, "api_secret")?;
            require_property(properties, "sender_id")?;
        }
        SenderProvider::Custom => {
            require_property(properties, "url")?;
            let method = require_property(properties, "http_method")?;
            if !matches!(method.value.as_str(), "GET" | "POST") {
                return Err(NotificationError::InvalidRequest("http_method must be GET or POST".into()));
            }
            let content_type = require_property(properties, "content_type")?;
            if !matches!(content_type.value.as_str(), "JSON" | "FORM") {
                return Err(NotificationError::InvalidRequest("content_type must be JSON or FORM".into()));
            }
        }
    }
    Ok(())
}

/// Either a mutable (DB-backed) store or a read-only (file-backed) one,
/// for an "immutable resources" deployment mode. Kept as an enum rather
/// than two structs so the handlers and `AppState` only ever see one type.
enum Backing {
    Mutable(Arc<dyn MutableNotificationSenderStore>),
    ReadOnly(Arc<dyn ReadOnlyNotificationSenderStore>),
}

impl Backing {
    async fn get_by_id(&self, id: &str) -> Result<Option<NotificationSender>, NotificationError> {
        match self {
            Backing::Mutable(s) => s.get_by_id(id).await,
            Backing::ReadOnly(s) => s.get_by_id(id).await,
        }
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<NotificationSender>, NotificationError> {
        match self {
            Backing::Mutable(s) => s.get_by_name(name).await,
            Backing::ReadOnly(s) => s.get_by_name(name).await,
        }
    }

    async fn list(&self) -> Result<Vec<NotificationSender>, NotificationError> {
        match self {
            Backing::Mutable(s) => s.list().await,
            Backing::ReadOnly(s) => s.list().await,
        }
    }
}

pub struct NotificationSenderManagement {
    backing: Backing,
    crypto: PropertyCrypto,
}

impl NotificationSenderManagement {
    pub fn new(store: Arc<dyn MutableNotificationSenderStore>, crypto: PropertyCrypto) -> Self {
        Self { backing: Backing::Mutable(store), crypto }
    }

    /// Construct a management layer in front of an immutable, file-backed
    /// store: reads succeed as usual, writes fail with
    /// [`NotificationError::ReadOnlyStore`].
    pub fn read_only(store: Arc<dyn ReadOnlyNotificationSenderStore>, crypto: PropertyCrypto) -> Self {
        Self { backing: Backing::ReadOnly(store), crypto }
    }

    fn mutable(&self) -> Result<&dyn MutableNotificationSenderStore, NotificationError> {
        match &self.backing {
            Backing::Mutable(s) => Ok(s.as_ref()),
            Backing::ReadOnly(_) => Err(NotificationError::ReadOnlyStore),
        }
    }

    fn validate_and_sanitize(&self, input: SenderInput) -> Result<(String, String, SenderProvider, Vec<PropertyInput>), NotificationError> {
        let name = sanitize(&input.name);
        if name.is_empty() {
            return Err(NotificationError::InvalidSenderName("name must not be empty".into()));
        }

        let provider = SenderProvider::parse(&input.provider)
            .ok_or_else(|| NotificationError::InvalidProvider(input.provider.clone()))?;

        let properties: Vec<PropertyInput> = input
            .properties
            .into_iter()
            .map(|p| PropertyInput { name: sanitize(&p.name), value: sanitize(&p.value), is_secret: p.is_secret })
            .collect();

        validate_provider_properties(provider, &properties)?;

        Ok((name, sanitize(&input.description), provider, properties))
    }

    pub async fn create(&self, input: SenderInput) -> Result<NotificationSender, NotificationError> {
        let store = self.mutable()?;
        let (name, description, provider, properties) = self.validate_and_sanitize(input)?;

        if self.backing.get_by_name(&name).await?.is_some() {
            return Err(NotificationError::DuplicateSenderName);
        }

        let properties = properties
            .into_iter()
            .map(|p| Property::new(p.name, p.value, p.is_secret, &self.crypto))
            .collect::<Result<Vec<_>, _>>()?;

        let sender = NotificationSender { id: Uuid::new_v4(), name, description, provider, properties };
        store.create(sender.clone()).await?;
        Ok(sender)
    }

    pub async fn get(&self, id: &str) -> Result<NotificationSender, NotificationError> {
        self.backing.get_by_id(id).await?.ok_or(NotificationError::SenderNotFound)
    }

    pub async fn list(&self) -> Result<Vec<NotificationSender>, NotificationError> {
        self.backing.list().await
    }

    /// Update: `type`/provider is immutable; renaming onto a name held by a
    /// different id is rejected.
    pub async fn update(&self, id: &str, input: SenderInput) -> Result<NotificationSender, NotificationError> {
        let store = self.mutable()?;
        let existing = self.backing.get_by_id(id).await?.ok_or(NotificationError::SenderNotFound)?;

        let (name, description, provider, properties) = self.validate_and_sanitize(input)?;
        if provider != existing.provider {
            return Err(NotificationError::SenderTypeUpdateNotAllowed);
        }

        if let Some(other) = self.backing.get_by_name(&name).await? {
            if other.id != existing.id {
                return Err(NotificationError::DuplicateSenderName);
            }
        }

        let properties = properties
            .into_iter()
            .map(|p| Property::new(p.name, p.value, p.is_secret, &self.crypto))
            .collect::<Result<Vec<_>, _>>()?;

        let updated = NotificationSender { id: existing.id, name, description, provider, properties };
        store.update(updated.clone()).await?;
        Ok(updated)
    }

    /// Missing record is a no-op success.
    pub async fn delete(&self, id: &str) -> Result<(), NotificationError> {
        let store = self.mutable()?;
        store.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeNotificationSenderStore;
    use std::sync::Arc;

    fn management() -> NotificationSenderManagement {
        NotificationSenderManagement::new(Arc::new(FakeNotificationSenderStore::default()), PropertyCrypto::new(&[9u8; 32]))
    }

    fn twilio_input(name: &str) -> SenderInput {
        SenderInput {
            name: name.to_string(),
            description: "  test sender  ".to_string(),
            provider: "TWILIO".to_string(),
            properties: vec![
                PropertyInput { name: "account_sid".into(), value: "AC1234567890abcdef1234567890abcd".into(), is_secret: false },
                PropertyInput { name: "auth_token".into(), value: "secret".into(), is_secret: true },
                PropertyInput { name: "sender_id".into(), value: "+15551234567".into(), is_secret: false },
            ],
        }
    }

    #[tokio::test]
    async fn create_normalizes_provider_case_and_rejects_duplicates() {
        let mgmt = management();
        let sender = mgmt.create(twilio_input("alerts")).await.unwrap();
        assert_eq!(sender.provider, SenderProvider::Twilio);

        let err = mgmt.create(twilio_input("alerts")).await.unwrap_err();
        assert!(matches!(err, NotificationError::DuplicateSenderName));
    }

    #[tokio::test]
    async fn create_rejects_malformed_account_sid() {
        let mgmt = management();
        let mut input = twilio_input("alerts");
        input.properties[0].value = "not-a-valid-sid".into();
        let err = mgmt.create(input).await.unwrap_err();
        assert!(matches!(err, NotificationError::InvalidRequest(_)));
    }

    #[tokio::test]
    async fn update_rejects_provider_change() {
        let mgmt = management();
        let sender = mgmt.create(twilio_input("alerts")).await.unwrap();

        let mut custom_input = twilio_input("alerts");
        custom_input.provider = "custom".into();
        custom_input.properties = vec![
            PropertyInput { name: "url".into(), value: "https://example.com".into(), is_secret: false },
            PropertyInput { name: "http_method".into(), value: "POST".into(), is_secret: false },
            PropertyInput { name: "content_type".into(), value: "JSON".into(), is_secret: false },
        ];

        let err = mgmt.update(&sender.id.to_string(), custom_input).await.unwrap_err();
        assert!(matches!(err, NotificationError::SenderTypeUpdateNotAllowed));
    }

    #[tokio::test]
    async fn delete_missing_record_is_noop_success() {
        let mgmt = management();
        assert!(mgmt.delete("does-not-exist").await.is_ok());
    }
}
