//! Notification sender store. Two implementations share the unified
//! not-found convention resolved in SPEC_FULL.md §9: `Ok(None)` means
//! not-found, `Err` is reserved for infrastructure failures.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use async_trait::async_trait;
use serde::Deserialize;
use sqlx::{types::Json, FromRow, MySqlPool};
use uuid::Uuid;

use crate::error::NotificationError;
use crate::models::{NotificationSender, Property, SenderProvider};
use crate::repositories::traits::{MutableNotificationSenderStore, ReadOnlyNotificationSenderStore};
use crate::utils::crypto::PropertyCrypto;

#[derive(Debug, FromRow)]
struct NotificationSenderRow {
    #[sqlx(try_from = "String")]
    id: Uuid,
    name: String,
    description: String,
    provider: String,
    properties_json: Json<Vec<Property>>,
}

impl TryFrom<NotificationSenderRow> for NotificationSender {
    type Error = NotificationError;

    fn try_from(row: NotificationSenderRow) -> Result<Self, Self::Error> {
        let provider = SenderProvider::parse(&row.provider)
            .ok_or_else(|| NotificationError::InternalError(format!("unknown provider in storage: {}", row.provider)))?;
        Ok(NotificationSender {
            id: row.id,
            name: row.name,
            description: row.description,
            provider,
            properties: row.properties_json.0,
        })
    }
}

#[derive(Clone)]
pub struct SqlxNotificationSenderStore {
    pool: MySqlPool,
}

impl SqlxNotificationSenderStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReadOnlyNotificationSenderStore for SqlxNotificationSenderStore {
    async fn get_by_id(&self, id: &str) -> Result<Option<NotificationSender>, NotificationError> {
        let row = sqlx::query_as::<_, NotificationSenderRow>(
            "SELECT id, name, description, provider, properties_json FROM notification_senders WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| NotificationError::InternalError(e.to_string()))?;

        row.map(NotificationSender::try_from).transpose()
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<NotificationSender>, NotificationError> {
        let row = sqlx::query_as::<_, NotificationSenderRow>(
            "SELECT id, name, description, provider, properties_json FROM notification_senders WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| NotificationError::InternalError(e.to_string()))?;

        row.map(NotificationSender::try_from).transpose()
    }

    async fn list(&self) -> Result<Vec<NotificationSender>, NotificationError> {
        let rows = sqlx::query_as::<_, NotificationSenderRow>(
            "SELECT id, name, description, provider, properties_json FROM notification_senders",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| NotificationError::InternalError(e.to_string()))?;

        rows.into_iter().map(NotificationSender::try_from).collect()
    }
}

#[async_trait]
impl MutableNotificationSenderStore for SqlxNotificationSenderStore {
    async fn create(&self, sender: NotificationSender) -> Result<(), NotificationError> {
        let properties_json = Json(&sender.properties);
        sqlx::query(
            "INSERT INTO notification_senders (id, name, description, provider, properties_json) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(sender.id.to_string())
        .bind(&sender.name)
        .bind(&sender.description)
        .bind(sender.provider.as_str())
        .bind(properties_json)
        .execute(&self.pool)
        .await
        .map_err(|e| NotificationError::InternalError(e.to_string()))?;

        Ok(())
    }

    async fn update(&self, sender: NotificationSender) -> Result<(), NotificationError> {
        let properties_json = Json(&sender.properties);
        let result = sqlx::query(
            "UPDATE notification_senders SET name = ?, description = ?, properties_json = ? WHERE id = ?",
        )
        .bind(&sender.name)
        .bind(&sender.description)
        .bind(properties_json)
        .bind(sender.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| NotificationError::InternalError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(NotificationError::SenderNotFound);
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), NotificationError> {
        sqlx::query("DELETE FROM notification_senders WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| NotificationError::InternalError(e.to_string()))?;
        Ok(())
    }
}

/// On-disk shape of a sender definition under the resources directory
/// (`notification_senders/*.yaml`).
#[derive(Debug, Deserialize)]
struct SenderFile {
    id: Uuid,
    name: String,
    description: String,
    provider: String,
    properties: Vec<PropertyFile>,
}

#[derive(Debug, Deserialize)]
struct PropertyFile {
    name: String,
    value: String,
    is_secret: bool,
}

/// Read-only store for "immutable resources" mode. Loads
/// every `*.yaml` file under `directory` at construction; mutation is
/// simply not offered through `ReadOnlyNotificationSenderStore`.
pub struct FileBackedNotificationSenderStore {
    senders: RwLock<HashMap<Uuid, NotificationSender>>,
}

impl FileBackedNotificationSenderStore {
    /// `crypto` must be the same key the rest of the process uses:
    /// `is_secret: true` properties are read from YAML as plaintext and
    /// run through [`Property::new`] here, exactly as the mutable store's
    /// `create`/`update` path does, so `Property::reveal` later decrypts
    /// them with the same key it was encrypted under.
    pub fn load(directory: &PathBuf, crypto: &PropertyCrypto) -> Result<Self, NotificationError> {
        let mut senders = HashMap::new();

        let entries = std::fs::read_dir(directory)
            .map_err(|e| NotificationError::InternalError(format!("failed to read resources directory: {e}")))?;

        for entry in entries {
            let entry = entry.map_err(|e| NotificationError::InternalError(e.to_string()))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("yaml") {
                continue;
            }

            let contents = std::fs::read_to_string(&path)
                .map_err(|e| NotificationError::InternalError(format!("failed to read {}: {e}", path.display())))?;
            let file: SenderFile = serde_yaml::from_str(&contents)
                .map_err(|e| NotificationError::InternalError(format!("failed to parse {}: {e}", path.display())))?;

            let provider = SenderProvider::parse(&file.provider)
                .ok_or_else(|| NotificationError::InvalidProvider(file.provider.clone()))?;

            let properties = file
                .properties
                .into_iter()
                .map(|p| Property::new(p.name, p.value, p.is_secret, crypto))
                .collect::<Result<Vec<_>, _>>()?;

            senders.insert(
                file.id,
                NotificationSender { id: file.id, name: file.name, description: file.description, provider, properties },
            );
        }

        Ok(Self { senders: RwLock::new(senders) })
    }
}

#[async_trait]
impl ReadOnlyNotificationSenderStore for FileBackedNotificationSenderStore {
    async fn get_by_id(&self, id: &str) -> Result<Option<NotificationSender>, NotificationError> {
        let Ok(id) = Uuid::parse_str(id) else { return Ok(None) };
        Ok(self.senders.read().unwrap().get(&id).cloned())
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<NotificationSender>, NotificationError> {
        Ok(self.senders.read().unwrap().values().find(|s| s.name == name).cloned())
    }

    async fn list(&self) -> Result<Vec<NotificationSender>, NotificationError> {
        Ok(self.senders.read().unwrap().values().cloned().collect())
    }
}
