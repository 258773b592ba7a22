//! Notification-sender management DTOs. Secret property
//! values never appear in responses — `PropertyDto::to_dto` masks them.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{NotificationSender, PropertyDto, SENDER_TYPE};

#[derive(Debug, Deserialize)]
pub struct PropertyRequest {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub is_secret: bool,
}

#[derive(Debug, Deserialize)]
pub struct CreateNotificationSenderRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub provider: String,
    pub properties: Vec<PropertyRequest>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateNotificationSenderRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub provider: String,
    pub properties: Vec<PropertyRequest>,
}

#[derive(Debug, Serialize)]
pub struct NotificationSenderResponse {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub sender_type: &'static str,
    pub provider: &'static str,
    pub properties: Vec<PropertyDto>,
}

impl From<NotificationSender> for NotificationSenderResponse {
    fn from(sender: NotificationSender) -> Self {
        Self {
            id: sender.id,
            name: sender.name,
            description: sender.description,
            sender_type: SENDER_TYPE,
            provider: sender.provider.as_str(),
            properties: sender.properties.iter().map(|p| p.to_dto()).collect(),
        }
    }
}
