//! Notification-sender CRUD handlers, all thin wrappers
//! over [`crate::services::notification_sender_management::NotificationSenderManagement`].

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::config::AppState;
use crate::dto::notification_sender::{
    CreateNotificationSenderRequest, NotificationSenderResponse, UpdateNotificationSenderRequest,
};
use crate::error::NotificationError;
use crate::services::notification_sender_management::{PropertyInput, SenderInput};

fn into_sender_input(name: String, description: String, provider: String, properties: Vec<crate::dto::notification_sender::PropertyRequest>) -> SenderInput {
    SenderInput {
        name,
        description,
        provider,
        properties: properties
            .into_iter()
            .map(|p| PropertyInput { name: p.name, value: p.value, is_secret: p.is_secret })
            .collect(),
    }
}

pub async fn list_notification_senders_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<NotificationSenderResponse>>, NotificationError> {
    let senders = state.notification_senders.list().await?;
    Ok(Json(senders.into_iter().map(NotificationSenderResponse::from).collect()))
}

pub async fn get_notification_sender_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<NotificationSenderResponse>, NotificationError> {
    let sender = state.notification_senders.get(&id).await?;
    Ok(Json(sender.into()))
}

pub async fn create_notification_sender_handler(
    State(state): State<AppState>,
    Json(req): Json<CreateNotificationSenderRequest>,
) -> Result<(StatusCode, Json<NotificationSenderResponse>), NotificationError> {
    let input = into_sender_input(req.name, req.description, req.provider, req.properties);
    let sender = state.notification_senders.create(input).await?;
    Ok((StatusCode::CREATED, Json(sender.into())))
}

pub async fn update_notification_sender_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateNotificationSenderRequest>,
) -> Result<Json<NotificationSenderResponse>, NotificationError> {
    let input = into_sender_input(req.name, req.description, req.provider, req.properties);
    let sender = state.notification_senders.update(&id, input).await?;
    Ok(Json(sender.into()))
}

pub async fn delete_notification_sender_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, NotificationError> {
    state.notification_senders.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
