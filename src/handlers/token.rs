//! `POST /oauth/token`: dispatches to the grant handler
//! selected by the `grant_type` form field, validates the client against
//! the injected `OAuthAppRepository`, and runs the two-phase
//! validate/handle contract every `GrantHandler` implements.

use axum::{extract::State, response::IntoResponse, Form};

use crate::config::AppState;
use crate::dto::oauth::TokenRequest;
use crate::error::GrantError;
use crate::models::oauth_app::GrantType;

pub async fn token_handler(State(state): State<AppState>, Form(req): Form<TokenRequest>) -> impl IntoResponse {
    match issue_token(&state, &req).await {
        Ok(response) => axum::Json(response).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn issue_token(state: &AppState, req: &TokenRequest) -> Result<crate::dto::oauth::TokenResponse, GrantError> {
    let handler = state.grant_providers.handler_for(&req.grant_type)?;
    handler.validate_grant(req).await?;

    let app = state
        .oauth_apps
        .get_by_client_id(&req.client_id)
        .await
        .map_err(|e| GrantError::ServerError(e.to_string()))?
        .ok_or(GrantError::InvalidClient)?;

    let grant_type = GrantType::parse(&req.grant_type).ok_or(GrantError::UnsupportedGrantType)?;
    if !app.supports_grant(grant_type) {
        return Err(GrantError::UnauthorizedClient);
    }

    handler.handle_grant(req, &app).await
}
