//! Client-credentials grant handler. No user is involved:
//! the subject of the access token is the client itself.

use std::sync::Arc;

use async_trait::async_trait;

use crate::dto::oauth::{TokenRequest, TokenResponse};
use crate::error::GrantError;
use crate::models::oauth_app::{GrantType, OAuthApp};
use crate::services::grants::{validate_resource_uri, GrantHandler};
use crate::services::token_builder::{BuildContext, TokenBuilder};
use crate::utils::scope::{join_scopes, parse_scopes};
use crate::utils::secret::verify_client_secret;

pub struct ClientCredentialsHandler {
    builder: Arc<TokenBuilder>,
}

impl ClientCredentialsHandler {
    pub fn new(builder: Arc<TokenBuilder>) -> Self {
        Self { builder }
    }
}

#[async_trait]
impl GrantHandler for ClientCredentialsHandler {
    async fn validate_grant(&self, req: &TokenRequest) -> Result<(), GrantError> {
        if req.grant_type != GrantType::ClientCredentials.as_str() {
            return Err(GrantError::UnsupportedGrantType);
        }
        if req.client_id.is_empty() {
            return Err(GrantError::InvalidRequest("client_id is required".into()));
        }
        if req.client_secret.as_deref().unwrap_or_default().is_empty() {
            return Err(GrantError::InvalidClient);
        }
        if let Some(resource) = &req.resource {
            if !resource.is_empty() {
                validate_resource_uri(resource)?;
            }
        }
        Ok(())
    }

    async fn handle_grant(&self, req: &TokenRequest, app: &OAuthApp) -> Result<TokenResponse, GrantError> {
        let secret = req.client_secret.as_deref().unwrap_or_default();
        let matches =
            verify_client_secret(secret, &app.hashed_client_secret).map_err(|e| GrantError::ServerError(e.to_string()))?;
        if !matches {
            return Err(GrantError::InvalidClient);
        }

        let scopes = req.scope.as_deref().map(parse_scopes).unwrap_or_default();
        let audience = req.resource.clone().filter(|r| !r.is_empty()).unwrap_or_else(|| app.client_id.clone());

        let ctx = BuildContext {
            subject: app.client_id.clone(),
            audience,
            client_id: app.client_id.clone(),
            scopes: scopes.clone(),
            grant_type: GrantType::ClientCredentials.as_str().to_string(),
            ..Default::default()
        };

        let access = self.builder.build_access_token(app, &ctx).await?;

        Ok(TokenResponse {
            access_token: access.token,
            token_type: access.token_type,
            expires_in: access.expires_in,
            scope: if scopes.is_empty() { None } else { Some(join_scopes(&scopes)) },
            refresh_token: None,
            id_token: None,
            issued_token_type: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::oauth_app::{TokenConfig, TokenKindConfig};
    use std::collections::HashSet;

    fn test_builder() -> Arc<TokenBuilder> {
        let private_key = std::fs::read_to_string("keys/private.pem").unwrap();
        let public_key = std::fs::read_to_string("keys/public.pem").unwrap();
        let signer = Arc::new(crate::utils::jwt::JwtManager::new(&private_key, &public_key).unwrap());
        Arc::new(TokenBuilder::new(signer, "https://issuer.example".into(), 3600))
    }

    fn test_app() -> OAuthApp {
        OAuthApp {
            client_id: "service-a".into(),
            hashed_client_secret: crate::utils::secret::hash_client_secret("s3cret").unwrap(),
            redirect_uris: HashSet::new(),
            grant_types: [GrantType::ClientCredentials].into_iter().collect(),
            token_endpoint_auth_method: "client_secret_basic".into(),
            requires_pkce: false,
            token: TokenConfig {
                issuer: None,
                access_token: TokenKindConfig::default(),
                id_token: TokenKindConfig::default(),
                refresh_token: TokenKindConfig::default(),
            },
        }
    }

    #[tokio::test]
    async fn issues_access_token_with_client_as_subject() {
        let handler = ClientCredentialsHandler::new(test_builder());
        let app = test_app();
        let req = TokenRequest {
            grant_type: "client_credentials".into(),
            client_id: "service-a".into(),
            client_secret: Some("s3cret".into()),
            scope: Some("reports:read".into()),
            ..Default::default()
        };

        let response = handler.handle_grant(&req, &app).await.unwrap();
        assert!(response.id_token.is_none());
        assert!(response.refresh_token.is_none());
        assert_eq!(response.scope.as_deref(), Some("reports:read"));
    }

    #[tokio::test]
    async fn rejects_missing_client_secret() {
        let handler = ClientCredentialsHandler::new(test_builder());
        let req = TokenRequest {
            grant_type: "client_credentials".into(),
            client_id: "service-a".into(),
            ..Default::default()
        };

        assert!(matches!(handler.validate_grant(&req).await, Err(GrantError::InvalidClient)));
    }
}
