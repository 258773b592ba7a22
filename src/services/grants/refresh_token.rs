//! Refresh-token grant handler. Stateless: the validity
//! window is governed entirely by `exp`, there is no revocation list.

use std::sync::Arc;

use async_trait::async_trait;

use crate::dto::oauth::{TokenRequest, TokenResponse};
use crate::error::GrantError;
use crate::models::oauth_app::{GrantType, OAuthApp};
use crate::services::token_builder::{BuildContext, TokenBuilder};
use crate::services::token_validator::TokenValidator;
use crate::services::grants::GrantHandler;
use crate::utils::scope::{join_scopes, parse_scopes};

pub struct RefreshTokenHandler {
    validator: Arc<TokenValidator>,
    builder: Arc<TokenBuilder>,
    renew_on_grant: bool,
}

impl RefreshTokenHandler {
    pub fn new(validator: Arc<TokenValidator>, builder: Arc<TokenBuilder>, renew_on_grant: bool) -> Self {
        Self { validator, builder, renew_on_grant }
    }
}

#[async_trait]
impl GrantHandler for RefreshTokenHandler {
    async fn validate_grant(&self, req: &TokenRequest) -> Result<(), GrantError> {
        if req.grant_type != GrantType::RefreshToken.as_str() {
            return Err(GrantError::UnsupportedGrantType);
        }
        if req.refresh_token.as_deref().unwrap_or_default().is_empty() {
            return Err(GrantError::InvalidRequest("refresh_token is required".into()));
        }
        if req.client_id.is_empty() {
            return Err(GrantError::InvalidRequest("client_id is required".into()));
        }
        Ok(())
    }

    async fn handle_grant(&self, req: &TokenRequest, app: &OAuthApp) -> Result<TokenResponse, GrantError> {
        let token = req.refresh_token.as_deref().unwrap_or_default();
        let claims = self
            .validator
            .validate_refresh_token(token, &req.client_id)
            .await
            .map_err(|_| GrantError::InvalidGrant("refresh token is invalid".into()))?;

        let downscoped = match &req.scope {
            None => claims.scopes.clone(),
            Some(raw) if raw.is_empty() => Vec::new(),
            Some(raw) => {
                let requested = parse_scopes(raw);
                let kept: Vec<String> = requested.into_iter().filter(|s| claims.scopes.contains(s)).collect();
                if kept.is_empty() {
                    tracing::debug!(client_id = %req.client_id, "refresh grant dropped all requested scopes during downscoping");
                }
                kept
            }
        };

        let ctx = BuildContext {
            subject: claims.access_token_sub.clone(),
            audience: claims.access_token_aud.clone(),
            client_id: req.client_id.clone(),
            scopes: downscoped.clone(),
            grant_type: GrantType::RefreshToken.as_str().to_string(),
            ..Default::default()
        };
        let access = self.builder.build_access_token(app, &ctx).await?;

        let refresh_token = if self.renew_on_grant {
            let refresh_ctx = BuildContext {
                client_id: req.client_id.clone(),
                scopes: downscoped.clone(),
                grant_type: GrantType::RefreshToken.as_str().to_string(),
                access_token_sub: Some(claims.access_token_sub.clone()),
                access_token_aud: Some(claims.access_token_aud.clone()),
                ..Default::default()
            };
            self.builder.build_refresh_token(app, &refresh_ctx).await?.token
        } else {
            token.to_string()
        };

        Ok(TokenResponse {
            access_token: access.token,
            token_type: access.token_type,
            expires_in: access.expires_in,
            scope: if downscoped.is_empty() { None } else { Some(join_scopes(&downscoped)) },
            refresh_token: Some(refresh_token),
            id_token: None,
            issued_token_type: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::oauth_app::TokenConfig;
    use std::collections::HashSet;

    fn signer() -> Arc<dyn crate::services::signing::JwtSigner> {
        let private_key = std::fs::read_to_string("keys/private.pem").unwrap();
        let public_key = std::fs::read_to_string("keys/public.pem").unwrap();
        Arc::new(crate::utils::jwt::JwtManager::new(&private_key, &public_key).unwrap())
    }

    fn test_app() -> OAuthApp {
        OAuthApp {
            client_id: "c1".into(),
            hashed_client_secret: String::new(),
            redirect_uris: HashSet::new(),
            grant_types: [GrantType::RefreshToken].into_iter().collect(),
            token_endpoint_auth_method: "client_secret_basic".into(),
            requires_pkce: false,
            token: TokenConfig::default(),
        }
    }

    async fn build_refresh(scopes: Vec<&str>) -> String {
        let builder = TokenBuilder::new(signer(), "https://issuer.example".into(), 3600);
        let ctx = BuildContext {
            client_id: "c1".into(),
            scopes: scopes.into_iter().map(str::to_string).collect(),
            grant_type: "authorization_code".into(),
            access_token_sub: Some("u1".into()),
            access_token_aud: Some("c1".into()),
            ..Default::default()
        };
        builder.build_refresh_token(&test_app(), &ctx).await.unwrap().token
    }

    #[tokio::test]
    async fn downscopes_to_intersection_of_requested_and_granted() {
        let validator = Arc::new(TokenValidator::new(signer(), "https://issuer.example".into()));
        let builder = Arc::new(TokenBuilder::new(signer(), "https://issuer.example".into(), 3600));
        let handler = RefreshTokenHandler::new(validator, builder, false);

        let refresh = build_refresh(vec!["openid", "profile"]).await;
        let req = TokenRequest {
            grant_type: "refresh_token".into(),
            client_id: "c1".into(),
            refresh_token: Some(refresh.clone()),
            scope: Some("openid email".into()),
            ..Default::default()
        };

        let response = handler.handle_grant(&req, &test_app()).await.unwrap();
        assert_eq!(response.scope.as_deref(), Some("openid"));
        assert_eq!(response.refresh_token.as_deref(), Some(refresh.as_str()));
    }

    #[tokio::test]
    async fn renew_on_grant_issues_a_fresh_refresh_token() {
        let validator = Arc::new(TokenValidator::new(signer(), "https://issuer.example".into()));
        let builder = Arc::new(TokenBuilder::new(signer(), "https://issuer.example".into(), 3600));
        let handler = RefreshTokenHandler::new(validator, builder, true);

        let refresh = build_refresh(vec!["openid"]).await;
        let req = TokenRequest {
            grant_type: "refresh_token".into(),
            client_id: "c1".into(),
            refresh_token: Some(refresh.clone()),
            ..Default::default()
        };

        let response = handler.handle_grant(&req, &test_app()).await.unwrap();
        assert_ne!(response.refresh_token.as_deref(), Some(refresh.as_str()));
    }
}
