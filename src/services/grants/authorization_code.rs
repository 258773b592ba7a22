//! Authorization-code grant handler. The only handler that
//! touches the authorization-code store and PKCE verifier.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use chrono::Utc;

use crate::dto::oauth::{TokenRequest, TokenResponse};
use crate::error::GrantError;
use crate::models::oauth_app::{GrantType, OAuthApp};
use crate::repositories::traits::{AuthorizationCodeStore, UserAttributeProvider};
use crate::services::grants::{validate_resource_uri, GrantHandler};
use crate::services::token_builder::{BuildContext, TokenBuilder};
use crate::utils::pkce::verify_pkce;
use crate::utils::scope::parse_scopes;

pub struct AuthorizationCodeHandler {
    codes: Arc<dyn AuthorizationCodeStore>,
    attributes: Arc<dyn UserAttributeProvider>,
    builder: Arc<TokenBuilder>,
}

impl AuthorizationCodeHandler {
    pub fn new(codes: Arc<dyn AuthorizationCodeStore>, attributes: Arc<dyn UserAttributeProvider>, builder: Arc<TokenBuilder>) -> Self {
        Self { codes, attributes, builder }
    }
}

#[async_trait]
impl GrantHandler for AuthorizationCodeHandler {
    async fn validate_grant(&self, req: &TokenRequest) -> Result<(), GrantError> {
        if req.grant_type != GrantType::AuthorizationCode.as_str() {
            return Err(GrantError::UnsupportedGrantType);
        }
        if req.code.as_deref().unwrap_or_default().is_empty() {
            return Err(GrantError::InvalidRequest("code is required".into()));
        }
        if req.client_id.is_empty() {
            return Err(GrantError::InvalidRequest("client_id is required".into()));
        }
        if req.redirect_uri.as_deref().unwrap_or_default().is_empty() {
            return Err(GrantError::InvalidRequest("redirect_uri is required".into()));
        }
        if let Some(resource) = &req.resource {
            if !resource.is_empty() {
                validate_resource_uri(resource)?;
            }
        }
        Ok(())
    }

    async fn handle_grant(&self, req: &TokenRequest, app: &OAuthApp) -> Result<TokenResponse, GrantError> {
        let code_value = req.code.as_deref().unwrap_or_default();
        let redirect_uri = req.redirect_uri.as_deref().unwrap_or_default();

        let code = self
            .codes
            .get_by_client_and_code(&req.client_id, code_value)
            .await
            .map_err(|e| GrantError::ServerError(e.to_string()))?
            .ok_or_else(|| GrantError::InvalidGrant("authorization code not found".into()))?;

        if code.client_id != req.client_id {
            return Err(GrantError::InvalidClient);
        }
        if !code.redirect_uri.is_empty() && redirect_uri != code.redirect_uri {
            return Err(GrantError::InvalidGrant("redirect_uri does not match the authorization".into()));
        }
        match (&code.resource, &req.resource) {
            (Some(code_resource), _) if !code_resource.is_empty() => {
                if req.resource.as_deref() != Some(code_resource.as_str()) {
                    return Err(GrantError::InvalidTarget("resource does not match the authorization".into()));
                }
            }
            _ => {}
        }
        if !code.is_active() {
            self.codes.revoke_tokens_for_code(&code.code_id).await;
            return Err(GrantError::InvalidGrant("authorization code already used".into()));
        }
        if code.is_expired(Utc::now()) {
            return Err(GrantError::InvalidGrant("authorization code expired".into()));
        }

        if app.requires_pkce || !code.code_challenge.is_empty() {
            let verifier = req
                .code_verifier
                .as_deref()
                .ok_or_else(|| GrantError::InvalidGrant("Invalid code verifier".into()))?;
            let method = code.code_challenge_method.ok_or_else(|| GrantError::InvalidGrant("Invalid code verifier".into()))?;
            if !verify_pkce(verifier, &code.code_challenge, method.as_str()) {
                return Err(GrantError::InvalidGrant("Invalid code verifier".into()));
            }
        }

        let scopes = parse_scopes(&code.scopes);

        let wants_groups = app.token.access_token.user_attributes.iter().any(|a| a == "groups")
            || app.token.id_token.user_attributes.iter().any(|a| a == "groups");

        let user_attributes = self
            .attributes
            .get_attributes(&code.authorized_user_id)
            .await
            .map_err(|e| GrantError::ServerError(e.to_string()))?;
        let groups = if wants_groups {
            Some(
                self.attributes
                    .get_groups(&code.authorized_user_id)
                    .await
                    .map_err(|e| GrantError::ServerError(e.to_string()))?,
            )
        } else {
            None
        };

        let audience = code.resource.clone().filter(|r| !r.is_empty()).unwrap_or_else(|| code.client_id.clone());

        let mut ctx = BuildContext {
            subject: code.authorized_user_id.clone(),
            audience: audience.clone(),
            client_id: code.client_id.clone(),
            scopes: scopes.clone(),
            user_attributes: user_attributes.clone(),
            groups: groups.clone(),
            grant_type: GrantType::AuthorizationCode.as_str().to_string(),
            ..Default::default()
        };

        let access = self.builder.build_access_token(app, &ctx).await?;

        let id_token = if scopes.iter().any(|s| s == "openid") {
            ctx.auth_time = Some(now_secs());
            Some(self.builder.build_id_token(app, &ctx).await?.token)
        } else {
            None
        };

        let refresh_token = if app.supports_grant(GrantType::RefreshToken) {
            let refresh_ctx = BuildContext {
                client_id: code.client_id.clone(),
                scopes: scopes.clone(),
                grant_type: GrantType::AuthorizationCode.as_str().to_string(),
                access_token_sub: Some(code.authorized_user_id.clone()),
                access_token_aud: Some(audience.clone()),
                ..Default::default()
            };
            Some(self.builder.build_refresh_token(app, &refresh_ctx).await?.token)
        } else {
            None
        };

        self.codes
            .record_issued_token(&code.code_id)
            .await
            .map_err(|e| GrantError::ServerError(e.to_string()))?;

        if !self.codes.mark_inactive(&code.code_id).await.map_err(|e| GrantError::ServerError(e.to_string()))? {
            return Err(GrantError::InvalidGrant("authorization code already used".into()));
        }

        Ok(TokenResponse {
            access_token: access.token,
            token_type: access.token_type,
            expires_in: access.expires_in,
            scope: if scopes.is_empty() { None } else { Some(crate::utils::scope::join_scopes(&scopes)) },
            refresh_token,
            id_token,
            issued_token_type: None,
        })
    }
}

fn now_secs() -> i64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::oauth_app::{TokenConfig, TokenKindConfig};
    use crate::models::{AuthorizationCode, CodeState, PkceMethod};
    use crate::test_support::{FakeAuthorizationCodeStore, FakeUserAttributeProvider};
    use crate::utils::pkce::compute_s256_challenge;
    use chrono::Duration;
    use std::collections::HashSet;

    fn test_builder() -> Arc<TokenBuilder> {
        let private_key = std::fs::read_to_string("keys/private.pem").unwrap();
        let public_key = std::fs::read_to_string("keys/public.pem").unwrap();
        let signer = Arc::new(crate::utils::jwt::JwtManager::new(&private_key, &public_key).unwrap());
        Arc::new(TokenBuilder::new(signer, "https://issuer.example".into(), 3600))
    }

    fn test_app(requires_pkce: bool) -> OAuthApp {
        OAuthApp {
            client_id: "c1".into(),
            hashed_client_secret: String::new(),
            redirect_uris: HashSet::new(),
            grant_types: [GrantType::AuthorizationCode, GrantType::RefreshToken].into_iter().collect(),
            token_endpoint_auth_method: "client_secret_basic".into(),
            requires_pkce,
            token: TokenConfig {
                issuer: None,
                access_token: TokenKindConfig { user_attributes: vec!["email".into()], ..Default::default() },
                id_token: TokenKindConfig { user_attributes: vec!["email".into()], ..Default::default() },
                refresh_token: TokenKindConfig::default(),
            },
        }
    }

    fn test_code(challenge: &str) -> AuthorizationCode {
        AuthorizationCode {
            code_id: "code-1".into(),
            code: "abc".into(),
            client_id: "c1".into(),
            redirect_uri: "https://x/cb".into(),
            authorized_user_id: "u1".into(),
            scopes: "openid email".into(),
            state: CodeState::Active,
            time_created: Utc::now(),
            expiry_time: Utc::now() + Duration::minutes(5),
            code_challenge: challenge.to_string(),
            code_challenge_method: Some(PkceMethod::S256),
            resource: None,
        }
    }

    #[tokio::test]
    async fn exchange_is_single_use() {
        let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
        let challenge = compute_s256_challenge(verifier);

        let codes = Arc::new(FakeAuthorizationCodeStore::default());
        codes.create(test_code(&challenge)).await.unwrap();
        let attributes = Arc::new(FakeUserAttributeProvider::default());
        attributes.set("u1", [("email".to_string(), serde_json::json!("u1@example.com"))].into_iter().collect());

        let handler = AuthorizationCodeHandler::new(codes, attributes, test_builder());
        let app = test_app(false);

        let req = TokenRequest {
            grant_type: "authorization_code".into(),
            code: Some("abc".into()),
            redirect_uri: Some("https://x/cb".into()),
            client_id: "c1".into(),
            code_verifier: Some(verifier.into()),
            ..Default::default()
        };

        let response = handler.handle_grant(&req, &app).await.unwrap();
        assert!(response.id_token.is_some());
        assert!(response.refresh_token.is_some());

        let second = handler.handle_grant(&req, &app).await;
        assert!(matches!(second, Err(GrantError::InvalidGrant(_))));
    }

    #[tokio::test]
    async fn reuse_revokes_the_tokens_issued_under_the_code() {
        let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
        let challenge = compute_s256_challenge(verifier);

        let codes = Arc::new(FakeAuthorizationCodeStore::default());
        codes.create(test_code(&challenge)).await.unwrap();
        let attributes = Arc::new(FakeUserAttributeProvider::default());

        let handler = AuthorizationCodeHandler::new(codes.clone(), attributes, test_builder());
        let app = test_app(false);

        let req = TokenRequest {
            grant_type: "authorization_code".into(),
            code: Some("abc".into()),
            redirect_uri: Some("https://x/cb".into()),
            client_id: "c1".into(),
            code_verifier: Some(verifier.into()),
            ..Default::default()
        };

        handler.handle_grant(&req, &app).await.unwrap();
        assert_eq!(codes.issued_tokens.lock().unwrap().as_slice(), ["code-1"]);

        let second = handler.handle_grant(&req, &app).await;
        assert!(matches!(second, Err(GrantError::InvalidGrant(_))));
        assert!(codes.issued_tokens.lock().unwrap().is_empty());
        assert_eq!(codes.revoked.lock().unwrap().as_slice(), ["code-1"]);
    }

    #[tokio::test]
    async fn rejects_wrong_code_verifier() {
        let challenge = compute_s256_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk");
        let codes = Arc::new(FakeAuthorizationCodeStore::default());
        codes.create(test_code(&challenge)).await.unwrap();
        let attributes = Arc::new(FakeUserAttributeProvider::default());

        let handler = AuthorizationCodeHandler::new(codes, attributes, test_builder());
        let app = test_app(true);

        let req = TokenRequest {
            grant_type: "authorization_code".into(),
            code: Some("abc".into()),
            redirect_uri: Some("https://x/cb".into()),
            client_id: "c1".into(),
            code_verifier: Some("wrong-verifier-that-is-long-enough-to-pass-length-check".into()),
            ..Default::default()
        };

        let result = handler.handle_grant(&req, &app).await;
        assert!(matches!(result, Err(GrantError::InvalidGrant(_))));
    }
}
