//! Token builder. Stateless: every operation takes an immutable
//! build context and calls the injected signer exactly once.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::error::GrantError;
use crate::models::oauth_app::{OAuthApp, TokenKindConfig};
use crate::services::signing::JwtSigner;
use crate::utils::jwt::{now_ts, AccessTokenClaims, Actor, IdTokenClaims, RefreshTokenClaims};
use crate::utils::scope::join_scopes;

/// Built-in OIDC standard-scope table, consulted when an
/// `oauth_app` does not override a scope's claim set via `scope_claims`.
fn standard_scope_claims(scope: &str) -> Option<&'static [&'static str]> {
    match scope {
        "profile" => Some(&["name", "given_name", "family_name", "middle_name", "nickname", "preferred_username", "picture", "website", "gender", "birthdate", "zoneinfo", "locale", "updated_at"]),
        "email" => Some(&["email", "email_verified"]),
        "address" => Some(&["address"]),
        "phone" => Some(&["phone_number", "phone_number_verified"]),
        _ => None,
    }
}

/// Everything a build operation needs, gathered once by the grant handler
/// so the token builder itself stays stateless and side-effect free.
#[derive(Debug, Clone, Default)]
pub struct BuildContext {
    pub subject: String,
    pub audience: String,
    pub client_id: String,
    pub scopes: Vec<String>,
    pub user_attributes: HashMap<String, Value>,
    pub groups: Option<Vec<String>>,
    pub actor: Option<Actor>,
    pub grant_type: String,
    pub auth_time: Option<i64>,
    /// Present only when building a refresh token: what the *next*
    /// access token minted against it must target.
    pub access_token_sub: Option<String>,
    pub access_token_aud: Option<String>,
}

/// Wire-agnostic descriptor returned by every build operation; handlers
/// assemble the HTTP `TokenResponse` from these.
#[derive(Debug, Clone)]
pub struct TokenDescriptor {
    pub token: String,
    pub token_type: &'static str,
    pub issued_at: i64,
    pub expires_in: i64,
    pub scopes: Vec<String>,
    pub client_id: String,
    pub subject: String,
    pub audience: String,
    pub user_attributes: HashMap<String, Value>,
}

pub struct TokenBuilder {
    signer: Arc<dyn JwtSigner>,
    process_issuer: String,
    default_validity_secs: i64,
}

impl TokenBuilder {
    pub fn new(signer: Arc<dyn JwtSigner>, process_issuer: String, default_validity_secs: i64) -> Self {
        Self { signer, process_issuer, default_validity_secs }
    }

    fn resolve_issuer_validity<'a>(&'a self, app: &'a OAuthApp, kind: &'a TokenKindConfig) -> (&'a str, i64) {
        let issuer = app.resolve_issuer(kind, &self.process_issuer);
        let validity = OAuthApp::resolve_validity(kind, self.default_validity_secs);
        (issuer, validity)
    }

    /// Intersect the attributes present on the context with the kind's
    /// allow-list, projecting matches into top-level claim entries.
    fn project_attributes(ctx: &BuildContext, allowed: &[String]) -> HashMap<String, Value> {
        allowed
            .iter()
            .filter_map(|name| ctx.user_attributes.get(name).map(|v| (name.clone(), v.clone())))
            .collect()
    }

    pub async fn build_access_token(&self, app: &OAuthApp, ctx: &BuildContext) -> Result<TokenDescriptor, GrantError> {
        let kind = &app.token.access_token;
        let (issuer, validity) = self.resolve_issuer_validity(app, kind);
        let iat = now_ts();
        let exp = iat + validity;

        let scope = if ctx.scopes.is_empty() { None } else { Some(join_scopes(&ctx.scopes)) };
        let mut user_attributes = Self::project_attributes(ctx, &kind.user_attributes);

        let groups = if kind.user_attributes.iter().any(|a| a == "groups") {
            ctx.groups.clone()
        } else {
            None
        };

        let claims = AccessTokenClaims {
            sub: ctx.subject.clone(),
            aud: ctx.audience.clone(),
            iss: issuer.to_string(),
            iat,
            exp,
            client_id: ctx.client_id.clone(),
            scope: scope.clone(),
            groups: groups.clone(),
            act: ctx.actor.clone(),
            user_attributes: user_attributes.clone(),
        };
        let value = serde_json::to_value(&claims)
            .map_err(|e| GrantError::ServerError(format!("failed to encode access-token claims: {e}")))?;
        let token = self.signer.sign(&value).await?;

        if let Some(groups) = groups {
            user_attributes.insert("groups".to_string(), serde_json::to_value(groups).unwrap());
        }

        Ok(TokenDescriptor {
            token,
            token_type: "Bearer",
            issued_at: iat,
            expires_in: validity,
            scopes: ctx.scopes.clone(),
            client_id: ctx.client_id.clone(),
            subject: ctx.subject.clone(),
            audience: ctx.audience.clone(),
            user_attributes,
        })
    }

    pub async fn build_id_token(&self, app: &OAuthApp, ctx: &BuildContext) -> Result<TokenDescriptor, GrantError> {
        let kind = &app.token.id_token;
        let (issuer, validity) = self.resolve_issuer_validity(app, kind);
        let iat = now_ts();
        let exp = iat + validity;
        let auth_time = ctx.auth_time.unwrap_or(iat);

        let mut claims_map: HashMap<String, Value> = HashMap::new();
        for scope in &ctx.scopes {
            let claim_names: Vec<String> = kind
                .scope_claims
                .get(scope)
                .cloned()
                .or_else(|| standard_scope_claims(scope).map(|names| names.iter().map(|s| s.to_string()).collect()))
                .unwrap_or_default();

            for name in claim_names {
                if kind.user_attributes.contains(&name) {
                    if let Some(value) = ctx.user_attributes.get(&name) {
                        claims_map.insert(name, value.clone());
                    }
                }
            }
        }

        let groups = if kind.user_attributes.iter().any(|a| a == "groups") { ctx.groups.clone() } else { None };

        let claims = IdTokenClaims {
            sub: ctx.subject.clone(),
            aud: ctx.audience.clone(),
            iss: issuer.to_string(),
            iat,
            exp,
            auth_time,
            groups: groups.clone(),
            claims: claims_map.clone(),
        };
        let value = serde_json::to_value(&claims)
            .map_err(|e| GrantError::ServerError(format!("failed to encode id-token claims: {e}")))?;
        let token = self.signer.sign(&value).await?;

        if let Some(groups) = groups {
            claims_map.insert("groups".to_string(), serde_json::to_value(groups).unwrap());
        }

        Ok(TokenDescriptor {
            token,
            token_type: "Bearer",
            issued_at: iat,
            expires_in: validity,
            scopes: ctx.scopes.clone(),
            client_id: ctx.client_id.clone(),
            subject: ctx.subject.clone(),
            audience: ctx.audience.clone(),
            user_attributes: claims_map,
        })
    }

    pub async fn build_refresh_token(&self, app: &OAuthApp, ctx: &BuildContext) -> Result<TokenDescriptor, GrantError> {
        let kind = &app.token.refresh_token;
        let (issuer, validity) = self.resolve_issuer_validity(app, kind);
        let iat = now_ts();
        let exp = iat + validity;

        let access_token_sub = ctx.access_token_sub.clone().unwrap_or_default();
        let access_token_aud = ctx.access_token_aud.clone().unwrap_or_default();

        let claims = RefreshTokenClaims {
            sub: ctx.client_id.clone(),
            aud: ctx.client_id.clone(),
            iss: issuer.to_string(),
            iat,
            exp,
            client_id: ctx.client_id.clone(),
            grant_type: ctx.grant_type.clone(),
            scopes: ctx.scopes.clone(),
            access_token_sub,
            access_token_aud,
        };
        let value = serde_json::to_value(&claims)
            .map_err(|e| GrantError::ServerError(format!("failed to encode refresh-token claims: {e}")))?;
        let token = self.signer.sign(&value).await?;

        Ok(TokenDescriptor {
            token,
            token_type: "Bearer",
            issued_at: iat,
            expires_in: validity,
            scopes: ctx.scopes.clone(),
            client_id: ctx.client_id.clone(),
            subject: ctx.client_id.clone(),
            audience: ctx.client_id.clone(),
            user_attributes: HashMap::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::oauth_app::{GrantType, TokenConfig};
    use std::collections::HashSet;

    fn test_signer() -> Arc<dyn JwtSigner> {
        let private_key = std::fs::read_to_string("keys/private.pem").unwrap();
        let public_key = std::fs::read_to_string("keys/public.pem").unwrap();
        Arc::new(crate::utils::jwt::JwtManager::new(&private_key, &public_key).unwrap())
    }

    fn test_app() -> OAuthApp {
        OAuthApp {
            client_id: "c1".into(),
            hashed_client_secret: String::new(),
            redirect_uris: HashSet::new(),
            grant_types: [GrantType::AuthorizationCode].into_iter().collect(),
            token_endpoint_auth_method: "client_secret_basic".into(),
            requires_pkce: false,
            token: TokenConfig {
                issuer: None,
                access_token: TokenKindConfig {
                    issuer: None,
                    validity_period_seconds: Some(300),
                    user_attributes: vec!["email".to_string()],
                    scope_claims: Default::default(),
                },
                id_token: TokenKindConfig {
                    issuer: None,
                    validity_period_seconds: Some(300),
                    user_attributes: vec!["email".to_string(), "email_verified".to_string()],
                    scope_claims: Default::default(),
                },
                refresh_token: TokenKindConfig::default(),
            },
        }
    }

    #[tokio::test]
    async fn access_token_projects_configured_attributes_only() {
        let builder = TokenBuilder::new(test_signer(), "https://issuer.example".into(), 3600);
        let app = test_app();
        let mut attrs = HashMap::new();
        attrs.insert("email".to_string(), Value::String("u1@example.com".into()));
        attrs.insert("unlisted".to_string(), Value::String("should not appear".into()));

        let ctx = BuildContext {
            subject: "u1".into(),
            audience: "c1".into(),
            client_id: "c1".into(),
            scopes: vec!["openid".into(), "email".into()],
            user_attributes: attrs,
            grant_type: "authorization_code".into(),
            ..Default::default()
        };

        let descriptor = builder.build_access_token(&app, &ctx).await.unwrap();
        assert_eq!(descriptor.user_attributes.get("email").unwrap(), "u1@example.com");
        assert!(!descriptor.user_attributes.contains_key("unlisted"));
    }

    #[tokio::test]
    async fn id_token_emits_standard_scope_claims_when_admitted() {
        let builder = TokenBuilder::new(test_signer(), "https://issuer.example".into(), 3600);
        let app = test_app();
        let mut attrs = HashMap::new();
        attrs.insert("email".to_string(), Value::String("u1@example.com".into()));
        attrs.insert("email_verified".to_string(), Value::Bool(true));

        let ctx = BuildContext {
            subject: "u1".into(),
            audience: "c1".into(),
            client_id: "c1".into(),
            scopes: vec!["email".into()],
            user_attributes: attrs,
            ..Default::default()
        };

        let descriptor = builder.build_id_token(&app, &ctx).await.unwrap();
        assert_eq!(descriptor.user_attributes.get("email").unwrap(), "u1@example.com");
        assert_eq!(descriptor.user_attributes.get("email_verified").unwrap(), true);
    }

    #[tokio::test]
    async fn refresh_token_claims_encode_client_relationship() {
        let builder = TokenBuilder::new(test_signer(), "https://issuer.example".into(), 3600);
        let app = test_app();
        let ctx = BuildContext {
            client_id: "c1".into(),
            scopes: vec!["read".into()],
            grant_type: "authorization_code".into(),
            access_token_sub: Some("u1".into()),
            access_token_aud: Some("c1".into()),
            ..Default::default()
        };

        let descriptor = builder.build_refresh_token(&app, &ctx).await.unwrap();
        assert_eq!(descriptor.subject, "c1");
        assert_eq!(descriptor.audience, "c1");
    }
}
