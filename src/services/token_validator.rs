//! Token validator. Decodes, verifies signature, and checks
//! temporal/issuer claims of inbound JWTs (subject tokens, actor tokens,
//! refresh tokens). Owns none of the "what does this error mean to the
//! client" decision — that's left to the caller via `From<ValidationError>`.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::error::ValidationError;
use crate::models::oauth_app::OAuthApp;
use crate::services::signing::JwtSigner;
use crate::utils::jwt::now_ts;
use crate::utils::scope::parse_scopes;

/// Claim names never projected into `user_attributes`.
const RESERVED_CLAIMS: &[&str] = &["sub", "iss", "aud", "exp", "nbf", "iat", "jti", "scope", "client_id", "act"];

/// Structured result of validating a subject or actor token.
#[derive(Debug, Clone)]
pub struct SubjectClaims {
    pub sub: String,
    pub iss: String,
    pub aud: Option<Value>,
    pub scopes: Vec<String>,
    pub user_attributes: HashMap<String, Value>,
    pub nested_act: Option<Value>,
}

/// Structured result of validating a refresh token.
#[derive(Debug, Clone)]
pub struct RefreshClaims {
    pub sub: String,
    pub client_id: String,
    pub grant_type: String,
    pub scopes: Vec<String>,
    pub access_token_sub: String,
    pub access_token_aud: String,
    pub iat: i64,
}

/// Grant types whose issuance implies a refresh token may later be
/// presented back ("grant_type must be one that issues refresh tokens").
const REFRESH_ISSUING_GRANTS: &[&str] = &["authorization_code", "refresh_token"];

pub struct TokenValidator {
    signer: Arc<dyn JwtSigner>,
    process_issuer: String,
}

impl TokenValidator {
    pub fn new(signer: Arc<dyn JwtSigner>, process_issuer: String) -> Self {
        Self { signer, process_issuer }
    }

    fn valid_issuers(&self, app: &OAuthApp) -> Vec<String> {
        let mut issuers = vec![self.process_issuer.clone()];
        if let Some(iss) = &app.token.issuer {
            if !iss.is_empty() {
                issuers.push(iss.clone());
            }
        }
        if let Some(iss) = &app.token.access_token.issuer {
            if !iss.is_empty() {
                issuers.push(iss.clone());
            }
        }
        issuers
    }

    async fn decode_and_check_temporal(&self, token: &str) -> Result<Value, ValidationError> {
        let claims = self.signer.decode_unchecked(token).await.map_err(|_| ValidationError::Signature)?;

        let now = now_ts();
        let exp = claims.get("exp").and_then(Value::as_i64).ok_or(ValidationError::MissingClaim("exp"))?;
        if exp < now {
            return Err(ValidationError::Expired);
        }
        if let Some(nbf) = claims.get("nbf").and_then(Value::as_i64) {
            if nbf > now {
                return Err(ValidationError::NotYetValid);
            }
        }
        Ok(claims)
    }

    /// `ValidateSubjectToken`. Used for both the subject
    /// token and (when present) the actor token in token-exchange.
    pub async fn validate_subject_token(&self, token: &str, app: &OAuthApp) -> Result<SubjectClaims, ValidationError> {
        let claims = self.decode_and_check_temporal(token).await?;

        let iss = claims.get("iss").and_then(Value::as_str).ok_or(ValidationError::MissingClaim("iss"))?;
        let valid_issuers = self.valid_issuers(app);
        if !valid_issuers.iter().any(|v| v == iss) {
            return Err(ValidationError::UntrustedIssuer);
        }

        let sub = claims.get("sub").and_then(Value::as_str).filter(|s| !s.is_empty()).ok_or(ValidationError::MissingClaim("sub"))?;

        let scopes = claims.get("scope").and_then(Value::as_str).map(parse_scopes).unwrap_or_default();

        let user_attributes = claims
            .as_object()
            .map(|obj| {
                obj.iter()
                    .filter(|(k, _)| !RESERVED_CLAIMS.contains(&k.as_str()))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect()
            })
            .unwrap_or_default();

        Ok(SubjectClaims {
            sub: sub.to_string(),
            iss: iss.to_string(),
            aud: claims.get("aud").cloned(),
            scopes,
            user_attributes,
            nested_act: claims.get("act").cloned(),
        })
    }

    /// `ValidateRefreshToken`.
    pub async fn validate_refresh_token(&self, token: &str, expected_client_id: &str) -> Result<RefreshClaims, ValidationError> {
        let claims = self.decode_and_check_temporal(token).await?;

        let client_id = claims.get("client_id").and_then(Value::as_str).ok_or(ValidationError::MissingClaim("client_id"))?;
        if client_id != expected_client_id {
            return Err(ValidationError::ClientMismatch);
        }

        let grant_type = claims.get("grant_type").and_then(Value::as_str).ok_or(ValidationError::MissingClaim("grant_type"))?;
        if !REFRESH_ISSUING_GRANTS.contains(&grant_type) {
            return Err(ValidationError::ClientMismatch);
        }

        let sub = claims.get("sub").and_then(Value::as_str).ok_or(ValidationError::MissingClaim("sub"))?;
        let iat = claims.get("iat").and_then(Value::as_i64).ok_or(ValidationError::MissingClaim("iat"))?;

        let scopes = claims
            .get("scopes")
            .and_then(Value::as_array)
            .map(|arr| arr.iter().filter_map(Value::as_str).map(str::to_string).collect())
            .unwrap_or_default();

        let access_token_sub = claims.get("access_token_sub").and_then(Value::as_str).unwrap_or_default().to_string();
        let access_token_aud = claims.get("access_token_aud").and_then(Value::as_str).unwrap_or_default().to_string();

        Ok(RefreshClaims {
            sub: sub.to_string(),
            client_id: client_id.to_string(),
            grant_type: grant_type.to_string(),
            scopes,
            access_token_sub,
            access_token_aud,
            iat,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::oauth_app::{GrantType, TokenConfig, TokenKindConfig};
    use std::collections::HashSet;

    fn test_validator() -> TokenValidator {
        let private_key = std::fs::read_to_string("keys/private.pem").unwrap();
        let public_key = std::fs::read_to_string("keys/public.pem").unwrap();
        let signer = Arc::new(crate::utils::jwt::JwtManager::new(&private_key, &public_key).unwrap());
        TokenValidator::new(signer, "https://issuer.example".into())
    }

    fn test_app() -> OAuthApp {
        OAuthApp {
            client_id: "c1".into(),
            hashed_client_secret: String::new(),
            redirect_uris: HashSet::new(),
            grant_types: [GrantType::AuthorizationCode].into_iter().collect(),
            token_endpoint_auth_method: "client_secret_basic".into(),
            requires_pkce: false,
            token: TokenConfig { issuer: None, access_token: TokenKindConfig::default(), id_token: TokenKindConfig::default(), refresh_token: TokenKindConfig::default() },
        }
    }

    async fn sign(claims: Value) -> String {
        let private_key = std::fs::read_to_string("keys/private.pem").unwrap();
        let public_key = std::fs::read_to_string("keys/public.pem").unwrap();
        let manager = crate::utils::jwt::JwtManager::new(&private_key, &public_key).unwrap();
        manager.sign(&claims).unwrap()
    }

    #[tokio::test]
    async fn rejects_untrusted_issuer() {
        let validator = test_validator();
        let app = test_app();
        let token = sign(serde_json::json!({"sub": "u1", "iss": "https://evil.example", "exp": now_ts() + 60})).await;
        let result = validator.validate_subject_token(&token, &app).await;
        assert!(matches!(result, Err(ValidationError::UntrustedIssuer)));
    }

    #[tokio::test]
    async fn rejects_expired_token() {
        let validator = test_validator();
        let app = test_app();
        let token = sign(serde_json::json!({"sub": "u1", "iss": "https://issuer.example", "exp": now_ts() - 60})).await;
        let result = validator.validate_subject_token(&token, &app).await;
        assert!(matches!(result, Err(ValidationError::Expired)));
    }

    #[tokio::test]
    async fn excludes_reserved_claims_from_user_attributes() {
        let validator = test_validator();
        let app = test_app();
        let token = sign(serde_json::json!({
            "sub": "u1", "iss": "https://issuer.example", "aud": "c1", "exp": now_ts() + 60,
            "client_id": "c1", "scope": "openid email", "email": "u1@example.com"
        }))
        .await;
        let claims = validator.validate_subject_token(&token, &app).await.unwrap();
        assert_eq!(claims.scopes, vec!["openid", "email"]);
        assert!(claims.user_attributes.contains_key("email"));
        assert!(!claims.user_attributes.contains_key("client_id"));
        assert!(!claims.user_attributes.contains_key("scope"));
    }

    #[tokio::test]
    async fn refresh_token_rejects_client_mismatch() {
        let validator = test_validator();
        let token = sign(serde_json::json!({
            "sub": "c1", "iss": "https://issuer.example", "exp": now_ts() + 60, "iat": now_ts(),
            "client_id": "c1", "grant_type": "authorization_code", "scopes": ["read"],
            "access_token_sub": "u1", "access_token_aud": "c1"
        }))
        .await;
        let result = validator.validate_refresh_token(&token, "other-client").await;
        assert!(matches!(result, Err(ValidationError::ClientMismatch)));
    }
}
