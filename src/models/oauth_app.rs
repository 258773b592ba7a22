//! OAuthApplication (external). The core never persists these records —
//! they are injected through [`crate::repositories::traits::OAuthAppRepository`]
//! — but it owns the shape every grant handler reads from.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

/// The four grant types this core issues tokens for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
    AuthorizationCode,
    ClientCredentials,
    RefreshToken,
    TokenExchange,
}

impl GrantType {
    /// The wire identifier as it appears in the `grant_type` form field.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AuthorizationCode => "authorization_code",
            Self::ClientCredentials => "client_credentials",
            Self::RefreshToken => "refresh_token",
            Self::TokenExchange => "urn:ietf:params:oauth:grant-type:token-exchange",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "authorization_code" => Some(Self::AuthorizationCode),
            "client_credentials" => Some(Self::ClientCredentials),
            "refresh_token" => Some(Self::RefreshToken),
            "urn:ietf:params:oauth:grant-type:token-exchange" => Some(Self::TokenExchange),
            _ => None,
        }
    }
}

/// Per-token-kind configuration shared by access, ID and refresh tokens:
/// issuer and validity fall through to the parent `TokenConfig`, then to
/// process-wide defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenKindConfig {
    #[serde(default)]
    pub issuer: Option<String>,
    #[serde(default)]
    pub validity_period_seconds: Option<i64>,
    /// Ordered set of attribute names this token kind is allowed to carry.
    #[serde(default)]
    pub user_attributes: Vec<String>,
    /// scope -> claim names, overriding the built-in OIDC standard-scope table.
    #[serde(default)]
    pub scope_claims: HashMap<String, Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenConfig {
    #[serde(default)]
    pub issuer: Option<String>,
    #[serde(default)]
    pub access_token: TokenKindConfig,
    #[serde(default)]
    pub id_token: TokenKindConfig,
    #[serde(default)]
    pub refresh_token: TokenKindConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthApp {
    pub client_id: String,
    #[serde(skip_serializing)]
    pub hashed_client_secret: String,
    pub redirect_uris: HashSet<String>,
    pub grant_types: HashSet<GrantType>,
    pub token_endpoint_auth_method: String,
    pub requires_pkce: bool,
    pub token: TokenConfig,
}

impl OAuthApp {
    pub fn supports_grant(&self, grant: GrantType) -> bool {
        self.grant_types.contains(&grant)
    }

    pub fn has_redirect_uri(&self, uri: &str) -> bool {
        self.redirect_uris.contains(uri)
    }

    /// Issuer resolution order for a token kind: kind-level,
    /// then app-level, then the caller-supplied process default.
    pub fn resolve_issuer<'a>(&'a self, kind: &'a TokenKindConfig, process_default: &'a str) -> &'a str {
        kind.issuer
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.token.issuer.as_deref().filter(|s| !s.is_empty()))
            .unwrap_or(process_default)
    }

    pub fn resolve_validity(kind: &TokenKindConfig, process_default: i64) -> i64 {
        kind.validity_period_seconds.unwrap_or(process_default)
    }
}
