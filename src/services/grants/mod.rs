//! Grant handlers and the grant handler provider.

pub mod authorization_code;
pub mod client_credentials;
pub mod provider;
pub mod refresh_token;
pub mod token_exchange;

use async_trait::async_trait;

use crate::dto::oauth::{TokenRequest, TokenResponse};
use crate::error::GrantError;
use crate::models::OAuthApp;

pub use provider::GrantHandlerProvider;

/// Common contract every grant handler satisfies.
#[async_trait]
pub trait GrantHandler: Send + Sync {
    /// Syntactic/structural validation; returns OAuth-specified error
    /// codes without touching any store.
    async fn validate_grant(&self, req: &TokenRequest) -> Result<(), GrantError>;

    /// Executes the state machine described for this grant.
    async fn handle_grant(&self, req: &TokenRequest, app: &OAuthApp) -> Result<TokenResponse, GrantError>;
}

/// `resource`, when present, must be an absolute URI without a fragment.
/// Shared by the authorization-code and token-exchange validators.
pub(crate) fn validate_resource_uri(resource: &str) -> Result<(), GrantError> {
    let parsed = url::Url::parse(resource).map_err(|_| GrantError::InvalidTarget("resource must be an absolute URI".into()))?;
    if parsed.fragment().is_some() {
        return Err(GrantError::InvalidTarget("resource must not contain a fragment".into()));
    }
    if parsed.cannot_be_a_base() {
        return Err(GrantError::InvalidTarget("resource must be an absolute URI".into()));
    }
    Ok(())
}
