//! Token-exchange grant handler (RFC 8693). The richest of
//! the four: composes an actor/delegation chain on top of the usual
//! claim projection.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::dto::oauth::{TokenRequest, TokenResponse};
use crate::error::GrantError;
use crate::models::oauth_app::{GrantType, OAuthApp};
use crate::services::grants::{validate_resource_uri, GrantHandler};
use crate::services::token_builder::{BuildContext, TokenBuilder};
use crate::services::token_validator::{SubjectClaims, TokenValidator};
use crate::utils::jwt::Actor;
use crate::utils::scope::{join_scopes, parse_scopes};

const RECOGNIZED_TOKEN_TYPES: &[&str] = &[
    "urn:ietf:params:oauth:token-type:access_token",
    "urn:ietf:params:oauth:token-type:refresh_token",
    "urn:ietf:params:oauth:token-type:id_token",
    "urn:ietf:params:oauth:token-type:jwt",
];

pub struct TokenExchangeHandler {
    validator: Arc<TokenValidator>,
    builder: Arc<TokenBuilder>,
}

impl TokenExchangeHandler {
    pub fn new(validator: Arc<TokenValidator>, builder: Arc<TokenBuilder>) -> Self {
        Self { validator, builder }
    }
}

#[async_trait]
impl GrantHandler for TokenExchangeHandler {
    async fn validate_grant(&self, req: &TokenRequest) -> Result<(), GrantError> {
        if req.grant_type != GrantType::TokenExchange.as_str() {
            return Err(GrantError::UnsupportedGrantType);
        }
        let subject_token = req.subject_token.as_deref().unwrap_or_default();
        if subject_token.is_empty() {
            return Err(GrantError::InvalidRequest("subject_token is required".into()));
        }
        let subject_token_type = req.subject_token_type.as_deref().unwrap_or_default();
        if subject_token_type.is_empty() || !RECOGNIZED_TOKEN_TYPES.contains(&subject_token_type) {
            return Err(GrantError::InvalidRequest("subject_token_type is missing or unrecognized".into()));
        }
        if req.actor_token.is_some() != req.actor_token_type.is_some() {
            return Err(GrantError::InvalidRequest("actor_token and actor_token_type must be supplied together".into()));
        }
        if let Some(actor_token_type) = &req.actor_token_type {
            if !RECOGNIZED_TOKEN_TYPES.contains(&actor_token_type.as_str()) {
                return Err(GrantError::InvalidRequest("actor_token_type is unrecognized".into()));
            }
        }
        if let Some(requested) = &req.requested_token_type {
            let allowed = [
                "urn:ietf:params:oauth:token-type:access_token",
                "urn:ietf:params:oauth:token-type:jwt",
            ];
            if !allowed.contains(&requested.as_str()) {
                return Err(GrantError::InvalidTarget("requested_token_type must be access_token or jwt".into()));
            }
        }
        if let Some(resource) = &req.resource {
            if !resource.is_empty() {
                validate_resource_uri(resource)?;
            }
        }
        Ok(())
    }

    async fn handle_grant(&self, req: &TokenRequest, app: &OAuthApp) -> Result<TokenResponse, GrantError> {
        let subject = self
            .validator
            .validate_subject_token(req.subject_token.as_deref().unwrap_or_default(), app)
            .await
            .map_err(|e| GrantError::InvalidGrant(format!("subject_token: {e}")))?;

        let actor = match &req.actor_token {
            Some(token) => Some(
                self.validator
                    .validate_subject_token(token, app)
                    .await
                    .map_err(|e| GrantError::InvalidGrant(format!("actor_token: {e}")))?,
            ),
            None => None,
        };

        let scopes = determine_scopes(req.scope.as_deref(), &subject)?;

        let audience = req
            .audience
            .clone()
            .or_else(|| req.resource.clone())
            .filter(|s| !s.is_empty())
            .or_else(|| subject.aud.as_ref().and_then(Value::as_str).map(str::to_string))
            .unwrap_or_else(|| req.client_id.clone());

        let act = compose_actor(&subject, actor.as_ref());

        let ctx = BuildContext {
            subject: subject.sub.clone(),
            audience,
            client_id: req.client_id.clone(),
            scopes: scopes.clone(),
            user_attributes: subject.user_attributes.clone(),
            actor: act,
            grant_type: GrantType::TokenExchange.as_str().to_string(),
            ..Default::default()
        };

        let access = self.builder.build_access_token(app, &ctx).await?;

        let issued_token_type: &'static str = match req.requested_token_type.as_deref() {
            Some("urn:ietf:params:oauth:token-type:jwt") => "urn:ietf:params:oauth:token-type:jwt",
            _ => "urn:ietf:params:oauth:token-type:access_token",
        };

        Ok(TokenResponse {
            access_token: access.token,
            token_type: access.token_type,
            expires_in: access.expires_in,
            scope: if scopes.is_empty() { None } else { Some(join_scopes(&scopes)) },
            refresh_token: None,
            id_token: None,
            issued_token_type: Some(issued_token_type),
        })
    }
}

fn determine_scopes(requested: Option<&str>, subject: &SubjectClaims) -> Result<Vec<String>, GrantError> {
    match requested {
        None => Ok(subject.scopes.clone()),
        Some(raw) if raw.is_empty() => Ok(Vec::new()),
        Some(raw) => {
            let requested = parse_scopes(raw);
            if subject.scopes.is_empty() {
                return Err(GrantError::InvalidScope("Cannot request scopes when the subject token has no scopes".into()));
            }
            Ok(requested.into_iter().filter(|s| subject.scopes.contains(s)).collect())
        }
    }
}

/// Appends `tail` at the innermost open slot of `chain` (i.e. the bottom
/// of its own `act` nesting), rather than replacing whatever is already
/// there.
fn append_innermost(mut chain: Actor, tail: Option<Actor>) -> Actor {
    match chain.act {
        Some(inner) => chain.act = Some(Box::new(append_innermost(*inner, tail))),
        None => chain.act = tail.map(Box::new),
    }
    chain
}

fn parse_nested_act(claims: &SubjectClaims) -> Option<Actor> {
    claims.nested_act.clone().and_then(|v| serde_json::from_value::<Actor>(v).ok())
}

/// Delegation-chain composition: the newest actor is always outermost.
/// When the actor token itself carries a prior `act`, the subject's prior
/// `act` nests beneath *that* rather than replacing it, so a chain like
/// `actor -> actor.act -> subject.act` is preserved in full instead of
/// collapsing to two levels.
fn compose_actor(subject: &SubjectClaims, actor: Option<&SubjectClaims>) -> Option<Actor> {
    let subject_act = parse_nested_act(subject);
    match actor {
        Some(actor) => {
            let actor_act = parse_nested_act(actor);
            let act = match actor_act {
                Some(chain) => Some(append_innermost(chain, subject_act)),
                None => subject_act,
            };
            Some(Actor { sub: actor.sub.clone(), iss: Some(actor.iss.clone()), act: act.map(Box::new) })
        }
        None => subject_act,
    }
}
