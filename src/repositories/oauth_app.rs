//! `OAuthApp` lookup: an external collaborator, and the demonstration
//! backend the core wires up by default. Grounded on the same sqlx
//! row-then-`TryFrom` shape as
//! `repositories::notification_sender::SqlxNotificationSenderStore`.

use std::collections::{HashMap, HashSet};

use sqlx::{types::Json, FromRow, MySqlPool};

use crate::models::oauth_app::{GrantType, TokenConfig};
use crate::models::OAuthApp;
use crate::repositories::traits::OAuthAppRepository;

#[derive(Debug, FromRow)]
struct OAuthAppRow {
    client_id: String,
    hashed_client_secret: String,
    redirect_uris: Json<HashSet<String>>,
    grant_types: Json<HashSet<GrantType>>,
    token_endpoint_auth_method: String,
    requires_pkce: bool,
    token: Json<TokenConfig>,
}

impl From<OAuthAppRow> for OAuthApp {
    fn from(row: OAuthAppRow) -> Self {
        Self {
            client_id: row.client_id,
            hashed_client_secret: row.hashed_client_secret,
            redirect_uris: row.redirect_uris.0,
            grant_types: row.grant_types.0,
            token_endpoint_auth_method: row.token_endpoint_auth_method,
            requires_pkce: row.requires_pkce,
            token: row.token.0,
        }
    }
}

pub struct SqlxOAuthAppRepository {
    pool: MySqlPool,
}

impl SqlxOAuthAppRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl OAuthAppRepository for SqlxOAuthAppRepository {
    async fn get_by_client_id(&self, client_id: &str) -> anyhow::Result<Option<OAuthApp>> {
        let row = sqlx::query_as::<_, OAuthAppRow>(
            r#"SELECT client_id, hashed_client_secret, redirect_uris, grant_types,
                      token_endpoint_auth_method, requires_pkce, token
               FROM oauth_apps WHERE client_id = ?"#,
        )
        .bind(client_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(OAuthApp::from))
    }
}

/// Reads user attributes/groups out of the same MySQL instance, keyed by
/// subject id. Grounded on the same row-shape convention as the other
/// sqlx-backed stores; a production deployment that keeps this data in a
/// separate directory service would swap this struct for one calling out
/// over HTTP behind the same [`UserAttributeProvider`] trait.
pub struct SqlxUserAttributeProvider {
    pool: MySqlPool,
}

impl SqlxUserAttributeProvider {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct UserAttributeRow {
    attributes: Json<HashMap<String, serde_json::Value>>,
}

#[derive(FromRow)]
struct UserGroupRow {
    group_name: String,
}

#[async_trait::async_trait]
impl crate::repositories::traits::UserAttributeProvider for SqlxUserAttributeProvider {
    async fn get_attributes(&self, user_id: &str) -> anyhow::Result<HashMap<String, serde_json::Value>> {
        let row = sqlx::query_as::<_, UserAttributeRow>("SELECT attributes FROM user_attributes WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| r.attributes.0).unwrap_or_default())
    }

    /// Bounded page size: group membership for a single
    /// subject is never expected to run into the thousands, but the cap
    /// keeps a misconfigured directory from returning an unbounded result.
    async fn get_groups(&self, user_id: &str) -> anyhow::Result<Vec<String>> {
        const MAX_GROUPS: i64 = 500;
        let rows = sqlx::query_as::<_, UserGroupRow>(
            "SELECT group_name FROM user_groups WHERE user_id = ? ORDER BY group_name LIMIT ?",
        )
        .bind(user_id)
        .bind(MAX_GROUPS)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|r| r.group_name).collect())
    }
}
