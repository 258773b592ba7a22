//! Sqlx-backed `AuthorizationCodeStore`. The ACTIVE -> INACTIVE
//! transition uses a conditional-update pattern
//! (`mark_as_used`/`rows_affected`), generalized from a boolean `used`
//! flag to the `state` enum so the store can report "lost the race"
//! rather than erroring.

use async_trait::async_trait;
use sqlx::MySqlPool;

use crate::models::AuthorizationCode;
use crate::repositories::traits::AuthorizationCodeStore;

#[derive(Clone)]
pub struct SqlxAuthorizationCodeStore {
    pool: MySqlPool,
}

impl SqlxAuthorizationCodeStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuthorizationCodeStore for SqlxAuthorizationCodeStore {
    async fn create(&self, code: AuthorizationCode) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            INSERT INTO authorization_codes
            (code_id, code, client_id, redirect_uri, authorized_user_id, scopes, state,
             time_created, expiry_time, code_challenge, code_challenge_method, resource)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&code.code_id)
        .bind(&code.code)
        .bind(&code.client_id)
        .bind(&code.redirect_uri)
        .bind(&code.authorized_user_id)
        .bind(&code.scopes)
        .bind(code.state.as_str())
        .bind(code.time_created)
        .bind(code.expiry_time)
        .bind(&code.code_challenge)
        .bind(code.code_challenge_method.map(|m| m.as_str()))
        .bind(&code.resource)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_by_client_and_code(&self, client_id: &str, code: &str) -> anyhow::Result<Option<AuthorizationCode>> {
        let row = sqlx::query_as::<_, AuthorizationCode>(
            r#"
            SELECT code_id, code, client_id, redirect_uri, authorized_user_id, scopes, state,
                   time_created, expiry_time, code_challenge, code_challenge_method, resource
            FROM authorization_codes
            WHERE client_id = ? AND code = ?
            "#,
        )
        .bind(client_id)
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn mark_inactive(&self, code_id: &str) -> anyhow::Result<bool> {
        let result = sqlx::query("UPDATE authorization_codes SET state = 'INACTIVE' WHERE code_id = ? AND state = 'ACTIVE'")
            .bind(code_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn record_issued_token(&self, code_id: &str) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO issued_tokens (code_id) VALUES (?)")
            .bind(code_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn revoke_tokens_for_code(&self, code_id: &str) {
        if let Err(e) = sqlx::query("DELETE FROM issued_tokens WHERE code_id = ?")
            .bind(code_id)
            .execute(&self.pool)
            .await
        {
            tracing::warn!(error = %e, code_id, "failed to revoke tokens for reused authorization code");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CodeState;
    use crate::test_support::FakeAuthorizationCodeStore;
    use chrono::{Duration, Utc};

    fn sample_code() -> AuthorizationCode {
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
            code_challenge: String::new(),
            code_challenge_method: None,
            resource: None,
        }
    }

    #[tokio::test]
    async fn mark_inactive_is_single_use() {
        let store = FakeAuthorizationCodeStore::default();
        store.create(sample_code()).await.unwrap();

        assert!(store.mark_inactive("code-1").await.unwrap());
        assert!(!store.mark_inactive("code-1").await.unwrap());
    }
}
