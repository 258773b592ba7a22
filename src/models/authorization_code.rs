use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Lifecycle state of an authorization code. Created ACTIVE;
/// transitions to INACTIVE on first successful exchange and is never
/// re-honored afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CodeState {
    Active,
    Inactive,
}

impl CodeState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
        }
    }

    pub fn parse(raw: &str) -> Self {
        match raw {
            "ACTIVE" => Self::Active,
            _ => Self::Inactive,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PkceMethod {
    Plain,
    #[serde(rename = "S256")]
    S256,
}

impl PkceMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::S256 => "S256",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "plain" => Some(Self::Plain),
            "S256" => Some(Self::S256),
            _ => None,
        }
    }
}

/// AuthorizationCode. `code_id` is the store's primary key;
/// `code` is the opaque bearer value a client presents at the token
/// endpoint — distinct so the store can look codes up by `(client_id,
/// code)` without `code` needing to be globally unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationCode {
    pub code_id: String,
    pub code: String,
    pub client_id: String,
    pub redirect_uri: String,
    pub authorized_user_id: String,
    /// Space-joined (round-trips through `utils::scope`).
    pub scopes: String,
    pub state: CodeState,
    pub time_created: DateTime<Utc>,
    pub expiry_time: DateTime<Utc>,
    pub code_challenge: String,
    pub code_challenge_method: Option<PkceMethod>,
    pub resource: Option<String>,
}

/// Row shape returned by the sqlx store; `code_challenge_method` and
/// `state` are stored as plain strings and parsed on the way out.
#[derive(Debug, Clone, FromRow)]
pub struct AuthorizationCodeRow {
    pub code_id: String,
    pub code: String,
    pub client_id: String,
    pub redirect_uri: String,
    pub authorized_user_id: String,
    pub scopes: String,
    pub state: String,
    pub time_created: DateTime<Utc>,
    pub expiry_time: DateTime<Utc>,
    pub code_challenge: String,
    pub code_challenge_method: Option<String>,
    pub resource: Option<String>,
}

impl From<AuthorizationCodeRow> for AuthorizationCode {
    fn from(row: AuthorizationCodeRow) -> Self {
        Self {
            code_id: row.code_id,
            code: row.code,
            client_id: row.client_id,
            redirect_uri: row.redirect_uri,
            authorized_user_id: row.authorized_user_id,
            scopes: row.scopes,
            state: CodeState::parse(&row.state),
            time_created: row.time_created,
            expiry_time: row.expiry_time,
            code_challenge: row.code_challenge,
            code_challenge_method: row.code_challenge_method.as_deref().and_then(PkceMethod::parse),
            resource: row.resource,
        }
    }
}

impl<'r> sqlx::FromRow<'r, sqlx::mysql::MySqlRow> for AuthorizationCode {
    fn from_row(row: &'r sqlx::mysql::MySqlRow) -> Result<Self, sqlx::Error> {
        AuthorizationCodeRow::from_row(row).map(AuthorizationCode::from)
    }
}

impl AuthorizationCode {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiry_time <= now
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, CodeState::Active)
    }
}
