//! Capability traits the grant handlers and management services are
//! written against, following an interface-abstraction-over-sum-types
//! style. Concrete sqlx-backed implementations live alongside each
//! trait's module; tests use simple in-memory fakes implementing the
//! same trait.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::NotificationError;
use crate::models::{AuthorizationCode, NotificationSender, OAuthApp};

/// The single place cross-request coordination matters: `take` must
/// be atomic against concurrent exchanges of the same code —
/// at most one caller may ever observe `Some` for a given `(client_id,
/// code)` pair transitioning ACTIVE -> INACTIVE.
#[async_trait]
pub trait AuthorizationCodeStore: Send + Sync {
    async fn create(&self, code: AuthorizationCode) -> anyhow::Result<()>;

    async fn get_by_client_and_code(
        &self,
        client_id: &str,
        code: &str,
    ) -> anyhow::Result<Option<AuthorizationCode>>;

    /// Conditionally transitions ACTIVE -> INACTIVE and returns whether
    /// this call won the race (`true`) or the code was already INACTIVE
    /// (`false`). Implemented as `UPDATE ... WHERE state = 'ACTIVE'`
    /// (or equivalent serializable transaction) so the DB enforces the
    /// single-writer-wins guarantee, not application-level locking.
    async fn mark_inactive(&self, code_id: &str) -> anyhow::Result<bool>;

    /// Records that a token set was issued under `code_id`, so a later
    /// reuse of the same (by-then-INACTIVE) code has something real to
    /// revoke. Called once per successful exchange, alongside
    /// `mark_inactive`.
    async fn record_issued_token(&self, code_id: &str) -> anyhow::Result<()>;

    /// Best-effort side effect on reuse of an already-INACTIVE code.
    /// Failure here never changes the client-visible
    /// `invalid_grant` outcome.
    async fn revoke_tokens_for_code(&self, code_id: &str);
}

/// External collaborator: resolves `client_id` to its registered
/// `OAuthApp`. Persistence of OAuth applications is out of
/// scope for this core.
#[async_trait]
pub trait OAuthAppRepository: Send + Sync {
    async fn get_by_client_id(&self, client_id: &str) -> anyhow::Result<Option<OAuthApp>>;
}

/// External collaborator: resolves a subject's user attributes and
/// (optionally) group memberships. Out of scope for persistence;
/// the grant handlers only ever see this narrow interface.
#[async_trait]
pub trait UserAttributeProvider: Send + Sync {
    async fn get_attributes(&self, user_id: &str) -> anyhow::Result<HashMap<String, Value>>;

    /// Bounded-page-size group lookup, only invoked when a configured
    /// attribute set references `"groups"`.
    async fn get_groups(&self, user_id: &str) -> anyhow::Result<Vec<String>>;
}

/// Read path, shared by both the mutable (DB-backed) and read-only
/// (file-backed) notification-sender stores.
#[async_trait]
pub trait ReadOnlyNotificationSenderStore: Send + Sync {
    async fn get_by_id(&self, id: &str) -> Result<Option<NotificationSender>, NotificationError>;

    /// `Ok(None)` means not-found uniformly across both implementations
    /// (see DESIGN.md); errors are reserved for infrastructure failures.
    async fn get_by_name(&self, name: &str) -> Result<Option<NotificationSender>, NotificationError>;

    async fn list(&self) -> Result<Vec<NotificationSender>, NotificationError>;
}

/// Write path. The file-backed store does not implement this trait at
/// all (rather than implementing it and returning "unsupported" errors) —
/// callers that need mutation are typed against
/// `MutableNotificationSenderStore`, callers that only read are typed
/// against `ReadOnlyNotificationSenderStore`.
#[async_trait]
pub trait MutableNotificationSenderStore: ReadOnlyNotificationSenderStore {
    async fn create(&self, sender: NotificationSender) -> Result<(), NotificationError>;

    async fn update(&self, sender: NotificationSender) -> Result<(), NotificationError>;

    /// Missing record is a no-op success.
    async fn delete(&self, id: &str) -> Result<(), NotificationError>;
}
