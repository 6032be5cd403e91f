//! Collaborator traits consumed by the engine.
//!
//! All session state lives behind [`SessionStore`]; the engine holds no
//! in-process mutable state. [`ChangeNotifier`] is the out-of-band alerting
//! hook, called off the request path via the notification queue.

use async_trait::async_trait;

use crate::error::AuthError;
use crate::session::{NewSession, Session};
use crate::types::{SessionId, UserId};

/// Durable session persistence.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert a new session row, returning it with its assigned id.
    async fn create(&self, session: NewSession) -> Result<Session, AuthError>;

    /// Fetch a session by id.
    async fn get(&self, id: SessionId) -> Result<Option<Session>, AuthError>;

    /// Flip `revoked` on a not-yet-revoked row.
    ///
    /// Returns `true` only if this call changed the row. A `false` return
    /// means the session was already revoked (or never existed) -- the
    /// conditional update is what guarantees at-most-one successful
    /// rotation per secret under concurrent refreshes.
    async fn revoke(&self, id: SessionId) -> Result<bool, AuthError>;

    /// Revoke every active session belonging to `owner_id`, returning the
    /// number of rows changed. Zero matches is not an error.
    async fn revoke_all(&self, owner_id: UserId) -> Result<u64, AuthError>;
}

/// Best-effort signal that a session's originating address changed.
///
/// Implementations own their failure handling; the engine never observes
/// an outcome.
#[async_trait]
pub trait ChangeNotifier: Send + Sync {
    async fn notify(&self, owner_id: UserId, old_address: &str, new_address: &str);
}
