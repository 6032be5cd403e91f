//! Repository for the `sessions` table and the [`SessionStore`]
//! implementation backed by it.

use async_trait::async_trait;
use sqlx::PgPool;

use gatehouse_core::error::AuthError;
use gatehouse_core::session::{NewSession, Session};
use gatehouse_core::store::SessionStore;
use gatehouse_core::types::{SessionId, UserId};

use crate::models::session::SessionRow;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, owner_id, secret_hash, issued_at, expires_at, \
                       device_fingerprint, origin_address, revoked";

/// Raw query layer over the `sessions` table.
pub struct SessionRepo;

impl SessionRepo {
    /// Insert a new session, returning the created row.
    pub async fn create(pool: &PgPool, input: &NewSession) -> Result<SessionRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO sessions (owner_id, secret_hash, issued_at, expires_at, device_fingerprint, origin_address)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, SessionRow>(&query)
            .bind(input.owner_id)
            .bind(&input.secret_hash)
            .bind(input.issued_at)
            .bind(input.expires_at)
            .bind(&input.device_fingerprint)
            .bind(&input.origin_address)
            .fetch_one(pool)
            .await
    }

    /// Fetch a session by id, revoked or not.
    pub async fn find_by_id(
        pool: &PgPool,
        id: SessionId,
    ) -> Result<Option<SessionRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM sessions WHERE id = $1");
        sqlx::query_as::<_, SessionRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Conditionally revoke a single session.
    ///
    /// The `AND revoked = false` guard makes this the serialization point
    /// for concurrent rotations: only one caller observes a changed row.
    pub async fn revoke(pool: &PgPool, id: SessionId) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("UPDATE sessions SET revoked = true WHERE id = $1 AND revoked = false")
                .bind(id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Revoke all active sessions for an owner. Returns the count revoked.
    pub async fn revoke_all_for_owner(
        pool: &PgPool,
        owner_id: UserId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE sessions SET revoked = true WHERE owner_id = $1 AND revoked = false",
        )
        .bind(owner_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Delete expired or revoked sessions. For external housekeeping jobs;
    /// the engine itself never deletes rows.
    pub async fn cleanup_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at < NOW() OR revoked = true")
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

/// [`SessionStore`] implementation over a Postgres pool.
#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Persistence errors carry no session data, only the driver message.
fn store_err(e: sqlx::Error) -> AuthError {
    tracing::error!(error = %e, "session store failure");
    AuthError::Store(e.to_string())
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn create(&self, session: NewSession) -> Result<Session, AuthError> {
        SessionRepo::create(&self.pool, &session)
            .await
            .map(Session::from)
            .map_err(store_err)
    }

    async fn get(&self, id: SessionId) -> Result<Option<Session>, AuthError> {
        SessionRepo::find_by_id(&self.pool, id)
            .await
            .map(|row| row.map(Session::from))
            .map_err(store_err)
    }

    async fn revoke(&self, id: SessionId) -> Result<bool, AuthError> {
        SessionRepo::revoke(&self.pool, id).await.map_err(store_err)
    }

    async fn revoke_all(&self, owner_id: UserId) -> Result<u64, AuthError> {
        SessionRepo::revoke_all_for_owner(&self.pool, owner_id)
            .await
            .map_err(store_err)
    }
}
