//! Row type for the `sessions` table.

use gatehouse_core::session::Session;
use gatehouse_core::types::{SessionId, Timestamp, UserId};
use sqlx::FromRow;

/// A session row as stored in PostgreSQL.
#[derive(Debug, Clone, FromRow)]
pub struct SessionRow {
    pub id: SessionId,
    pub owner_id: UserId,
    pub secret_hash: String,
    pub issued_at: Timestamp,
    pub expires_at: Timestamp,
    pub device_fingerprint: String,
    pub origin_address: String,
    pub revoked: bool,
}

impl From<SessionRow> for Session {
    fn from(row: SessionRow) -> Self {
        Session {
            id: row.id,
            owner_id: row.owner_id,
            secret_hash: row.secret_hash,
            issued_at: row.issued_at,
            expires_at: row.expires_at,
            device_fingerprint: row.device_fingerprint,
            origin_address: row.origin_address,
            revoked: row.revoked,
        }
    }
}
