//! Session entity and the value types exchanged with the engine.

use crate::types::{SessionId, Timestamp, UserId};

/// A durable session record.
///
/// One row per issued refresh secret. Rotation revokes the current row and
/// creates a successor; rows are never physically deleted by the engine.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub owner_id: UserId,
    /// Argon2id PHC hash of the refresh secret. The plaintext is never stored.
    pub secret_hash: String,
    pub issued_at: Timestamp,
    /// Bounds refresh-secret validity; access tokens carry their own expiry.
    pub expires_at: Timestamp,
    /// Client-declared agent string captured at issuance. Immutable.
    pub device_fingerprint: String,
    /// Network address observed at the most recent issuance/rotation.
    pub origin_address: String,
    /// Monotonic false -> true.
    pub revoked: bool,
}

/// Input for creating a session row. The store assigns `id`.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub owner_id: UserId,
    pub secret_hash: String,
    pub issued_at: Timestamp,
    pub expires_at: Timestamp,
    pub device_fingerprint: String,
    pub origin_address: String,
}

/// Credential pair returned by issue and refresh.
///
/// `refresh_secret` is the only copy of the plaintext; it is never logged
/// or persisted.
#[derive(Debug)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_secret: String,
}

/// Authenticated identity produced by the access guard.
#[derive(Debug, Clone, Copy)]
pub struct Identity {
    pub owner_id: UserId,
    pub session_id: SessionId,
}
