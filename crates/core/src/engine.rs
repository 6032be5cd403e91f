//! Session lifecycle engine and access guard.
//!
//! Owns every state transition and failure policy: issuance, the
//! refresh-and-rotate protocol with reuse/hijack detection, revocation, and
//! the per-request authentication check. Holds no mutable state of its own;
//! all session state lives behind the injected [`SessionStore`].

use std::sync::Arc;

use chrono::Utc;

use crate::error::AuthError;
use crate::notify::{AddressChange, NotifyHandle};
use crate::secret::SecretHasher;
use crate::session::{Identity, NewSession, Session, TokenPair};
use crate::store::SessionStore;
use crate::token::{TokenCodec, TokenError, VerifyMode};
use crate::types::{SessionId, UserId};

pub struct SessionEngine {
    store: Arc<dyn SessionStore>,
    codec: TokenCodec,
    hasher: SecretHasher,
    notify: NotifyHandle,
    access_ttl: chrono::Duration,
    refresh_ttl: chrono::Duration,
}

impl SessionEngine {
    pub fn new(
        store: Arc<dyn SessionStore>,
        codec: TokenCodec,
        hasher: SecretHasher,
        notify: NotifyHandle,
        access_ttl: chrono::Duration,
        refresh_ttl: chrono::Duration,
    ) -> Self {
        Self {
            store,
            codec,
            hasher,
            notify,
            access_ttl,
            refresh_ttl,
        }
    }

    /// Issue a fresh credential pair for `owner_id`.
    ///
    /// Creates a new session bound to the supplied fingerprint and address,
    /// then mints an access token referencing it. The plaintext refresh
    /// secret exists only in the returned [`TokenPair`].
    pub async fn issue(
        &self,
        owner_id: UserId,
        origin_address: &str,
        device_fingerprint: &str,
    ) -> Result<TokenPair, AuthError> {
        if device_fingerprint.is_empty() {
            return Err(AuthError::BadInput("device fingerprint is required".into()));
        }

        let secret = self.hasher.generate_secret();
        let secret_hash = self.hasher.hash(&secret)?;

        let now = Utc::now();
        let session = self
            .store
            .create(NewSession {
                owner_id,
                secret_hash,
                issued_at: now,
                expires_at: now + self.refresh_ttl,
                device_fingerprint: device_fingerprint.to_string(),
                origin_address: origin_address.to_string(),
            })
            .await?;

        // If signing fails here the freshly created row is an orphan with no
        // issued credential; it starts unrevoked-but-unused, so the caller
        // may simply retry.
        let access_token = self
            .codec
            .encode(session.id, self.access_ttl)
            .map_err(|e| AuthError::Crypto(e.to_string()))?;

        tracing::debug!(owner_id = %owner_id, session_id = %session.id, "issued session");

        Ok(TokenPair {
            access_token,
            refresh_secret: secret,
        })
    }

    /// Rotate a session: consume the presented refresh secret, revoke the
    /// session it belongs to, and issue a successor.
    ///
    /// The access token may be expired; only the referenced session's state
    /// decides refresh eligibility. Every rejection that reveals the session
    /// was misused (fingerprint drift, expiry, secret mismatch) revokes the
    /// session before the error is returned.
    pub async fn refresh(
        &self,
        access_token: &str,
        refresh_secret: &str,
        origin_address: &str,
        device_fingerprint: &str,
    ) -> Result<TokenPair, AuthError> {
        let parsed = self
            .codec
            .decode(access_token, VerifyMode::AllowExpired)
            .map_err(|_| AuthError::Unauthorized("invalid access credential".into()))?;
        let session_id = parsed.claims().jti;

        let session = self
            .store
            .get(session_id)
            .await?
            .ok_or_else(|| AuthError::Unauthorized("unknown session".into()))?;

        // Reuse detection: a replayed secret against an already-rotated
        // session is rejected with nothing further mutated.
        if session.revoked {
            return Err(AuthError::Revoked);
        }

        if session.device_fingerprint != device_fingerprint {
            tracing::warn!(
                session_id = %session.id,
                owner_id = %session.owner_id,
                "fingerprint mismatch on refresh, revoking session"
            );
            self.store.revoke(session.id).await?;
            return Err(AuthError::Unauthorized("device fingerprint mismatch".into()));
        }

        if Utc::now() > session.expires_at {
            self.store.revoke(session.id).await?;
            return Err(AuthError::Expired);
        }

        if !self.hasher.verify(refresh_secret, &session.secret_hash)? {
            tracing::warn!(
                session_id = %session.id,
                owner_id = %session.owner_id,
                "refresh secret mismatch, revoking session"
            );
            self.store.revoke(session.id).await?;
            return Err(AuthError::Unauthorized("refresh secret mismatch".into()));
        }

        // Rotation point. The conditional revoke is the serialization
        // barrier: of N concurrent refreshes presenting the same secret,
        // exactly one flips the row and continues.
        if !self.store.revoke(session.id).await? {
            return Err(AuthError::Revoked);
        }

        if session.origin_address != origin_address {
            self.notify.enqueue(AddressChange {
                owner_id: session.owner_id,
                old_address: session.origin_address.clone(),
                new_address: origin_address.to_string(),
            });
        }

        let pair = self
            .issue(session.owner_id, origin_address, &session.device_fingerprint)
            .await?;

        tracing::debug!(
            owner_id = %session.owner_id,
            old_session_id = %session.id,
            "rotated session"
        );

        Ok(pair)
    }

    /// Validate an access token against its session and bind the request
    /// identity.
    ///
    /// Read-only on success; a fingerprint mismatch revokes the session
    /// before failing (same hijack containment as refresh).
    pub async fn authenticate(
        &self,
        access_token: &str,
        device_fingerprint: &str,
    ) -> Result<Identity, AuthError> {
        let parsed = self
            .codec
            .decode(access_token, VerifyMode::Strict)
            .map_err(|e| match e {
                TokenError::Expired => AuthError::Unauthorized("access token expired".into()),
                _ => AuthError::Unauthorized("invalid access credential".into()),
            })?;
        let session_id = parsed.claims().jti;

        let session: Session = self
            .store
            .get(session_id)
            .await?
            .ok_or_else(|| AuthError::Unauthorized("unknown session".into()))?;

        if session.revoked {
            return Err(AuthError::Unauthorized("session revoked".into()));
        }

        if session.device_fingerprint != device_fingerprint {
            tracing::warn!(
                session_id = %session.id,
                owner_id = %session.owner_id,
                "fingerprint mismatch on access, revoking session"
            );
            self.store.revoke(session.id).await?;
            return Err(AuthError::Unauthorized("device fingerprint mismatch".into()));
        }

        Ok(Identity {
            owner_id: session.owner_id,
            session_id: session.id,
        })
    }

    /// Revoke one session. Idempotent: revoking an already-revoked (or
    /// unknown) session is not an error.
    pub async fn logout(&self, session_id: SessionId) -> Result<(), AuthError> {
        self.store.revoke(session_id).await?;
        Ok(())
    }

    /// Revoke every session belonging to `owner_id`, returning how many
    /// were active. Zero is a valid answer.
    pub async fn revoke_all(&self, owner_id: UserId) -> Result<u64, AuthError> {
        let revoked = self.store.revoke_all(owner_id).await?;
        if revoked > 0 {
            tracing::info!(owner_id = %owner_id, revoked, "revoked all sessions for owner");
        }
        Ok(revoked)
    }
}
