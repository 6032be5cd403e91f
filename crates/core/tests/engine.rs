//! End-to-end tests of the session lifecycle engine over an in-memory
//! store and a recording notifier.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use uuid::Uuid;

use gatehouse_core::engine::SessionEngine;
use gatehouse_core::error::AuthError;
use gatehouse_core::notify::spawn_notify_worker;
use gatehouse_core::secret::SecretHasher;
use gatehouse_core::session::{NewSession, Session};
use gatehouse_core::store::{ChangeNotifier, SessionStore};
use gatehouse_core::token::TokenCodec;
use gatehouse_core::types::{SessionId, UserId};

// ---------------------------------------------------------------------------
// Test doubles
// ---------------------------------------------------------------------------

/// Mutex-backed session store. `revoke` performs the same conditional flip
/// as the Postgres implementation so rotation races behave identically.
#[derive(Default)]
struct MemoryStore {
    sessions: Mutex<HashMap<SessionId, Session>>,
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create(&self, input: NewSession) -> Result<Session, AuthError> {
        let session = Session {
            id: Uuid::new_v4(),
            owner_id: input.owner_id,
            secret_hash: input.secret_hash,
            issued_at: input.issued_at,
            expires_at: input.expires_at,
            device_fingerprint: input.device_fingerprint,
            origin_address: input.origin_address,
            revoked: false,
        };
        self.sessions
            .lock()
            .unwrap()
            .insert(session.id, session.clone());
        Ok(session)
    }

    async fn get(&self, id: SessionId) -> Result<Option<Session>, AuthError> {
        Ok(self.sessions.lock().unwrap().get(&id).cloned())
    }

    async fn revoke(&self, id: SessionId) -> Result<bool, AuthError> {
        let mut sessions = self.sessions.lock().unwrap();
        match sessions.get_mut(&id) {
            Some(s) if !s.revoked => {
                s.revoked = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn revoke_all(&self, owner_id: UserId) -> Result<u64, AuthError> {
        let mut sessions = self.sessions.lock().unwrap();
        let mut count = 0;
        for s in sessions.values_mut() {
            if s.owner_id == owner_id && !s.revoked {
                s.revoked = true;
                count += 1;
            }
        }
        Ok(count)
    }
}

impl MemoryStore {
    fn only_session_id(&self) -> SessionId {
        let sessions = self.sessions.lock().unwrap();
        assert_eq!(sessions.len(), 1, "expected exactly one session");
        *sessions.keys().next().unwrap()
    }

    fn is_revoked(&self, id: SessionId) -> bool {
        self.sessions.lock().unwrap()[&id].revoked
    }
}

#[derive(Default)]
struct RecordingNotifier {
    events: Mutex<Vec<(UserId, String, String)>>,
}

#[async_trait]
impl ChangeNotifier for RecordingNotifier {
    async fn notify(&self, owner_id: UserId, old_address: &str, new_address: &str) {
        self.events
            .lock()
            .unwrap()
            .push((owner_id, old_address.to_string(), new_address.to_string()));
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

struct Harness {
    engine: Arc<SessionEngine>,
    store: Arc<MemoryStore>,
    notifier: Arc<RecordingNotifier>,
}

fn harness_with_refresh_ttl(refresh_ttl: chrono::Duration) -> Harness {
    let store = Arc::new(MemoryStore::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let (notify, _worker) = spawn_notify_worker(
        Arc::clone(&notifier) as Arc<dyn ChangeNotifier>,
        16,
        Duration::from_secs(1),
    );
    let engine = Arc::new(SessionEngine::new(
        Arc::clone(&store) as Arc<dyn SessionStore>,
        TokenCodec::new("engine-test-secret-long-enough-for-hmac"),
        SecretHasher::default(),
        notify,
        chrono::Duration::minutes(15),
        refresh_ttl,
    ));
    Harness {
        engine,
        store,
        notifier,
    }
}

fn harness() -> Harness {
    harness_with_refresh_ttl(chrono::Duration::days(7))
}

/// Wait for the background notification worker to drain.
async fn wait_for_notification(notifier: &RecordingNotifier) -> (UserId, String, String) {
    for _ in 0..100 {
        if let Some(event) = notifier.events.lock().unwrap().first().cloned() {
            return event;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("no notification delivered within 1s");
}

// ---------------------------------------------------------------------------
// Issue + authenticate
// ---------------------------------------------------------------------------

#[tokio::test]
async fn issued_credential_authenticates_back_to_owner() {
    let h = harness();
    let owner = Uuid::new_v4();

    let pair = h
        .engine
        .issue(owner, "1.1.1.1", "agent-A")
        .await
        .expect("issue should succeed");

    let identity = h
        .engine
        .authenticate(&pair.access_token, "agent-A")
        .await
        .expect("authenticate should succeed");
    assert_eq!(identity.owner_id, owner);
    assert_eq!(identity.session_id, h.store.only_session_id());
}

#[tokio::test]
async fn issue_rejects_empty_fingerprint() {
    let h = harness();
    let result = h.engine.issue(Uuid::new_v4(), "1.1.1.1", "").await;
    assert_matches!(result, Err(AuthError::BadInput(_)));
}

#[tokio::test]
async fn authenticate_rejects_garbage_token() {
    let h = harness();
    let result = h.engine.authenticate("not-a-jwt", "agent-A").await;
    assert_matches!(result, Err(AuthError::Unauthorized(_)));
}

// ---------------------------------------------------------------------------
// Refresh / rotation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn refresh_rotates_and_stale_secret_is_rejected_as_revoked() {
    let h = harness();
    let owner = Uuid::new_v4();
    let pair = h.engine.issue(owner, "1.1.1.1", "agent-A").await.unwrap();
    let old_session = h.store.only_session_id();

    let new_pair = h
        .engine
        .refresh(&pair.access_token, &pair.refresh_secret, "1.1.1.1", "agent-A")
        .await
        .expect("refresh should succeed");
    assert!(h.store.is_revoked(old_session), "rotation must revoke the old row");
    assert_ne!(new_pair.refresh_secret, pair.refresh_secret);

    // Replaying the consumed secret against the original session is the
    // reuse-detection path.
    let replay = h
        .engine
        .refresh(&pair.access_token, &pair.refresh_secret, "1.1.1.1", "agent-A")
        .await;
    assert_matches!(replay, Err(AuthError::Revoked));

    // The successor pair is live.
    let identity = h
        .engine
        .authenticate(&new_pair.access_token, "agent-A")
        .await
        .unwrap();
    assert_eq!(identity.owner_id, owner);
}

#[tokio::test]
async fn refresh_with_wrong_secret_revokes_the_session() {
    let h = harness();
    let pair = h
        .engine
        .issue(Uuid::new_v4(), "1.1.1.1", "agent-A")
        .await
        .unwrap();
    let session_id = h.store.only_session_id();

    let wrong = SecretHasher::default().generate_secret();
    let result = h
        .engine
        .refresh(&pair.access_token, &wrong, "1.1.1.1", "agent-A")
        .await;
    assert_matches!(result, Err(AuthError::Unauthorized(_)));
    assert!(h.store.is_revoked(session_id));

    // Even the correct secret is now dead.
    let retry = h
        .engine
        .refresh(&pair.access_token, &pair.refresh_secret, "1.1.1.1", "agent-A")
        .await;
    assert_matches!(retry, Err(AuthError::Revoked));
}

#[tokio::test]
async fn fingerprint_mismatch_on_refresh_revokes_and_poisons_the_session() {
    let h = harness();
    let pair = h
        .engine
        .issue(Uuid::new_v4(), "1.1.1.1", "agent-A")
        .await
        .unwrap();
    let session_id = h.store.only_session_id();

    let result = h
        .engine
        .refresh(&pair.access_token, &pair.refresh_secret, "1.1.1.1", "agent-B")
        .await;
    assert_matches!(result, Err(AuthError::Unauthorized(_)));
    assert!(h.store.is_revoked(session_id));

    // Scenario from the hijack-containment policy: the legitimate client's
    // subsequent attempt with the original fingerprint and secret fails too.
    let retry = h
        .engine
        .refresh(&pair.access_token, &pair.refresh_secret, "1.1.1.1", "agent-A")
        .await;
    assert_matches!(retry, Err(AuthError::Revoked));
}

#[tokio::test]
async fn expired_refresh_secret_fails_and_revokes() {
    // Sessions expire the moment they are issued.
    let h = harness_with_refresh_ttl(chrono::Duration::seconds(-1));
    let pair = h
        .engine
        .issue(Uuid::new_v4(), "1.1.1.1", "agent-A")
        .await
        .unwrap();
    let session_id = h.store.only_session_id();

    let result = h
        .engine
        .refresh(&pair.access_token, &pair.refresh_secret, "1.1.1.1", "agent-A")
        .await;
    assert_matches!(result, Err(AuthError::Expired));
    assert!(h.store.is_revoked(session_id));
}

#[tokio::test]
async fn refresh_accepts_expired_access_token() {
    let store = Arc::new(MemoryStore::default());
    let notifier = Arc::new(RecordingNotifier::default());
    let (notify, _worker) = spawn_notify_worker(
        Arc::clone(&notifier) as Arc<dyn ChangeNotifier>,
        16,
        Duration::from_secs(1),
    );
    // Access tokens are born expired; refresh secrets live a week.
    let engine = SessionEngine::new(
        Arc::clone(&store) as Arc<dyn SessionStore>,
        TokenCodec::new("engine-test-secret-long-enough-for-hmac"),
        SecretHasher::default(),
        notify,
        chrono::Duration::seconds(-300),
        chrono::Duration::days(7),
    );

    let pair = engine.issue(Uuid::new_v4(), "1.1.1.1", "agent-A").await.unwrap();

    // The guard refuses the expired access token...
    let guard = engine.authenticate(&pair.access_token, "agent-A").await;
    assert_matches!(guard, Err(AuthError::Unauthorized(_)));

    // ...but refresh does not care about access-token expiry.
    engine
        .refresh(&pair.access_token, &pair.refresh_secret, "1.1.1.1", "agent-A")
        .await
        .expect("refresh must ignore access-token expiry");
}

#[tokio::test]
async fn address_change_triggers_notification() {
    let h = harness();
    let owner = Uuid::new_v4();
    let pair = h.engine.issue(owner, "1.1.1.1", "agent-A").await.unwrap();

    h.engine
        .refresh(&pair.access_token, &pair.refresh_secret, "2.2.2.2", "agent-A")
        .await
        .expect("refresh from a new address should succeed");

    let (notified_owner, old, new) = wait_for_notification(&h.notifier).await;
    assert_eq!(notified_owner, owner);
    assert_eq!(old, "1.1.1.1");
    assert_eq!(new, "2.2.2.2");
}

#[tokio::test]
async fn same_address_refresh_does_not_notify() {
    let h = harness();
    let pair = h
        .engine
        .issue(Uuid::new_v4(), "1.1.1.1", "agent-A")
        .await
        .unwrap();

    h.engine
        .refresh(&pair.access_token, &pair.refresh_secret, "1.1.1.1", "agent-A")
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(h.notifier.events.lock().unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_refreshes_rotate_at_most_once() {
    let h = harness();
    let pair = h
        .engine
        .issue(Uuid::new_v4(), "1.1.1.1", "agent-A")
        .await
        .unwrap();
    let access = Arc::new(pair.access_token);
    let secret = Arc::new(pair.refresh_secret);

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let engine = Arc::clone(&h.engine);
        let access = Arc::clone(&access);
        let secret = Arc::clone(&secret);
        tasks.push(tokio::spawn(async move {
            engine.refresh(&access, &secret, "1.1.1.1", "agent-A").await
        }));
    }

    let mut successes = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => successes += 1,
            Err(AuthError::Revoked) | Err(AuthError::Unauthorized(_)) => {}
            Err(other) => panic!("unexpected refresh error: {other}"),
        }
    }
    assert_eq!(successes, 1, "exactly one rotation may win");
}

// ---------------------------------------------------------------------------
// Logout / revoke-all / guard interactions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn logout_is_idempotent() {
    let h = harness();
    let pair = h
        .engine
        .issue(Uuid::new_v4(), "1.1.1.1", "agent-A")
        .await
        .unwrap();
    let session_id = h.store.only_session_id();

    h.engine.logout(session_id).await.expect("first logout");
    h.engine.logout(session_id).await.expect("second logout must not error");
    assert!(h.store.is_revoked(session_id));

    let result = h.engine.authenticate(&pair.access_token, "agent-A").await;
    assert_matches!(result, Err(AuthError::Unauthorized(_)));
}

#[tokio::test]
async fn revoke_all_kills_every_owner_session_and_tolerates_zero_matches() {
    let h = harness();
    let owner = Uuid::new_v4();
    let a = h.engine.issue(owner, "1.1.1.1", "agent-A").await.unwrap();
    let b = h.engine.issue(owner, "1.1.1.1", "agent-A").await.unwrap();

    let revoked = h.engine.revoke_all(owner).await.unwrap();
    assert_eq!(revoked, 2);

    // Both access tokens now bounce at the guard.
    for pair in [&a, &b] {
        let result = h.engine.authenticate(&pair.access_token, "agent-A").await;
        assert_matches!(result, Err(AuthError::Unauthorized(_)));
    }

    // Second pass finds nothing active; still not an error.
    assert_eq!(h.engine.revoke_all(owner).await.unwrap(), 0);

    // An owner with no sessions at all is fine too.
    assert_eq!(h.engine.revoke_all(Uuid::new_v4()).await.unwrap(), 0);
}

#[tokio::test]
async fn fingerprint_mismatch_on_authenticate_revokes_the_session() {
    let h = harness();
    let pair = h
        .engine
        .issue(Uuid::new_v4(), "1.1.1.1", "agent-A")
        .await
        .unwrap();
    let session_id = h.store.only_session_id();

    let result = h.engine.authenticate(&pair.access_token, "agent-B").await;
    assert_matches!(result, Err(AuthError::Unauthorized(_)));
    assert!(h.store.is_revoked(session_id), "hijack evidence must revoke");

    // The original client is locked out as well.
    let retry = h.engine.authenticate(&pair.access_token, "agent-A").await;
    assert_matches!(retry, Err(AuthError::Unauthorized(_)));
}
