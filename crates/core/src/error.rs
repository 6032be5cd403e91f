/// Domain error taxonomy for the session lifecycle engine.
///
/// `Revoked` and `Expired` are deliberately distinct from `Unauthorized` so
/// callers can tell "dead session" and "needs re-login" apart from "never
/// valid". `Crypto` and `Store` propagate unchanged with no recovery attempt.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Bad input: {0}")]
    BadInput(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Refresh secret expired")]
    Expired,

    #[error("Session revoked")]
    Revoked,

    #[error("Crypto failure: {0}")]
    Crypto(String),

    #[error("Store failure: {0}")]
    Store(String),
}
