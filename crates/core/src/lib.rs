//! Gatehouse core: the session/token lifecycle engine.
//!
//! Pure domain logic with no transport or SQL. The engine is constructed
//! with abstract collaborators (a [`store::SessionStore`] for persistence
//! and a [`store::ChangeNotifier`] for out-of-band alerting) so the HTTP
//! layer and tests can supply their own implementations.

pub mod engine;
pub mod error;
pub mod notify;
pub mod secret;
pub mod session;
pub mod store;
pub mod token;
pub mod types;
