pub mod health;

use axum::routing::{get, post};
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /auth/issue          issue credentials (public)
/// /auth/refresh        rotate credentials (public)
/// /auth/me             current user id (requires auth)
/// /auth/logout         revoke current session (requires auth)
/// /auth/revoke-all     revoke all owner sessions (requires auth)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/issue", post(handlers::auth::issue))
        .route("/auth/refresh", post(handlers::auth::refresh))
        .route("/auth/me", get(handlers::auth::me))
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/auth/revoke-all", post(handlers::auth::revoke_all))
}
