//! Handlers for the `/auth` resource (issue, refresh, logout, revoke-all).

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::meta::RequestMeta;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Query parameters for `POST /auth/issue`.
#[derive(Debug, Deserialize)]
pub struct IssueQuery {
    pub user_id: String,
}

/// Request body for `POST /auth/refresh`.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub access_token: String,
    pub refresh_token: String,
}

/// Credential pair returned by issue and refresh.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
}

/// Response body for `GET /auth/me`.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user_id: Uuid,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/auth/issue?user_id=<uuid>
///
/// Issue a fresh credential pair for the given user, binding the new
/// session to this request's device fingerprint and origin address.
pub async fn issue(
    State(state): State<AppState>,
    Query(query): Query<IssueQuery>,
    meta: RequestMeta,
) -> AppResult<Json<TokenResponse>> {
    let user_id = Uuid::parse_str(&query.user_id)
        .map_err(|_| AppError::BadRequest("user_id must be a valid UUID".into()))?;

    let pair = state
        .engine
        .issue(user_id, &meta.origin_address, &meta.device_fingerprint)
        .await?;

    Ok(Json(TokenResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_secret,
    }))
}

/// POST /api/v1/auth/refresh
///
/// Exchange an access/refresh pair for a rotated one. The access token may
/// be expired; the refresh secret is consumed either way.
pub async fn refresh(
    State(state): State<AppState>,
    meta: RequestMeta,
    Json(input): Json<RefreshRequest>,
) -> AppResult<Json<TokenResponse>> {
    if input.access_token.is_empty() || input.refresh_token.is_empty() {
        return Err(AppError::BadRequest(
            "access_token and refresh_token are required".into(),
        ));
    }

    let pair = state
        .engine
        .refresh(
            &input.access_token,
            &input.refresh_token,
            &meta.origin_address,
            &meta.device_fingerprint,
        )
        .await?;

    Ok(Json(TokenResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_secret,
    }))
}

/// GET /api/v1/auth/me
///
/// Return the authenticated caller's user id.
pub async fn me(user: AuthUser) -> Json<MeResponse> {
    Json(MeResponse {
        user_id: user.owner_id,
    })
}

/// POST /api/v1/auth/logout
///
/// Revoke the caller's current session. Returns 204 No Content.
pub async fn logout(State(state): State<AppState>, user: AuthUser) -> AppResult<StatusCode> {
    state.engine.logout(user.session_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/auth/revoke-all
///
/// Revoke every session belonging to the caller (account-wide
/// invalidation, e.g. after a credential compromise). Returns 204.
pub async fn revoke_all(State(state): State<AppState>, user: AuthUser) -> AppResult<StatusCode> {
    state.engine.revoke_all(user.owner_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
