//! Bearer-token authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use gatehouse_core::error::AuthError;
use gatehouse_core::types::{SessionId, UserId};

use crate::error::AppError;
use crate::middleware::meta::RequestMeta;
use crate::state::AppState;

/// Authenticated caller extracted from a Bearer token in the
/// `Authorization` header, validated against its session by the engine.
///
/// Use this as an extractor parameter in any handler that requires
/// authentication:
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(owner_id = %user.owner_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
///
/// Note that extraction is not always side-effect-free: a device
/// fingerprint that differs from the session's stored one revokes the
/// session before the request is rejected.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser {
    pub owner_id: UserId,
    pub session_id: SessionId,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        // RequestMeta needs `parts` mutably, so extract it before borrowing
        // the Authorization header.
        let meta = RequestMeta::from_request_parts(parts, state).await?;

        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Auth(AuthError::Unauthorized("Missing Authorization header".into()))
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Auth(AuthError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        })?;

        let identity = state
            .engine
            .authenticate(token, &meta.device_fingerprint)
            .await?;

        Ok(AuthUser {
            owner_id: identity.owner_id,
            session_id: identity.session_id,
        })
    }
}
