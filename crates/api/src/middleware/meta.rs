//! Extraction of client-declared request metadata.
//!
//! The engine treats fingerprints and addresses as opaque strings; this
//! extractor is the only place they are pulled out of the request.

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use std::net::SocketAddr;

use crate::error::AppError;
use crate::state::AppState;

/// Device fingerprint and origin address for the current request.
///
/// The fingerprint is the `User-Agent` header and is required -- a client
/// that declares no agent string cannot be bound to a session. The address
/// is the first `X-Forwarded-For` entry when present (deployments behind a
/// proxy), otherwise the socket peer address.
#[derive(Debug, Clone)]
pub struct RequestMeta {
    pub device_fingerprint: String,
    pub origin_address: String,
}

impl FromRequestParts<AppState> for RequestMeta {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let device_fingerprint = parts
            .headers
            .get("user-agent")
            .and_then(|v| v.to_str().ok())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .ok_or_else(|| AppError::BadRequest("User-Agent header is required".into()))?;

        let forwarded = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let origin_address = match forwarded {
            Some(addr) => addr,
            None => parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ci| ci.0.ip().to_string())
                .unwrap_or_else(|| "unknown".to_string()),
        };

        Ok(RequestMeta {
            device_fingerprint,
            origin_address,
        })
    }
}
