use std::sync::Arc;

use gatehouse_core::engine::SessionEngine;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable; inner data is behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// The session lifecycle engine.
    pub engine: Arc<SessionEngine>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}
