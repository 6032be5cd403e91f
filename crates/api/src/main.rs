use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gatehouse_api::config::ServerConfig;
use gatehouse_api::notifier::{NullNotifier, WebhookNotifier};
use gatehouse_api::router::build_app_router;
use gatehouse_api::state::AppState;
use gatehouse_core::engine::SessionEngine;
use gatehouse_core::notify::spawn_notify_worker;
use gatehouse_core::secret::SecretHasher;
use gatehouse_core::store::{ChangeNotifier, SessionStore};
use gatehouse_core::token::TokenCodec;
use gatehouse_db::PgSessionStore;

/// Capacity of the address-change notification queue.
const NOTIFY_QUEUE_CAPACITY: usize = 256;

/// Per-delivery timeout for address-change notifications.
const NOTIFY_DELIVERY_TIMEOUT: Duration = Duration::from_secs(15);

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gatehouse_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = gatehouse_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    gatehouse_db::health_check(&pool)
        .await
        .expect("Database health check failed");

    gatehouse_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Change notifier + background delivery worker ---
    let notifier: Arc<dyn ChangeNotifier> = if config.tokens.webhook_url.is_empty() {
        tracing::warn!("WEBHOOK_URL not set, address-change alerts will only be logged");
        Arc::new(NullNotifier)
    } else {
        Arc::new(WebhookNotifier::new(&config.tokens.webhook_url))
    };
    let (notify_handle, _notify_worker) =
        spawn_notify_worker(notifier, NOTIFY_QUEUE_CAPACITY, NOTIFY_DELIVERY_TIMEOUT);

    // --- Session engine ---
    let store: Arc<dyn SessionStore> = Arc::new(PgSessionStore::new(pool));
    let engine = SessionEngine::new(
        store,
        TokenCodec::new(&config.tokens.jwt_secret),
        SecretHasher::default(),
        notify_handle,
        config.tokens.access_ttl(),
        config.tokens.refresh_ttl(),
    );

    // --- App state + router ---
    let state = AppState {
        engine: Arc::new(engine),
        config: Arc::new(config.clone()),
    };
    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("Invalid HOST/PORT combination");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    tracing::info!(%addr, "Server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Server error");
}
