//! Server configuration loaded from environment variables.

/// Token-related configuration: signing key, lifetimes, webhook target.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// HMAC secret used to sign and verify access tokens.
    pub jwt_secret: String,
    /// Access token lifetime in seconds (default: 900).
    pub access_ttl_secs: i64,
    /// Refresh secret lifetime in days (default: 7).
    pub refresh_ttl_days: i64,
    /// Webhook URL for address-change notifications. Empty disables them.
    pub webhook_url: String,
}

impl TokenConfig {
    /// Load token configuration from environment variables.
    ///
    /// | Env Var               | Required | Default |
    /// |-----------------------|----------|---------|
    /// | `JWT_SECRET`          | **yes**  | --      |
    /// | `ACCESS_TTL_SECS`     | no       | `900`   |
    /// | `REFRESH_TTL_DAYS`    | no       | `7`     |
    /// | `WEBHOOK_URL`         | no       | `""`    |
    ///
    /// # Panics
    ///
    /// Panics if `JWT_SECRET` is not set or is empty.
    pub fn from_env() -> Self {
        let jwt_secret =
            std::env::var("JWT_SECRET").expect("JWT_SECRET must be set in the environment");
        assert!(!jwt_secret.is_empty(), "JWT_SECRET must not be empty");

        let access_ttl_secs: i64 = std::env::var("ACCESS_TTL_SECS")
            .unwrap_or_else(|_| "900".into())
            .parse()
            .expect("ACCESS_TTL_SECS must be a valid i64");

        let refresh_ttl_days: i64 = std::env::var("REFRESH_TTL_DAYS")
            .unwrap_or_else(|_| "7".into())
            .parse()
            .expect("REFRESH_TTL_DAYS must be a valid i64");

        let webhook_url = std::env::var("WEBHOOK_URL").unwrap_or_default();

        Self {
            jwt_secret,
            access_ttl_secs,
            refresh_ttl_days,
            webhook_url,
        }
    }

    pub fn access_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.access_ttl_secs)
    }

    pub fn refresh_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.refresh_ttl_days)
    }
}

/// Top-level server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Token configuration (secret, TTLs, webhook).
    pub tokens: TokenConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            tokens: TokenConfig::from_env(),
        }
    }
}
