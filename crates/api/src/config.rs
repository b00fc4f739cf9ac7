use dentora_core::recurrence::DEFAULT_HORIZON_MONTHS;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have sensible defaults suitable for
/// local development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Forward generation window for recurring appointments, in months
    /// (default: `3`).
    pub horizon_months: u32,
    /// Whether the periodic horizon refresh job runs (default: `true`).
    pub horizon_refresh_enabled: bool,
    /// How often the horizon refresh job runs, in seconds (default: `21600`,
    /// i.e. every 6 hours).
    pub horizon_refresh_interval_secs: u64,
    /// JWT token configuration (secret, expiry).
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                         | Default                 |
    /// |---------------------------------|-------------------------|
    /// | `HOST`                          | `0.0.0.0`               |
    /// | `PORT`                          | `3000`                  |
    /// | `CORS_ORIGINS`                  | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`          | `30`                    |
    /// | `GENERATION_HORIZON_MONTHS`     | `3`                     |
    /// | `HORIZON_REFRESH_ENABLED`       | `true`                  |
    /// | `HORIZON_REFRESH_INTERVAL_SECS` | `21600`                 |
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

        let horizon_months: u32 = std::env::var("GENERATION_HORIZON_MONTHS")
            .unwrap_or_else(|_| DEFAULT_HORIZON_MONTHS.to_string())
            .parse()
            .expect("GENERATION_HORIZON_MONTHS must be a valid u32");

        let horizon_refresh_enabled: bool = std::env::var("HORIZON_REFRESH_ENABLED")
            .unwrap_or_else(|_| "true".into())
            .parse()
            .expect("HORIZON_REFRESH_ENABLED must be true or false");

        let horizon_refresh_interval_secs: u64 = std::env::var("HORIZON_REFRESH_INTERVAL_SECS")
            .unwrap_or_else(|_| "21600".into())
            .parse()
            .expect("HORIZON_REFRESH_INTERVAL_SECS must be a valid u64");

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            horizon_months,
            horizon_refresh_enabled,
            horizon_refresh_interval_secs,
            jwt,
        }
    }
}
