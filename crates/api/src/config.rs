use crashalert_core::normalize::LocalClock;

use crate::auth::jwt::JwtConfig;

/// Default seconds between simulated detections.
const DEFAULT_SIMULATION_INTERVAL_SECS: u64 = 3;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
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
    /// Upper bound on post-shutdown cleanup, in seconds (default: `30`).
    pub shutdown_timeout_secs: u64,
    /// JWT token configuration (secret, expiry).
    pub jwt: JwtConfig,
    /// Shared secret expected in `X-Internal-Secret` on `/internal` routes.
    /// When unset, every internal request is rejected.
    pub internal_secret: Option<String>,
    /// Offset used to render `display_date` / `display_time` and as the
    /// default filter clock.
    pub display_clock: LocalClock,
    /// Whether to run the detection simulator.
    pub simulate_detections: bool,
    /// Seconds between simulated detections.
    pub simulation_interval_secs: u64,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default                 |
    /// |------------------------------|-------------------------|
    /// | `HOST`                       | `0.0.0.0`               |
    /// | `PORT`                       | `3000`                  |
    /// | `CORS_ORIGINS`               | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`       | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS`      | `30`                    |
    /// | `INTERNAL_SECRET`            | unset                   |
    /// | `DISPLAY_UTC_OFFSET_MINUTES` | `0`                     |
    /// | `SIMULATE_DETECTIONS`        | `false`                 |
    /// | `SIMULATION_INTERVAL_SECS`   | `3`                     |
    ///
    /// JWT settings are read by [`JwtConfig::from_env`].
    ///
    /// # Panics
    ///
    /// Panics on malformed values so misconfiguration fails at startup.
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

        let shutdown_timeout_secs: u64 = std::env::var("SHUTDOWN_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("SHUTDOWN_TIMEOUT_SECS must be a valid u64");

        let internal_secret = std::env::var("INTERNAL_SECRET")
            .ok()
            .filter(|s| !s.is_empty());

        let offset_minutes: i32 = std::env::var("DISPLAY_UTC_OFFSET_MINUTES")
            .unwrap_or_else(|_| "0".into())
            .parse()
            .expect("DISPLAY_UTC_OFFSET_MINUTES must be a valid i32");
        let display_clock = LocalClock::from_offset_minutes(offset_minutes)
            .expect("DISPLAY_UTC_OFFSET_MINUTES must be within +/-1080");

        let simulate_detections = std::env::var("SIMULATE_DETECTIONS")
            .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let simulation_interval_secs: u64 = std::env::var("SIMULATION_INTERVAL_SECS")
            .unwrap_or_else(|_| DEFAULT_SIMULATION_INTERVAL_SECS.to_string())
            .parse()
            .expect("SIMULATION_INTERVAL_SECS must be a valid u64");
        assert!(
            simulation_interval_secs > 0,
            "SIMULATION_INTERVAL_SECS must be positive"
        );

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            shutdown_timeout_secs,
            jwt,
            internal_secret,
            display_clock,
            simulate_detections,
            simulation_interval_secs,
        }
    }
}
