use serde::Deserialize;

use quarterdeck_core::config::Config;

/// Admin service configuration loaded from environment variables.
#[derive(Debug, Deserialize)]
pub struct AdminConfig {
    /// PostgreSQL connection URL. Env var: `DATABASE_URL`.
    pub database_url: String,
    /// Redis connection URL. Env var: `REDIS_URL`.
    pub redis_url: String,
    /// TCP port to listen on (default 3100). Env var: `ADMIN_PORT`.
    #[serde(default = "default_admin_port")]
    pub admin_port: u16,
    /// Session lifetime in seconds (default 24h). Env var: `SESSION_TTL_SECS`.
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
}

fn default_admin_port() -> u16 {
    3100
}

fn default_session_ttl_secs() -> u64 {
    86400
}

impl Config for AdminConfig {}
