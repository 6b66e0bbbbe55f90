use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_AUTH_COOKIE: &str = "l360_access_token";
pub const DEFAULT_REFRESH_COOKIE: &str = "l360_refresh_token";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Whether the process talks to a live backend or serves synthetic data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeMode {
    #[default]
    Development,
    Production,
}

impl RuntimeMode {
    /// Only the literal `production` (any case) selects production.
    pub fn from_env_value(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("production") {
            RuntimeMode::Production
        } else {
            RuntimeMode::Development
        }
    }

    pub fn is_development(self) -> bool {
        self == RuntimeMode::Development
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatsConfig {
    pub api_url: String,
    pub mode: RuntimeMode,
    pub request_timeout_secs: u64,
    pub auth_cookie: String,
    pub refresh_cookie: String,
    pub bind_addr: SocketAddr,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            mode: RuntimeMode::Development,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            auth_cookie: DEFAULT_AUTH_COOKIE.to_string(),
            refresh_cookie: DEFAULT_REFRESH_COOKIE.to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
        }
    }
}

impl StatsConfig {
    /// Build the configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`StatsConfig::from_env`] but with an injectable lookup, so
    /// tests don't have to mutate the process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("API_URL").filter(|v| !v.trim().is_empty()) {
            config.api_url = url.trim().trim_end_matches('/').to_string();
        }

        if let Some(mode) = lookup("L360_ENV").or_else(|| lookup("NODE_ENV")) {
            config.mode = RuntimeMode::from_env_value(&mode);
        }

        if let Some(raw) = lookup("L360_STATS_TIMEOUT_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.request_timeout_secs = secs,
                _ => warn!(value = %raw, "ignoring invalid L360_STATS_TIMEOUT_SECS"),
            }
        }

        if let Some(name) = lookup("L360_AUTH_COOKIE").filter(|v| !v.trim().is_empty()) {
            config.auth_cookie = name.trim().to_string();
        }

        if let Some(name) = lookup("L360_REFRESH_COOKIE").filter(|v| !v.trim().is_empty()) {
            config.refresh_cookie = name.trim().to_string();
        }

        if let Some(raw) = lookup("L360_BIND") {
            match raw.trim().parse::<SocketAddr>() {
                Ok(addr) => config.bind_addr = addr,
                Err(e) => warn!(value = %raw, error = %e, "ignoring invalid L360_BIND"),
            }
        }

        config
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Base path every stats endpoint hangs off.
    pub fn stats_base(&self) -> String {
        format!("{}/api/stats", self.api_url.trim_end_matches('/'))
    }
}
