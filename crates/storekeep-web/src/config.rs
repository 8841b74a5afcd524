use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use storekeep_core::LimiterConfig;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Upper bound on handling a single request, answered with 408.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// How long in-flight requests may drain after a shutdown signal.
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub jwt_secret: String,
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_rps")]
    pub requests_per_second: u32,
    /// Bucket capacity; the rate is used when unset.
    #[serde(default)]
    pub burst: Option<u32>,
    /// Key on `X-Forwarded-For` / `X-Real-IP` instead of the peer address.
    #[serde(default)]
    pub trust_forwarded_for: bool,
    #[serde(default = "default_idle_ttl_secs")]
    pub idle_ttl_secs: u64,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}
fn default_max_body_bytes() -> usize { 1024 * 1024 }
fn default_request_timeout_secs() -> u64 { 15 }
fn default_shutdown_timeout_secs() -> u64 { 10 }
fn default_token_ttl_hours() -> u64 { 24 }
fn default_rps() -> u32 { 10 }
fn default_idle_ttl_secs() -> u64 { 600 }
fn default_sweep_interval_secs() -> u64 { 60 }
fn default_log_level() -> String { "info".to_string() }

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_hours: default_token_ttl_hours(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: default_rps(),
            burst: None,
            trust_forwarded_for: false,
            idle_ttl_secs: default_idle_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            auth: AuthConfig::default(),
            rate_limit: RateLimitConfig::default(),
            log: LogConfig::default(),
            max_body_bytes: default_max_body_bytes(),
            request_timeout_secs: default_request_timeout_secs(),
            shutdown_timeout_secs: default_shutdown_timeout_secs(),
        }
    }
}

impl RateLimitConfig {
    pub fn limiter_config(&self) -> LimiterConfig {
        let config = LimiterConfig::per_second(self.requests_per_second);
        match self.burst {
            Some(burst) => config.with_burst(burst),
            None => config,
        }
    }

    pub fn idle_ttl(&self) -> Duration {
        Duration::from_secs(self.idle_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

impl AuthConfig {
    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_hours.saturating_mul(3600))
    }
}

/// One year.
const MAX_TOKEN_TTL_HOURS: u64 = 24 * 365;

const WEAK_SECRETS: &[&str] = &[
    "1",
    "secret",
    "password",
    "jwt-secret",
    "change-me",
    "changeme",
];

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// Reads the TOML file named by `STOREKEEP_CONFIG` (if set) and applies
    /// environment overrides. Does not log: tracing is configured from the
    /// result.
    pub fn from_env() -> anyhow::Result<Self> {
        let config = match std::env::var("STOREKEEP_CONFIG").map(PathBuf::from) {
            Ok(path) => {
                let contents = std::fs::read_to_string(&path)?;
                Self::from_toml(&contents)?
            }
            Err(_) => Self::default(),
        };
        config.with_overrides(|key| std::env::var(key).ok())
    }

    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Applies `STOREKEEP_*` overrides looked up through `var`.
    pub fn with_overrides(
        mut self,
        var: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<Self> {
        if let Some(addr) = var("STOREKEEP_BIND_ADDR") {
            self.bind_addr = addr.parse()?;
        }
        if let Some(secret) = var("STOREKEEP_JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Some(hours) = var("STOREKEEP_TOKEN_TTL_HOURS") {
            self.auth.token_ttl_hours = hours.parse()?;
        }
        if let Some(rps) = var("STOREKEEP_RATE_LIMIT_RPS") {
            self.rate_limit.requests_per_second = rps.parse()?;
        }
        if let Some(trust) = var("STOREKEEP_TRUST_FORWARDED_FOR") {
            self.rate_limit.trust_forwarded_for = matches!(trust.as_str(), "1" | "true" | "yes");
        }
        if let Some(secs) = var("STOREKEEP_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = secs.parse()?;
        }
        if let Some(secs) = var("STOREKEEP_SHUTDOWN_TIMEOUT_SECS") {
            self.shutdown_timeout_secs = secs.parse()?;
        }
        if let Some(level) = var("STOREKEEP_LOG_LEVEL") {
            self.log.level = level;
        }
        if let Some(format) = var("STOREKEEP_LOG_FORMAT") {
            self.log.format = match format.to_ascii_lowercase().as_str() {
                "json" => LogFormat::Json,
                _ => LogFormat::Text,
            };
        }
        Ok(self)
    }

    /// Rejects unusable settings and fills in a random secret when none is
    /// configured. Call after tracing is initialised so warnings are visible.
    pub fn validate(mut self) -> anyhow::Result<Self> {
        if self.rate_limit.requests_per_second == 0 {
            anyhow::bail!("rate_limit.requests_per_second must be at least 1");
        }
        if self.rate_limit.burst == Some(0) {
            anyhow::bail!("rate_limit.burst must be at least 1");
        }
        if self.auth.token_ttl_hours == 0 {
            anyhow::bail!("auth.token_ttl_hours must be at least 1");
        }
        if self.auth.token_ttl_hours > MAX_TOKEN_TTL_HOURS {
            anyhow::bail!("auth.token_ttl_hours must be at most {MAX_TOKEN_TTL_HOURS}");
        }
        if self.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be at least 1");
        }

        if self.auth.jwt_secret.is_empty() {
            self.auth.jwt_secret = uuid::Uuid::new_v4().to_string();
            tracing::warn!(
                "No JWT secret configured. Generated random secret (tokens will not survive a restart)."
            );
        } else if WEAK_SECRETS.contains(&self.auth.jwt_secret.as_str()) {
            anyhow::bail!(
                "JWT secret matches a known weak/placeholder value. \
                 Set a strong random secret via STOREKEEP_JWT_SECRET."
            );
        } else if self.auth.jwt_secret.len() < 32 {
            tracing::warn!(
                "JWT secret is shorter than 32 characters. \
                 Consider using a stronger secret via STOREKEEP_JWT_SECRET."
            );
        }

        Ok(self)
    }
}
