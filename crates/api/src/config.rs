use serde::Deserialize;
use shared::resilience::{BreakerSettings, Resilience, RetryPolicy};
use std::net::SocketAddr;
use std::time::Duration;

/// Which binary is loading configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    Location,
    History,
}

impl Service {
    /// Base name of the service's config files under `config/`.
    pub fn file_stem(self) -> &'static str {
        match self {
            Service::Location => "location",
            Service::History => "history",
        }
    }

    /// Prefix of the environment variables overriding file values.
    pub fn env_prefix(self) -> &'static str {
        match self {
            Service::Location => "GT_LOCATION",
            Service::History => "GT_HISTORY",
        }
    }

    /// Name of the breaker guarding calls to the other service.
    pub fn remote_name(self) -> &'static str {
        match self {
            Service::Location => "history",
            Service::History => "location",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    /// Client settings for the other service.
    pub remote: RemoteConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    pub public_port: u16,

    pub internal_port: u16,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the other service's internal listener.
    pub base_url: String,

    /// Per-request timeout in milliseconds
    #[serde(default = "default_remote_timeout_ms")]
    pub timeout_ms: u64,

    /// Total attempts per call, including the first
    #[serde(default = "default_retries")]
    pub retries: u32,

    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Consecutive failures before the circuit breaker opens
    #[serde(default = "default_breaker_failure_threshold")]
    pub breaker_failure_threshold: u32,

    /// Seconds to keep the circuit breaker open before probing
    #[serde(default = "default_breaker_reset_secs")]
    pub breaker_reset_secs: u64,

    #[serde(default = "default_breaker_half_open_requests")]
    pub breaker_half_open_requests: u32,

    /// Period for clearing closed-state counts, 0 keeps them until a state change
    #[serde(default)]
    pub breaker_interval_secs: u64,
}

impl DatabaseConfig {
    pub fn to_pool_config(&self) -> persistence::db::DatabaseConfig {
        persistence::db::DatabaseConfig {
            url: self.url.clone(),
            max_connections: self.max_connections,
            min_connections: self.min_connections,
            connect_timeout_secs: self.connect_timeout_secs,
            idle_timeout_secs: self.idle_timeout_secs,
        }
    }
}

impl RemoteConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Retry and circuit breaker settings for calls to the named service.
    pub fn resilience(&self, name: &str) -> Resilience {
        let interval = if self.breaker_interval_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.breaker_interval_secs))
        };

        Resilience::new(
            BreakerSettings {
                name: name.to_string(),
                failure_threshold: self.breaker_failure_threshold,
                reset_timeout: Duration::from_secs(self.breaker_reset_secs),
                half_open_max_requests: self.breaker_half_open_requests,
                interval,
            },
            RetryPolicy {
                attempts: self.retries,
                delay: Duration::from_millis(self.retry_delay_ms),
            },
        )
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_request_timeout() -> u64 {
    30
}
fn default_max_connections() -> u32 {
    20
}
fn default_min_connections() -> u32 {
    5
}
fn default_connect_timeout() -> u64 {
    10
}
fn default_idle_timeout() -> u64 {
    600
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "json".to_string()
}
fn default_remote_timeout_ms() -> u64 {
    5000
}
fn default_retries() -> u32 {
    3
}
fn default_retry_delay_ms() -> u64 {
    1000
}
fn default_breaker_failure_threshold() -> u32 {
    5
}
fn default_breaker_reset_secs() -> u64 {
    60
}
fn default_breaker_half_open_requests() -> u32 {
    1
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/<service>.toml - base configuration with defaults
    /// 2. config/<service>.local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with GT_LOCATION__ or GT_HISTORY__ prefix
    pub fn load(service: Service) -> Result<Self, config::ConfigError> {
        let stem = service.file_stem();
        let config = config::Config::builder()
            .add_source(config::File::with_name(&format!("config/{}", stem)))
            .add_source(config::File::with_name(&format!("config/{}.local", stem)).required(false))
            .add_source(config::Environment::with_prefix(service.env_prefix()).separator("__"))
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate(service)
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Load configuration for testing with custom overrides.
    ///
    /// Builds from embedded defaults so tests do not depend on the working directory.
    #[cfg(test)]
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let defaults = r#"
            [server]
            host = "0.0.0.0"
            public_port = 8080
            internal_port = 8081
            request_timeout_secs = 30

            [database]
            url = ""
            max_connections = 20
            min_connections = 5
            connect_timeout_secs = 10
            idle_timeout_secs = 600

            [logging]
            level = "info"
            format = "json"

            [remote]
            base_url = "http://127.0.0.1:9081"
            timeout_ms = 5000
            retries = 3
            retry_delay_ms = 1000
            breaker_failure_threshold = 5
            breaker_reset_secs = 60
            breaker_half_open_requests = 1
            breaker_interval_secs = 0
        "#;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(defaults, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        let cfg: Self = builder.build()?.try_deserialize()?;
        // Skip validation in tests to allow partial configs
        Ok(cfg)
    }

    /// Validate configuration values.
    fn validate(&self, service: Service) -> Result<(), ConfigValidationError> {
        if self.database.url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(format!(
                "{}__DATABASE__URL environment variable must be set",
                service.env_prefix()
            )));
        }

        if self.remote.base_url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(format!(
                "{}__REMOTE__BASE_URL environment variable must be set",
                service.env_prefix()
            )));
        }

        if self.server.public_port == 0 || self.server.internal_port == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "Server ports cannot be 0".to_string(),
            ));
        }

        if self.server.public_port == self.server.internal_port {
            return Err(ConfigValidationError::InvalidValue(
                "public_port and internal_port must differ".to_string(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigValidationError::InvalidValue(
                "min_connections cannot exceed max_connections".to_string(),
            ));
        }

        if self.remote.retries == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "remote.retries must be at least 1".to_string(),
            ));
        }

        if self.remote.breaker_failure_threshold == 0 {
            return Err(ConfigValidationError::InvalidValue(
                "remote.breaker_failure_threshold must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    pub fn public_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.server.host, self.server.public_port).parse()
    }

    pub fn internal_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.server.host, self.server.internal_port).parse()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }
}
