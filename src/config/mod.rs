use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

const DEFAULT_SUBMISSION_DELAY_MS: u64 = 2000;
const DEFAULT_SESSION_IDLE_SECS: u64 = 30 * 60;
const DEFAULT_SESSION_CAPACITY: usize = 10_000;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub submission: SubmissionConfig,
    pub sessions: SessionConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let delay_ms = match env::var("APP_SUBMISSION_DELAY_MS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidSubmissionDelay)?,
            Err(_) => DEFAULT_SUBMISSION_DELAY_MS,
        };
        let endpoint = env::var("APP_SUBMISSION_URL")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());

        let idle_secs = match env::var("APP_SESSION_IDLE_SECS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or(ConfigError::InvalidSessionIdle)?,
            Err(_) => DEFAULT_SESSION_IDLE_SECS,
        };
        let capacity = match env::var("APP_SESSION_CAPACITY") {
            Ok(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|capacity| *capacity > 0)
                .ok_or(ConfigError::InvalidSessionCapacity)?,
            Err(_) => DEFAULT_SESSION_CAPACITY,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            submission: SubmissionConfig {
                delay: Duration::from_millis(delay_ms),
                endpoint,
            },
            sessions: SessionConfig {
                idle_timeout: Duration::from_secs(idle_secs),
                capacity,
            },
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Where completed applications are delivered.
///
/// Without an endpoint the service falls back to the simulated sink, which waits `delay`
/// and then reports success.
#[derive(Debug, Clone)]
pub struct SubmissionConfig {
    pub delay: Duration,
    pub endpoint: Option<String>,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(DEFAULT_SUBMISSION_DELAY_MS),
            endpoint: None,
        }
    }
}

/// Bounds on the in-memory form session registry.
///
/// Sessions untouched for `idle_timeout` are retired; `capacity` caps live sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub idle_timeout: Duration,
    pub capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(DEFAULT_SESSION_IDLE_SECS),
            capacity: DEFAULT_SESSION_CAPACITY,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidSubmissionDelay,
    InvalidSessionIdle,
    InvalidSessionCapacity,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidSubmissionDelay => {
                write!(f, "APP_SUBMISSION_DELAY_MS must be a whole number of milliseconds")
            }
            ConfigError::InvalidSessionIdle => {
                write!(f, "APP_SESSION_IDLE_SECS must be a positive number of seconds")
            }
            ConfigError::InvalidSessionCapacity => {
                write!(f, "APP_SESSION_CAPACITY must be a positive whole number")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort
            | ConfigError::InvalidSubmissionDelay
            | ConfigError::InvalidSessionIdle
            | ConfigError::InvalidSessionCapacity => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
