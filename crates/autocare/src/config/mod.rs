use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

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
    pub limits: LimitsConfig,
    pub notifications: NotificationConfig,
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
        let log_format = LogFormat::from_str(
            &env::var("APP_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string()),
        );

        let limits = LimitsConfig {
            rate_limit_max: env_number("APP_RATE_LIMIT_MAX", 30)?,
            rate_limit_window: Duration::from_secs(env_number("APP_RATE_LIMIT_WINDOW_SECS", 60)?),
            fs_throttle_max: env_number("APP_FS_THROTTLE_MAX", 30)?,
            fs_throttle_window: Duration::from_secs(env_number(
                "APP_FS_THROTTLE_WINDOW_SECS",
                60,
            )?),
            fs_throttle_concurrency: env_number("APP_FS_THROTTLE_CONCURRENCY", 5)?,
        };

        let notifications = NotificationConfig {
            stale_after_days: env_number("APP_NOTIFICATION_STALE_DAYS", 15)?,
            maintenance_interval: Duration::from_secs(env_number(
                "APP_MAINTENANCE_INTERVAL_SECS",
                3600,
            )?),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                log_format,
            },
            limits,
            notifications,
        })
    }
}

fn env_number<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { key }),
        Err(_) => Ok(default),
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
    pub log_format: LogFormat,
}

/// Line layout for emitted log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Full,
}

impl LogFormat {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "full" | "pretty" | "verbose" => Self::Full,
            _ => Self::Compact,
        }
    }
}

/// Request rate limiting and file-operation throttling ceilings.
#[derive(Debug, Clone)]
pub struct LimitsConfig {
    pub rate_limit_max: u32,
    pub rate_limit_window: Duration,
    pub fs_throttle_max: u32,
    pub fs_throttle_window: Duration,
    pub fs_throttle_concurrency: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            rate_limit_max: 30,
            rate_limit_window: Duration::from_secs(60),
            fs_throttle_max: 30,
            fs_throttle_window: Duration::from_secs(60),
            fs_throttle_concurrency: 5,
        }
    }
}

/// Periodic notification housekeeping.
#[derive(Debug, Clone)]
pub struct NotificationConfig {
    pub stale_after_days: i64,
    pub maintenance_interval: Duration,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            stale_after_days: 15,
            maintenance_interval: Duration::from_secs(3600),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { key: &'static str },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { key } => {
                write!(f, "{key} must be a non-negative number")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidNumber { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
