use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;

use crate::marketplace::reviews::DEFAULT_MIN_COMMENT_CHARS;
use crate::marketplace::search::SearchDefaults;

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
    pub marketplace: MarketplaceConfig,
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

        let defaults = MarketplaceConfig::default();
        let marketplace = MarketplaceConfig {
            review_min_comment_chars: env_number(
                "MARKETPLACE_REVIEW_MIN_CHARS",
                defaults.review_min_comment_chars,
            )?,
            review_max_comment_chars: env_number(
                "MARKETPLACE_REVIEW_MAX_CHARS",
                defaults.review_max_comment_chars,
            )?,
            search: SearchDefaults {
                price_ceiling: env_number(
                    "MARKETPLACE_PRICE_CEILING",
                    defaults.search.price_ceiling,
                )?,
                max_distance_km: env_number(
                    "MARKETPLACE_MAX_DISTANCE_KM",
                    defaults.search.max_distance_km,
                )?,
            },
        };

        if marketplace.review_max_comment_chars < marketplace.review_min_comment_chars {
            return Err(ConfigError::InvalidCommentBounds {
                min: marketplace.review_min_comment_chars,
                max: marketplace.review_max_comment_chars,
            });
        }

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            marketplace,
        })
    }
}

fn env_number<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { name, value: raw }),
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

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Business dials for search defaults and review text bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketplaceConfig {
    pub review_min_comment_chars: usize,
    pub review_max_comment_chars: usize,
    pub search: SearchDefaults,
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self {
            review_min_comment_chars: DEFAULT_MIN_COMMENT_CHARS,
            review_max_comment_chars: 500,
            search: SearchDefaults::default(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { name: &'static str, value: String },
    InvalidCommentBounds { min: usize, max: usize },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { name, value } => {
                write!(f, "{name} must be a number (found '{value}')")
            }
            ConfigError::InvalidCommentBounds { min, max } => write!(
                f,
                "review comment maximum ({max}) is below the minimum ({min})"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::InvalidCommentBounds { .. } => None,
        }
    }
}
