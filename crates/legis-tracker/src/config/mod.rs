use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_FEED_URL: &str = "https://www.parl.ca/legisinfo/en/bills/json";

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

/// Top-level configuration for the tracker daemon.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub feed: FeedConfig,
    pub tracker: TrackerConfig,
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

        let feed = FeedConfig {
            url: env::var("LEGIS_FEED_URL").unwrap_or_else(|_| DEFAULT_FEED_URL.to_string()),
            request_timeout: Duration::from_secs(numeric_var("LEGIS_REQUEST_TIMEOUT_SECS", 30)?),
        };

        let poll_interval = Duration::from_secs(numeric_var("LEGIS_POLL_INTERVAL_SECS", 4 * 3600)?);
        let retry_delay = Duration::from_secs(numeric_var("LEGIS_RETRY_DELAY_SECS", 300)?);
        if retry_delay >= poll_interval {
            return Err(ConfigError::RetryDelayTooLong {
                retry_delay,
                poll_interval,
            });
        }

        let first_parliament = numeric_var("LEGIS_HISTORY_FIRST_PARLIAMENT", 35)?;
        let last_parliament = numeric_var("LEGIS_HISTORY_LAST_PARLIAMENT", 44)?;
        if first_parliament > last_parliament {
            return Err(ConfigError::InvalidParliamentRange {
                first: first_parliament,
                last: last_parliament,
            });
        }

        let history = HistoryConfig {
            parliaments: first_parliament..=last_parliament,
            max_sessions: numeric_var("LEGIS_HISTORY_MAX_SESSIONS", 4)?,
            request_delay: Duration::from_millis(numeric_var("LEGIS_HISTORY_DELAY_MS", 1000)?),
        };

        let tracker = TrackerConfig {
            db_path: env::var("LEGIS_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("assets/bills_db.json")),
            poll_interval,
            retry_delay,
            history,
            enacted_text_dir: env::var("LEGIS_ENACTED_TEXT_DIR")
                .ok()
                .filter(|value| !value.trim().is_empty())
                .map(PathBuf::from),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            feed,
            tracker,
        })
    }
}

fn numeric_var<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { name, value: raw }),
        Err(_) => Ok(default),
    }
}

/// Settings controlling the status HTTP server binding.
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

/// Where and how the bill listing is fetched.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    pub url: String,
    pub request_timeout: Duration,
}

/// Poll loop, storage and historical backfill settings.
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub db_path: PathBuf,
    pub poll_interval: Duration,
    pub retry_delay: Duration,
    pub history: HistoryConfig,
    pub enacted_text_dir: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct HistoryConfig {
    pub parliaments: RangeInclusive<u32>,
    pub max_sessions: u32,
    pub request_delay: Duration,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            parliaments: 35..=44,
            max_sessions: 4,
            request_delay: Duration::from_secs(1),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost {
        source: std::net::AddrParseError,
    },
    InvalidNumber {
        name: &'static str,
        value: String,
    },
    InvalidParliamentRange {
        first: u32,
        last: u32,
    },
    RetryDelayTooLong {
        retry_delay: Duration,
        poll_interval: Duration,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { name, value } => {
                write!(f, "{name} must be a non-negative integer, got '{value}'")
            }
            ConfigError::InvalidParliamentRange { first, last } => write!(
                f,
                "historical parliament range is inverted ({first} > {last})"
            ),
            ConfigError::RetryDelayTooLong {
                retry_delay,
                poll_interval,
            } => write!(
                f,
                "retry delay ({}s) must be shorter than the poll interval ({}s)",
                retry_delay.as_secs(),
                poll_interval.as_secs()
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}
