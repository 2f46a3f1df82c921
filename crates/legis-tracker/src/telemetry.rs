use crate::config::TelemetryConfig;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

/// HTTP stack crates that log every connection at debug level.
const QUIET_DEPENDENCIES: [&str; 3] = ["hyper", "reqwest", "rustls"];

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("invalid log level/filter '{value}': unable to build EnvFilter")]
    EnvFilter {
        value: String,
        #[source]
        source: ParseError,
    },
    #[error("telemetry error: {0}")]
    Subscriber(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Installs the global subscriber.
///
/// A valid `RUST_LOG` is used verbatim. Otherwise the configured level applies
/// with the HTTP client crates held at `warn`.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let filter = resolve_filter(std::env::var("RUST_LOG").ok(), &config.log_level)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::Subscriber)
}

fn resolve_filter(env_override: Option<String>, level: &str) -> Result<EnvFilter, TelemetryError> {
    if let Some(filter) = env_override.and_then(|value| EnvFilter::try_new(value).ok()) {
        return Ok(filter);
    }

    let directives = configured_directives(level);
    EnvFilter::try_new(&directives).map_err(|source| TelemetryError::EnvFilter {
        value: level.to_string(),
        source,
    })
}

/// Appends `crate=warn` for each noisy dependency the configured level does not
/// already mention.
fn configured_directives(level: &str) -> String {
    let level = level.trim();
    QUIET_DEPENDENCIES
        .iter()
        .filter(|name| !level.contains(*name))
        .fold(level.to_string(), |mut directives, name| {
            directives.push_str(&format!(",{name}=warn"));
            directives
        })
}
