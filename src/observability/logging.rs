//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once, at process start
//! - Pick the filter: `RUST_LOG`, then configured directive, then verbosity
//!
//! # Design Decisions
//! - Logs go to stderr so stdout stays free for received uploads

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::schema::ObservabilityConfig;

const QUIET_FILTER: &str = "offer=warn";
const VERBOSE_FILTER: &str = "offer=debug,tower_http=debug";

/// Filter directive used when `RUST_LOG` is not set.
pub fn default_filter(config: &ObservabilityConfig) -> String {
    match &config.log_filter {
        Some(filter) => filter.clone(),
        None if config.verbose => VERBOSE_FILTER.to_string(),
        None => QUIET_FILTER.to_string(),
    }
}

/// Install the global subscriber.
pub fn init_logging(config: &ObservabilityConfig) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(config).into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_precedence() {
        let mut config = ObservabilityConfig::default();
        assert_eq!(default_filter(&config), QUIET_FILTER);

        config.verbose = true;
        assert_eq!(default_filter(&config), VERBOSE_FILTER);

        config.log_filter = Some("offer=trace".into());
        assert_eq!(default_filter(&config), "offer=trace");
    }
}
