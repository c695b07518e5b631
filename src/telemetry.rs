//! Telemetry and observability setup
//!
//! Configures structured logging with tracing and tracing-subscriber.

use std::sync::Once;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

static INIT: Once = Once::new();

/// Build the default filter directive for a log level
fn default_directive(level: &str) -> String {
    format!("ollama_relay={},tower_http=debug", level)
}

/// Initialize tracing subscriber for structured logging
///
/// Only the first call per process installs a subscriber; later calls are
/// ignored. `RUST_LOG` wins over `default_level` when set.
///
/// # Examples
///
/// ```no_run
/// ollama_relay::telemetry::init("info");
/// tracing::info!("Relay started");
/// ```
pub fn init(default_level: &str) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directive(default_level)));

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive_parses() {
        let directive = default_directive("debug");
        assert_eq!(directive, "ollama_relay=debug,tower_http=debug");
        assert!(EnvFilter::try_new(directive).is_ok());
    }
}
