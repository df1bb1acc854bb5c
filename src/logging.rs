//! Tracing setup for the binary
//!
//! `RUST_LOG` wins when set; otherwise the configured level is used. Logs go
//! to stderr so stdout stays free for reports and notices. Colour is only
//! used when stderr is a terminal.

use std::io::IsTerminal;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Filter used when both `RUST_LOG` and the configured level are unusable
pub const FALLBACK_FILTER: &str = "info";

/// Build the filter: `RUST_LOG` first, then `level`.
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new(FALLBACK_FILTER))
}

/// Install the global subscriber. A second call is a no-op.
pub fn init_tracing(level: &str) {
    let _ = tracing_subscriber::registry()
        .with(env_filter(level))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(std::io::stderr().is_terminal())
                .with_writer(std::io::stderr),
        )
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_is_harmless() {
        init_tracing("debug");
        init_tracing("warn");
        tracing::debug!("still alive");
    }

    #[test]
    fn test_env_filter_accepts_directives() {
        // Only meaningful without RUST_LOG in the test environment
        if std::env::var_os("RUST_LOG").is_none() {
            let filter = env_filter("oclp_cli=trace,warn");
            assert!(filter.to_string().contains("oclp_cli=trace"));
        }
    }
}
