//! Tracing subscriber setup
//!
//! Logs go to stderr. `RUST_LOG` still applies on top of the configured
//! level for this crate.

use tracing_subscriber::filter::{Directive, LevelFilter};
use tracing_subscriber::EnvFilter;

/// Build the filter: `RUST_LOG` directives plus `fontwarden=<level>`.
pub fn env_filter(level: &str) -> EnvFilter {
    let directive = format!("fontwarden={}", level)
        .parse::<Directive>()
        .unwrap_or_else(|_| Directive::from(LevelFilter::INFO));
    EnvFilter::from_default_env().add_directive(directive)
}

/// Install the global subscriber.
///
/// This may fail if a subscriber is already installed, which is fine.
pub fn init(level: &str, json: bool) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter(level))
        .with_writer(std::io::stderr);

    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_mentions_crate_level() {
        let filter = env_filter("debug");
        assert!(filter.to_string().contains("fontwarden=debug"));
    }

    #[test]
    fn test_bad_level_falls_back() {
        let filter = env_filter("not a level!");
        assert!(!filter.to_string().contains("not a level"));
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init("info", false);
        init("debug", true);
    }
}
