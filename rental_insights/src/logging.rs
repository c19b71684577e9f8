//! Tracing subscriber setup

use std::env;

const CRATES: [&str; 4] = ["rental_insights", "rental_forecast", "listing_prep", "series_math"];

/// Filter directive giving every workspace crate `level`
pub fn default_directive(level: &str) -> String {
    CRATES
        .iter()
        .map(|name| format!("{}={}", name, level))
        .collect::<Vec<_>>()
        .join(",")
}

/// Initialise tracing with `level` as the default filter.
///
/// A non-empty `RUST_LOG` replaces the default. Calling this twice is harmless.
pub fn init_tracing(level: &str, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| default_directive(level));
    let filter = EnvFilter::new(filter_directive);

    if json {
        let _ = fmt().with_env_filter(filter).json().try_init();
    } else {
        let _ = fmt().with_env_filter(filter).try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_covers_every_crate() {
        let directive = default_directive("debug");
        assert!(directive.contains("rental_forecast=debug"));
        assert!(directive.contains("listing_prep=debug"));
        assert_eq!(directive.split(',').count(), 4);
    }
}
