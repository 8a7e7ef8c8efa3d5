//! Tracing subscriber setup.

use anyhow::Result;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the filter from `level` (see `Config::log_level`), with HTTP
/// internals held at `warn`. An unparsable level falls back to `info`.
pub fn filter(level: &str) -> EnvFilter {
    let mut filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    for directive in ["hyper=warn", "reqwest=warn"] {
        if let Ok(directive) = directive.parse::<Directive>() {
            filter = filter.add_directive(directive);
        }
    }
    filter
}

/// Install the global subscriber. Calling it again is a no-op.
///
/// # Errors
///
/// Returns an error if a different global subscriber is already installed.
pub fn init(level: &str) -> Result<()> {
    static INIT: std::sync::Once = std::sync::Once::new();
    let mut result = Ok(());
    INIT.call_once(|| {
        result = tracing_subscriber::registry()
            .with(filter(level))
            .with(fmt::layer().with_target(true))
            .try_init()
            .map_err(anyhow::Error::from);
    });
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_uses_the_given_level() {
        let rendered = filter("debug").to_string();
        assert!(rendered.contains("debug"), "{rendered}");
        assert!(rendered.contains("hyper=warn"), "{rendered}");
        assert!(rendered.contains("reqwest=warn"), "{rendered}");
    }

    #[test]
    fn unparsable_level_falls_back_to_info() {
        let rendered = filter("calorie_ledger=loud").to_string();
        assert!(rendered.contains("info"), "{rendered}");
    }
}
