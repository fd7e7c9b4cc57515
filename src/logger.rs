//! Tracing subscriber setup.
//!
//! A bare level such as `"debug"` applies to this crate and to request
//! traces from `tower_http`; everything else stays at `warn` so hyper and
//! rusqlite internals do not drown the output. A full `EnvFilter` directive
//! is used as given.

use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::error::AppError;

/// Install the global subscriber, writing to stderr.
///
/// With `prefer_level` (a `-v` flag, debug mode or `EFFECTIVA_LOG_LEVEL`)
/// `level` wins and `RUST_LOG` is only the fallback when `level` does not
/// parse; otherwise `RUST_LOG` wins and `level` is the fallback.
pub fn init(level: &str, prefer_level: bool) -> Result<(), AppError> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(level, prefer_level, rust_log.as_deref())?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| AppError::Logger(format!("failed to set subscriber: {e}")))
}

fn build_filter(level: &str, prefer_level: bool, rust_log: Option<&str>) -> Result<EnvFilter, AppError> {
    let from_env = || match rust_log {
        Some(directives) => EnvFilter::try_new(directives)
            .map_err(|e| AppError::Logger(format!("RUST_LOG parse failed: {e}"))),
        None => Err(AppError::Logger("RUST_LOG is not set".into())),
    };
    let from_level = || {
        let directive = directive_for(level)?;
        EnvFilter::try_new(&directive)
            .map_err(|e| AppError::Logger(format!("invalid log filter '{directive}': {e}")))
    };

    if prefer_level {
        from_level().or_else(|level_err| {
            from_env().map_err(|env_err| AppError::Logger(format!("{level_err}; {env_err}")))
        })
    } else {
        from_env().or_else(|_| from_level())
    }
}

/// Expand a bare level into a crate-scoped directive.
fn directive_for(level: &str) -> Result<String, AppError> {
    let level = level.trim().to_ascii_lowercase();
    match parse_level(&level) {
        Ok(_) => Ok(format!("warn,effectiva={level},tower_http={level}")),
        Err(_) if level.contains('=') => Ok(level),
        Err(e) => Err(e),
    }
}

/// Parse a level name, rejecting anything that is not one.
pub fn parse_level(level: &str) -> Result<LevelFilter, AppError> {
    if level.is_empty() {
        return Err(AppError::Logger("log level must not be empty".into()));
    }
    level
        .parse::<LevelFilter>()
        .map_err(|_| AppError::Logger(format!("unrecognised log level: '{level}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_levels_parse() {
        for l in &["error", "warn", "info", "debug", "trace", "off"] {
            assert!(parse_level(l).is_ok(), "expected '{l}' to be valid");
        }
    }

    #[test]
    fn invalid_level_errors() {
        assert!(parse_level("verbose").is_err());
        assert!(parse_level("").is_err());
    }

    #[test]
    fn bare_level_is_scoped_to_crate() {
        assert_eq!(
            directive_for(" Debug ").unwrap(),
            "warn,effectiva=debug,tower_http=debug"
        );
    }

    #[test]
    fn full_directive_passes_through() {
        assert_eq!(directive_for("info,rusqlite=trace").unwrap(), "info,rusqlite=trace");
        assert!(directive_for("loud").is_err());
    }

    #[test]
    fn preferred_level_wins_over_rust_log() {
        let filter = build_filter("trace", true, Some("error")).unwrap();
        assert!(filter.to_string().to_lowercase().contains("effectiva=trace"));
    }

    #[test]
    fn invalid_preferred_level_falls_back_to_rust_log() {
        let filter = build_filter("nonsense", true, Some("rusqlite=debug")).unwrap();
        assert!(filter.to_string().to_lowercase().contains("rusqlite=debug"));

        let err = build_filter("nonsense", true, None).unwrap_err();
        assert!(err.to_string().contains("nonsense"));
    }

    #[test]
    fn rust_log_wins_when_level_not_preferred() {
        let filter = build_filter("info", false, Some("warn")).unwrap();
        assert!(!filter.to_string().contains("effectiva"));

        let filter = build_filter("info", false, None).unwrap();
        assert!(filter.to_string().to_lowercase().contains("effectiva=info"));
    }

    #[test]
    fn init_succeeds_or_already_init() {
        // Another test may have installed a subscriber already.
        match init("info", true) {
            Ok(()) => {}
            Err(AppError::Logger(msg)) if msg.contains("set subscriber") => {}
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
}
