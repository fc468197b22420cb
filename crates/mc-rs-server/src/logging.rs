//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingSection;

/// Filter from `RUST_LOG`, falling back to the configured level.
pub fn env_filter(logging: &LoggingSection) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level))
}

/// Install the global fmt subscriber.
///
/// Returns `false` if a global subscriber was already set.
pub fn init_logging(logging: &LoggingSection) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(logging))
        .with_target(true)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_is_refused() {
        let logging = LoggingSection {
            level: "debug".into(),
        };
        let _ = init_logging(&logging);
        assert!(!init_logging(&logging));
    }
}
