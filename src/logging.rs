use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Environment variable that overrides the configured log filter
pub const LOG_ENV: &str = "AGENDA_LOG";

/// Install the stderr subscriber. `AGENDA_LOG` wins over `level`; an
/// unparsable filter falls back to `warn`.
///
/// Returns false, leaving the existing one in place, when a global
/// subscriber is already installed.
pub fn init(level: &str) -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_keeps_first_subscriber() {
        init("warn");
        assert!(!init("not a [valid filter"));
    }
}
