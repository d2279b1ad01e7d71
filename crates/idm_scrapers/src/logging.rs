use std::sync::Once;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

fn default_level(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Install the global fmt subscriber. `RUST_LOG` wins over `verbosity`.
/// Later calls, or calls after another subscriber was set, do nothing.
pub fn init_logging(verbosity: u8) {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_level(verbosity)));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_level() {
        assert_eq!(default_level(0), "info");
        assert_eq!(default_level(1), "debug");
        assert_eq!(default_level(4), "trace");
    }

    #[test]
    fn test_init_logging_twice() {
        init_logging(0);
        init_logging(2);
        assert!(tracing::dispatcher::has_been_set());
    }
}
