//! Logging initialization and configuration.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is not set.
const DEFAULT_FILTER: &str = "gowershell_client=info";

fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Initialize the logging system.
///
/// Uses the `RUST_LOG` environment variable for filtering. If not set,
/// defaults to `gowershell_client=info`.
///
/// # Panics
///
/// Panics if called more than once, or if another tracing subscriber
/// has already been set.
pub fn init() {
    tracing_subscriber::registry()
        .with(default_filter())
        .with(tracing_subscriber::fmt::layer().compact())
        .init();
}

/// Try to initialize the logging system.
///
/// Returns `Ok(())` if successful, or `Err` if logging has already been
/// initialized.
pub fn try_init() -> Result<(), tracing_subscriber::util::TryInitError> {
    tracing_subscriber::registry()
        .with(default_filter())
        .with(tracing_subscriber::fmt::layer().compact())
        .try_init()
}

/// Initialize logging with an explicit filter directive.
///
/// A bare level such as `debug` applies to this crate only; anything else
/// is used as a full `EnvFilter` directive. Log lines go to stderr so they
/// never mix with command output.
pub fn init_with_filter(directive: &str) -> Result<(), tracing_subscriber::util::TryInitError> {
    tracing_subscriber::registry()
        .with(filter_for(directive))
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(std::io::stderr),
        )
        .try_init()
}

fn filter_for(directive: &str) -> EnvFilter {
    let directive = directive.trim();
    let is_level = matches!(
        directive.to_ascii_lowercase().as_str(),
        "off" | "error" | "warn" | "info" | "debug" | "trace"
    );
    let directive = if is_level {
        format!("gowershell_client={}", directive.to_ascii_lowercase())
    } else {
        directive.to_string()
    };
    EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_try_init_idempotent() {
        // First call may or may not succeed depending on test order
        let _ = try_init();
        let _ = try_init();
        let _ = init_with_filter("debug");
    }

    #[test]
    fn test_filter_for_level() {
        assert_eq!(filter_for("DEBUG").to_string(), "gowershell_client=debug");
        assert_eq!(filter_for(" warn ").to_string(), "gowershell_client=warn");
    }

    #[test]
    fn test_filter_for_directive() {
        assert_eq!(
            filter_for("gowershell_client=trace").to_string(),
            "gowershell_client=trace"
        );
    }

    #[test]
    fn test_logging_works() {
        let _ = try_init();

        tracing::info!("test info message");
        tracing::debug!("test debug message");
        tracing::warn!("test warn message");
        tracing::error!("test error message");
    }
}
