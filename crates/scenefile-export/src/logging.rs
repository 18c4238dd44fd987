//! Tracing setup for library users
//!
//! The CLI installs its own subscriber. Embedders that have none can call
//! [`init_default`] or [`init_with_config`] once at startup; later calls are
//! ignored.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Whether tracing has been initialized
static TRACING_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Configuration for tracing initialization
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Default filter when `RUST_LOG` is unset (e.g. "info", "warn,scenefile_export=debug")
    pub default_level: String,
    /// Show the target (module path) in log output
    pub show_target: bool,
    pub show_file: bool,
    pub show_line_number: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            default_level: "warn,scenefile_export=info".to_string(),
            show_target: true,
            show_file: false,
            show_line_number: false,
        }
    }
}

/// Initialize the default tracing subscriber
pub fn init_default() {
    init_with_config(TracingConfig::default());
}

/// Initialize tracing with a custom configuration.
///
/// Returns `false` when a subscriber was already installed.
pub fn init_with_config(config: TracingConfig) -> bool {
    if TRACING_INITIALIZED
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::Relaxed)
        .is_err()
    {
        return false;
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.default_level));
    let fmt_layer = fmt::layer()
        .with_target(config.show_target)
        .with_file(config.show_file)
        .with_line_number(config.show_line_number);

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(filter)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_ignored() {
        init_with_config(TracingConfig {
            default_level: "debug".to_string(),
            ..Default::default()
        });
        assert!(!init_with_config(TracingConfig::default()));
    }
}
