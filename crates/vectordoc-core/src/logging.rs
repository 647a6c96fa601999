//! Subscriber setup for binaries and tests that embed the store.
//!
//! The library itself only emits `tracing` events; nothing is printed until
//! a subscriber is installed, either by the host application or by [`init`].

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;

/// Installs a global `fmt` subscriber.
///
/// `RUST_LOG` wins over `config.level` when set. Returns `false` if a
/// global subscriber was already installed, so calling this twice is
/// harmless.
pub fn init(config: &LoggingConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("vectordoc_core={}", config.level)));

    let builder = fmt().with_env_filter(filter).with_target(true);
    let installed = if config.format == "json" {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    match installed {
        Ok(()) => {
            tracing::debug!(level = %config.level, format = %config.format, "logging initialized");
            true
        }
        Err(_) => false,
    }
}
