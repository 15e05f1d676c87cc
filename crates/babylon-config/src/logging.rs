// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Subscriber setup for the binaries. Libraries only emit events.

use tracing_subscriber::EnvFilter;

/// Overrides the configured filter when set.
pub const LOG_ENV: &str = "BABYLON_LOG";

/// Install a stderr subscriber. `verbose` raises the configured level to
/// `debug`; `BABYLON_LOG` overrides both.
///
/// Installing twice is harmless: the second call is ignored.
pub fn init_logging(level: &str, verbose: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(if verbose { "debug" } else { level }))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
