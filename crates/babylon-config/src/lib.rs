// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! `babylon.toml` configuration.
//!
//! ```toml
//! [trace]
//! step_limit = 100000
//! ignore_invocation_line = true
//!
//! [annotations]
//! missing_argument = "null"
//!
//! [log]
//! level = "info"
//! ```
//!
//! Every key is optional. A missing file means defaults.

mod loader;
mod logging;

use serde::{Deserialize, Serialize};

pub use loader::{discover, load, load_or_default, ConfigError, CONFIG_FILE_NAME};
pub use logging::{init_logging, LOG_ENV};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub trace: TraceSettings,
    pub annotations: AnnotationSettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceSettings {
    /// Statements one run may execute before it is stopped.
    pub step_limit: u64,
    pub ignore_invocation_line: bool,
}

impl Default for TraceSettings {
    fn default() -> Self {
        Self {
            step_limit: 1_000_000,
            ignore_invocation_line: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationSettings {
    /// Argument text for parameters an example neither binds nor defaults.
    pub missing_argument: String,
}

impl Default for AnnotationSettings {
    fn default() -> Self {
        Self {
            missing_argument: "null".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Filter directive, e.g. `warn` or `babylon_trace=debug`.
    pub level: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}
