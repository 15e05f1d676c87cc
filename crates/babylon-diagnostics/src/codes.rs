// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Error code registry.
//!
//! Maps codes (B0001, B0200, ...) to titles and categories for display and
//! JSON output.

use std::collections::HashMap;
use std::fmt;

pub const SYNTAX: &str = "B0001";
pub const RUNTIME: &str = "B0100";
pub const INVALID_RUNNER: &str = "B0200";
pub const CONFIG: &str = "B0300";

pub struct ErrorCodeRegistry {
    codes: HashMap<&'static str, ErrorCodeInfo>,
}

pub struct ErrorCodeInfo {
    pub code: &'static str,
    pub title: &'static str,
    pub category: ErrorCategory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Syntax,
    Runtime,
    Evaluation,
    Configuration,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Syntax => write!(f, "Syntax"),
            ErrorCategory::Runtime => write!(f, "Runtime"),
            ErrorCategory::Evaluation => write!(f, "Evaluation"),
            ErrorCategory::Configuration => write!(f, "Configuration"),
        }
    }
}

macro_rules! register_codes {
    ($($code:expr => ($title:literal, $cat:expr)),* $(,)?) => {{
        let mut map = HashMap::new();
        $(
            map.insert($code, ErrorCodeInfo {
                code: $code,
                title: $title,
                category: $cat,
            });
        )*
        map
    }};
}

impl Default for ErrorCodeRegistry {
    fn default() -> Self {
        use ErrorCategory::*;

        Self {
            codes: register_codes! {
                SYNTAX => ("guest code could not be parsed", Syntax),
                RUNTIME => ("guest program faulted", Runtime),
                INVALID_RUNNER => ("malformed runner script reference", Evaluation),
                CONFIG => ("invalid babylon.toml", Configuration),
            },
        }
    }
}

impl ErrorCodeRegistry {
    pub fn get(&self, code: &str) -> Option<&ErrorCodeInfo> {
        self.codes.get(code)
    }
}
