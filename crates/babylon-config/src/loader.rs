// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Finding and reading `babylon.toml`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::Config;

pub const CONFIG_FILE_NAME: &str = "babylon.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Load a config file. The file must exist.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "loaded config");
    Ok(config)
}

/// The nearest `babylon.toml` in `start` or one of its ancestors.
/// `start` may be a file; the search then begins in its directory.
pub fn discover(start: &Path) -> Option<PathBuf> {
    let dir = if start.is_dir() { start } else { start.parent()? };
    dir.ancestors()
        .map(|ancestor| ancestor.join(CONFIG_FILE_NAME))
        .find(|candidate| candidate.is_file())
}

/// Load `explicit` if given, else the discovered file near `start`, else
/// defaults.
pub fn load_or_default(explicit: Option<&Path>, start: &Path) -> Result<Config, ConfigError> {
    if let Some(path) = explicit {
        return load(path);
    }
    match discover(start) {
        Some(path) => load(&path),
        None => {
            debug!(start = %start.display(), "no config found, using defaults");
            Ok(Config::default())
        }
    }
}
