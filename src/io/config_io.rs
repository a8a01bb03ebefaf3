use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::AgendaConfig;

/// File looked up in the working directory when no `--config` is given
pub const CONFIG_FILE: &str = "agenda.toml";

/// Error type for loading agenda.toml
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Parse config text. Every section and key is optional.
pub fn parse_config(text: &str) -> Result<AgendaConfig, toml::de::Error> {
    toml::from_str(text)
}

/// Read and parse a config file that must exist
pub fn read_config(path: &Path) -> Result<AgendaConfig, ConfigError> {
    let text = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_config(&text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Load the explicit config file if given, else `agenda.toml` in `dir` if it
/// exists, else the defaults.
pub fn load_config(explicit: Option<&Path>, dir: &Path) -> Result<AgendaConfig, ConfigError> {
    if let Some(path) = explicit {
        return read_config(path);
    }
    let default_path = dir.join(CONFIG_FILE);
    if default_path.is_file() {
        read_config(&default_path)
    } else {
        Ok(AgendaConfig::default())
    }
}
