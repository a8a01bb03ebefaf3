use serde::{Deserialize, Serialize};

use super::instant::Instant;

/// Configuration from agenda.toml
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgendaConfig {
    #[serde(default)]
    pub clock: ClockConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClockConfig {
    /// Initial clock; when absent the agenda starts at its default clock
    #[serde(default)]
    pub start: Option<Instant>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Prefix printed in front of every tag
    #[serde(default = "default_tag_marker")]
    pub tag_marker: String,
    /// Emit JSON instead of text
    #[serde(default)]
    pub json: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            tag_marker: default_tag_marker(),
            json: false,
        }
    }
}

fn default_tag_marker() -> String {
    "#".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Filter directive for tracing (e.g. "warn", "agenda=debug")
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}
