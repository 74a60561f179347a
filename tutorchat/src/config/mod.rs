//! Layered engine configuration.
//!
//! Values resolve in order: compiled defaults, then the config file (the
//! default path if present, or an explicitly named file which must exist).
//! Every key is optional in the file; anything unset falls through to the
//! default.

use std::path::{Path, PathBuf};

use clap::Parser;
use serde::Deserialize;

/// Command-line arguments for the demo binary.
#[derive(Debug, Parser)]
#[command(name = "tutorchat", about = "Chat synchronization engine demo")]
pub struct CliArgs {
    /// Email address to sign in as.
    #[arg(long, default_value = "learner@example.com")]
    pub viewer: String,

    /// Config file path. Must exist when given; otherwise the default
    /// location is used if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level filter, used when `RUST_LOG` is unset.
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Log file path (defaults to `tutorchat.log` in the temp directory).
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An explicitly named config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file was not valid TOML for this schema.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),
}

/// Resolved engine configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Maximum outbound message length in bytes.
    pub max_text_len: usize,
    /// Capacity of the widget's outbound event channel.
    pub event_buffer: usize,
    /// Capacity of the inbound push-event channel.
    pub push_buffer: usize,
    /// How many preview backfill fetches run concurrently.
    pub preview_fan_out: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            max_text_len: 4 * 1024,
            event_buffer: 64,
            push_buffer: 256,
            preview_fan_out: 16,
        }
    }
}

/// On-disk schema. All keys optional.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    chat: ChatSection,
    #[serde(default)]
    directory: DirectorySection,
}

#[derive(Debug, Default, Deserialize)]
struct ChatSection {
    max_text_len: Option<usize>,
    event_buffer: Option<usize>,
    push_buffer: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct DirectorySection {
    preview_fan_out: Option<usize>,
}

impl SyncConfig {
    /// Loads configuration.
    ///
    /// With an explicit path the file must exist and parse. Without one,
    /// the default path (`<config dir>/tutorchat/config.toml`) is used if
    /// present and silently skipped if not.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let contents = match explicit {
            Some(path) => {
                Some(
                    std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
                        path: path.to_path_buf(),
                        source,
                    })?,
                )
            }
            None => default_path().and_then(|path| std::fs::read_to_string(path).ok()),
        };

        match contents {
            Some(text) => {
                let file: ConfigFile = toml::from_str(&text)?;
                Ok(Self::resolve(file))
            }
            None => Ok(Self::default()),
        }
    }

    fn resolve(file: ConfigFile) -> Self {
        let defaults = Self::default();
        Self {
            max_text_len: file.chat.max_text_len.unwrap_or(defaults.max_text_len),
            event_buffer: file.chat.event_buffer.unwrap_or(defaults.event_buffer),
            push_buffer: file.chat.push_buffer.unwrap_or(defaults.push_buffer),
            preview_fan_out: file
                .directory
                .preview_fan_out
                .unwrap_or(defaults.preview_fan_out),
        }
    }
}

fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("tutorchat").join("config.toml"))
}
