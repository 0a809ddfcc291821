//! Node runtime configuration.

use crate::{NodeError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where the bundle agent listens and how often each loop runs.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the bundle agent's socket.
    pub socket: PathBuf,
    /// Pause between presence announcements.
    pub announce_interval: Duration,
    /// Pause between bundle-intake cycles.
    pub poll_interval: Duration,
    /// Pause between role ticks.
    pub tick_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            socket: PathBuf::from("/run/courier/agent.sock"),
            announce_interval: Duration::from_secs(10),
            poll_interval: Duration::from_secs(10),
            tick_interval: Duration::from_secs(10),
        }
    }
}

/// The subset of [`Config`] readable from a TOML file.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    socket: Option<PathBuf>,
    announce_interval_secs: Option<u64>,
    poll_interval_secs: Option<u64>,
    tick_interval_secs: Option<u64>,
}

impl Config {
    /// Loads configuration from a TOML file; anything the file leaves
    /// out keeps its default.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let file: ConfigFile =
            toml::from_str(&text).map_err(|err| NodeError::Config(err.to_string()))?;

        let mut config = Config::default();
        if let Some(socket) = file.socket {
            config.socket = socket;
        }
        if let Some(secs) = file.announce_interval_secs {
            config.announce_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = file.poll_interval_secs {
            config.poll_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = file.tick_interval_secs {
            config.tick_interval = Duration::from_secs(secs);
        }
        Ok(config)
    }
}
