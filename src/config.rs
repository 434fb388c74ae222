use std::{
    net::{Ipv4Addr, SocketAddr},
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{controller::DEFAULT_GRACE, difficulty::Difficulty};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Settings shared by the shells. Read from a JSON file; every field is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// UCI engine to play the automated side. Random moves when absent.
    pub engine_path: Option<PathBuf>,

    /// Milliseconds granted beyond the think time before a provider call is abandoned.
    pub grace_ms: u64,

    /// Seed for the first-mover draw and the random provider.
    pub seed: Option<u64>,

    /// Difficulty to start with instead of asking.
    pub difficulty: Option<Difficulty>,

    /// Where the HTTP shell listens.
    pub bind: SocketAddr,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            engine_path: None,
            grace_ms: DEFAULT_GRACE.as_millis() as u64,
            seed: None,
            difficulty: None,
            bind: SocketAddr::from((Ipv4Addr::LOCALHOST, 3000)),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })
    }

    pub fn grace(&self) -> Duration {
        Duration::from_millis(self.grace_ms)
    }
}
