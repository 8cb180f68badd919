use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::fs;

use crate::navigation::DEFAULT_HEADER_OFFSET;
use crate::pacing::{Pacing, SCROLL_THROTTLE, SEARCH_DEBOUNCE};

pub const CONFIG_FILE: &str = "linkdeck.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub catalog: PathBuf,
    pub search: SearchConfig,
    pub scroll: ScrollConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub debounce_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    pub throttle_ms: u64,
    pub header_offset: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog: PathBuf::from("websites.yaml"),
            search: SearchConfig::default(),
            scroll: ScrollConfig::default(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: SEARCH_DEBOUNCE.as_millis() as u64,
        }
    }
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            throttle_ms: SCROLL_THROTTLE.as_millis() as u64,
            header_offset: DEFAULT_HEADER_OFFSET,
        }
    }
}

impl Config {
    pub fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if config.catalog.is_relative() {
            if let Some(dir) = path.parent() {
                config.catalog = dir.join(&config.catalog);
            }
        }
        Ok(config)
    }

    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).await.map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    /// An explicit path must exist; otherwise `linkdeck.toml` in the working
    /// directory is used when present, and defaults when not.
    pub async fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path).await;
        }
        let path = Path::new(CONFIG_FILE);
        if fs::metadata(path).await.is_ok() {
            Self::load(path).await
        } else {
            Ok(Self::default())
        }
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search.debounce_ms)
    }

    pub fn scroll_throttle(&self) -> Duration {
        Duration::from_millis(self.scroll.throttle_ms)
    }

    pub fn pacing(&self) -> Pacing {
        Pacing {
            search_debounce: self.search_debounce(),
            scroll_throttle: self.scroll_throttle(),
        }
    }
}
