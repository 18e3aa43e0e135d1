//! Configuration loading: defaults, optional TOML file, env var overrides.

use std::env;

use serde::Deserialize;
use tracing::info;

use crate::engine::templates::MAX_SEARCH_LEVEL;
use crate::types::{PathfinderError, Result};

/// Tunables of the pathfinding engine. Defaults match the production
/// settings; a TOML file and environment variables can override them.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// How many templates a search runs; larger finds more paths, slower.
    pub search_level: u8,
    /// Default number of paths a request returns.
    pub max_paths: usize,
    /// Fan-out cap when expanding an intermediary account.
    pub fan_out: usize,
    /// Fan-out cap when expanding the source account itself.
    pub source_fan_out: usize,
    /// Block pass-through when the intermediary flagged either side of the
    /// hop; `false` selects the looser variant requiring both.
    pub strict_no_ripple: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            search_level: 7,
            max_paths: 4,
            fan_out: 10,
            source_fan_out: 50,
            strict_no_ripple: true,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub search_level: Option<u8>,
    pub max_paths: Option<usize>,
    pub fan_out: Option<usize>,
    pub source_fan_out: Option<usize>,
    pub strict_no_ripple: Option<bool>,
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.parse().ok())
}

impl EngineConfig {
    /// Defaults overridden by environment variables.
    pub fn load() -> Result<Self> {
        Self::from_sources(FileConfig::default())
    }

    /// Defaults overridden by a TOML file, then by environment variables.
    pub fn load_with_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| PathfinderError::Config(format!("cannot read {path}: {e}")))?;
        let file: FileConfig = toml::from_str(&contents)
            .map_err(|e| PathfinderError::Config(format!("cannot parse {path}: {e}")))?;
        info!(path, "loaded engine config");
        Self::from_sources(file)
    }

    pub(crate) fn from_sources(file: FileConfig) -> Result<Self> {
        let defaults = EngineConfig::default();
        let config = EngineConfig {
            search_level: env_parse("PATHFINDER_SEARCH_LEVEL")
                .or(file.search_level)
                .unwrap_or(defaults.search_level),
            max_paths: env_parse("PATHFINDER_MAX_PATHS")
                .or(file.max_paths)
                .unwrap_or(defaults.max_paths),
            fan_out: env_parse("PATHFINDER_FAN_OUT")
                .or(file.fan_out)
                .unwrap_or(defaults.fan_out),
            source_fan_out: env_parse("PATHFINDER_SOURCE_FAN_OUT")
                .or(file.source_fan_out)
                .unwrap_or(defaults.source_fan_out),
            strict_no_ripple: env_parse("PATHFINDER_STRICT_NO_RIPPLE")
                .or(file.strict_no_ripple)
                .unwrap_or(defaults.strict_no_ripple),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.search_level > MAX_SEARCH_LEVEL {
            return Err(PathfinderError::SearchLevelOutOfRange(self.search_level));
        }
        if self.max_paths == 0 {
            return Err(PathfinderError::Config("max_paths must be at least 1".into()));
        }
        if self.fan_out == 0 || self.source_fan_out == 0 {
            return Err(PathfinderError::Config("fan-out caps must be at least 1".into()));
        }
        Ok(())
    }
}
