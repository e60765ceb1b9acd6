use std::path::Path;

use anyhow::Context as _;
use racetune_driver::driver::EpisodeLimits;
use racetune_swarm::params::SwarmParams;
use serde::{Deserialize, Serialize};

use crate::util;

/// Contents of a `--config` file.
///
/// Both sections are optional, as is every field inside them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub swarm: SwarmParams,
    pub episode: EpisodeLimits,
}

impl Config {
    /// Reads `path`, or returns the defaults when no file is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let config: Self = util::read_json_file("config", path)?;
        config
            .swarm
            .validate()
            .with_context(|| format!("Invalid swarm settings in {}", path.display()))?;
        Ok(config)
    }
}
