//! Rules configuration loader.

use std::path::Path;

use tactics_core::RulesConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for `config.toml`.
///
/// Missing keys fall back to [`RulesConfig`] defaults.
pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load(path: &Path) -> LoadResult<RulesConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> LoadResult<RulesConfig> {
        let config: RulesConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?;

        if config.tile_size <= 0.0 {
            anyhow::bail!("tileSize must be positive, got {}", config.tile_size);
        }
        if config.player_faction.trim().is_empty() {
            anyhow::bail!("playerFaction must not be empty");
        }

        Ok(config)
    }
}
