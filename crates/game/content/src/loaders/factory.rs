//! Content factory for loading everything a world needs from one directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tactics_core::{Area, RulesConfig, ScriptEngine, World};

use crate::loaders::{AbilityCatalog, AbilityLoader, ConfigLoader, FileResourceLoader, LoadResult};

/// Content factory that loads all ability content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── config.toml
/// ├── abilities/
/// │   ├── feats.json
/// │   └── spells.ron
/// └── scripts/
///     └── abilities/
///         └── stance.js
/// ```
///
/// Script locations in ability files are relative to `data_dir`.
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Load rules configuration from `config.toml`, or defaults if absent.
    pub fn load_config(&self) -> LoadResult<RulesConfig> {
        let path = self.data_dir.join("config.toml");
        if !path.exists() {
            return Ok(RulesConfig::default());
        }
        ConfigLoader::load(&path)
    }

    pub fn resources(&self) -> FileResourceLoader {
        FileResourceLoader::new(&self.data_dir)
    }

    /// Load every ability under `abilities/`.
    pub fn load_abilities(&self, engine: &dyn ScriptEngine) -> LoadResult<AbilityCatalog> {
        let dir = self.data_dir.join("abilities");
        AbilityLoader::load_dir(&dir, engine, &self.resources())
    }

    /// Builds a world over `area` with this directory's config and abilities.
    ///
    /// Ability failures are logged and skipped; they are returned alongside
    /// the world for callers that want to report them.
    pub fn build_world(
        &self,
        area: Area,
        engine: Arc<dyn ScriptEngine>,
    ) -> LoadResult<(World, Vec<crate::loaders::LoadFailure>)> {
        let config = self.load_config()?;
        let catalog = self.load_abilities(engine.as_ref())?;
        let world = World::new(config, area, Arc::new(catalog.ruleset), engine);
        Ok((world, catalog.failures))
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
