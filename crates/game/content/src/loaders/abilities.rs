//! Ability catalog loader.
//!
//! Ability files are JSON or RON, chosen by extension. A JSON file may hold
//! one definition or a list; a RON file holds a list. Definitions that fail
//! validation are logged, recorded in [`AbilityCatalog::failures`] and
//! skipped, so one bad ability never prevents the rest from loading.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tactics_core::{Ability, AbilityDefinition, ResourceLoader, Ruleset, ScriptEngine};
use tracing::{debug, warn};

use crate::loaders::{LoadResult, read_file};

/// An ability that could not be registered.
#[derive(Debug)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub ability: Option<String>,
    pub error: anyhow::Error,
}

/// Result of loading ability files.
#[derive(Debug, Default)]
pub struct AbilityCatalog {
    pub ruleset: Ruleset,
    pub failures: Vec<LoadFailure>,
}

impl AbilityCatalog {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Format {
    Json,
    Ron,
}

impl Format {
    fn of(path: &Path) -> Option<Self> {
        match path.extension()?.to_str()? {
            "json" => Some(Self::Json),
            "ron" => Some(Self::Ron),
            _ => None,
        }
    }
}

pub struct AbilityLoader;

impl AbilityLoader {
    /// Parses the definitions in one file without validating them.
    pub fn read_definitions(path: &Path) -> LoadResult<Vec<AbilityDefinition>> {
        let format = Format::of(path)
            .ok_or_else(|| anyhow::anyhow!("Unsupported ability file {}", path.display()))?;
        let content = read_file(path)?;
        Self::parse(&content, format)
            .with_context(|| format!("Failed to parse abilities in {}", path.display()))
    }

    fn parse(content: &str, format: Format) -> LoadResult<Vec<AbilityDefinition>> {
        match format {
            Format::Json => {
                let value: serde_json::Value = serde_json::from_str(content)?;
                if value.is_array() {
                    Ok(serde_json::from_value(value)?)
                } else {
                    Ok(vec![serde_json::from_value(value)?])
                }
            }
            Format::Ron => Ok(ron::from_str(content)?),
        }
    }

    /// Loads one file into `catalog`.
    ///
    /// Returns an error only if the file itself is unreadable; individual
    /// definitions are reported through `catalog.failures`.
    pub fn load_file(
        path: &Path,
        engine: &dyn ScriptEngine,
        resources: &dyn ResourceLoader,
        catalog: &mut AbilityCatalog,
    ) -> LoadResult<usize> {
        let definitions = Self::read_definitions(path)?;
        let mut loaded = 0;

        for def in definitions {
            let id = def.id.clone();
            match Self::build(def, path, engine, resources, &catalog.ruleset) {
                Ok(ability) => {
                    debug!(
                        target: "tactics::ability",
                        ability = %ability.id(),
                        path = %path.display(),
                        "registered ability"
                    );
                    catalog.ruleset.insert(ability);
                    loaded += 1;
                }
                Err(error) => {
                    warn!(
                        target: "tactics::ability",
                        path = %path.display(),
                        error = %format_args!("{error:#}"),
                        "skipping ability"
                    );
                    catalog.failures.push(LoadFailure {
                        path: path.to_path_buf(),
                        ability: (!id.is_empty()).then_some(id),
                        error,
                    });
                }
            }
        }

        Ok(loaded)
    }

    fn build(
        def: AbilityDefinition,
        path: &Path,
        engine: &dyn ScriptEngine,
        resources: &dyn ResourceLoader,
        ruleset: &Ruleset,
    ) -> LoadResult<Ability> {
        let id = def.id.clone();
        if ruleset.contains(&id) {
            anyhow::bail!("duplicate ability `{}` in {}", id, path.display());
        }
        Ability::from_definition(def, engine, resources)
            .with_context(|| format!("ability `{}` in {}", id, path.display()))
    }

    /// Loads every `.json` and `.ron` file under `dir`, in file name order.
    pub fn load_dir(
        dir: &Path,
        engine: &dyn ScriptEngine,
        resources: &dyn ResourceLoader,
    ) -> LoadResult<AbilityCatalog> {
        let mut files = Vec::new();
        collect_files(dir, &mut files)?;
        files.sort();

        let mut catalog = AbilityCatalog::default();
        for path in files {
            if let Err(error) = Self::load_file(&path, engine, resources, &mut catalog) {
                warn!(
                    target: "tactics::ability",
                    path = %path.display(),
                    error = %format_args!("{error:#}"),
                    "skipping ability file"
                );
                catalog.failures.push(LoadFailure {
                    path,
                    ability: None,
                    error,
                });
            }
        }

        Ok(catalog)
    }
}

fn collect_files(dir: &Path, files: &mut Vec<PathBuf>) -> LoadResult<()> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| anyhow::anyhow!("Failed to read directory {}: {}", dir.display(), e))?;

    for entry in entries {
        let path = entry?.path();
        if path.is_dir() {
            collect_files(&path, files)?;
        } else if Format::of(&path).is_some() {
            files.push(path);
        }
    }
    Ok(())
}
