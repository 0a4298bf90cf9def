//! Script resources resolved against a directory.

use std::path::{Component, Path, PathBuf};

use tactics_core::{ResourceLoader, ScriptError};
use tracing::debug;

/// Resolves resource locations such as `scripts/abilities/stance.js`
/// relative to a root directory.
///
/// Locations are always relative; absolute paths and `..` components are
/// reported as not found.
#[derive(Clone, Debug)]
pub struct FileResourceLoader {
    root: PathBuf,
}

impl FileResourceLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Filesystem path for `location`, if it stays inside the root.
    pub fn resolve(&self, location: &str) -> Option<PathBuf> {
        let relative = Path::new(location);
        let contained = relative
            .components()
            .all(|component| matches!(component, Component::Normal(_) | Component::CurDir));
        (contained && !location.is_empty()).then(|| self.root.join(relative))
    }
}

impl ResourceLoader for FileResourceLoader {
    fn script_source(&self, location: &str) -> Result<String, ScriptError> {
        let path = self
            .resolve(location)
            .ok_or_else(|| ScriptError::ResourceNotFound(location.to_string()))?;

        std::fs::read_to_string(&path).map_err(|e| {
            debug!(
                target: "tactics::script",
                path = %path.display(),
                error = %e,
                "script resource unreadable"
            );
            ScriptError::ResourceNotFound(location.to_string())
        })
    }
}
