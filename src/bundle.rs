use std::path::{Path, PathBuf};
use tracing::debug;

/// Read-only directory of resources shipped alongside the application
#[derive(Debug, Clone)]
pub struct AssetBundle {
    root: PathBuf,
}

impl AssetBundle {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of `<name>.<extension>` when it exists as a regular file
    pub fn url_for_resource(&self, name: &str, extension: &str) -> Option<PathBuf> {
        let path = self.path_for_resource(name, extension);
        if path.is_file() {
            Some(path)
        } else {
            debug!("Resource {} not found in bundle {}", path.display(), self.root.display());
            None
        }
    }

    /// Where `<name>.<extension>` lives, whether or not it exists yet
    pub fn path_for_resource(&self, name: &str, extension: &str) -> PathBuf {
        let extension = extension.trim_start_matches('.');
        self.root.join(format!("{}.{}", name, extension))
    }
}
