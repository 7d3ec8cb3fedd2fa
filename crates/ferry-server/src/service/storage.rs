use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// Directory every download and metadata request is confined to.
#[derive(Debug, Clone)]
pub struct StorageRoot {
    root: Arc<PathBuf>,
}

impl StorageRoot {
    /// Creates a storage root. The path should already be canonical.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Arc::new(root.into()),
        }
    }

    /// Returns the root directory.
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Joins a request path onto the root.
    ///
    /// Returns `None` for empty paths and for paths with `..`, root or prefix
    /// components, which could escape the root.
    pub fn resolve(&self, relative: &str) -> Option<PathBuf> {
        let mut resolved = self.root.as_ref().clone();
        let mut depth = 0usize;

        for component in Path::new(relative.trim_start_matches('/')).components() {
            match component {
                Component::Normal(segment) => {
                    resolved.push(segment);
                    depth += 1;
                }
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }

        (depth > 0).then_some(resolved)
    }

    /// Returns whether the root is an accessible directory.
    pub async fn is_available(&self) -> bool {
        tokio::fs::metadata(self.path())
            .await
            .is_ok_and(|metadata| metadata.is_dir())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_nested_paths() {
        let root = StorageRoot::new("/srv/files");
        assert_eq!(
            root.resolve("reports/2024/q3.pdf"),
            Some(PathBuf::from("/srv/files/reports/2024/q3.pdf"))
        );
        assert_eq!(
            root.resolve("/./notes.txt"),
            Some(PathBuf::from("/srv/files/notes.txt"))
        );
    }

    #[test]
    fn rejects_escaping_paths() {
        let root = StorageRoot::new("/srv/files");
        assert_eq!(root.resolve("../etc/passwd"), None);
        assert_eq!(root.resolve("reports/../../etc/passwd"), None);
        assert_eq!(root.resolve(""), None);
        assert_eq!(root.resolve("."), None);
    }
}
