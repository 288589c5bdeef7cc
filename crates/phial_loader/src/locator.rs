//! Config file location: relative lookup first, then the search paths.

use crate::error::LocatorError;
use std::path::{Component, Path, PathBuf};

/// Resolves bare config filenames to concrete paths.
///
/// Lookup order: the directory of the "relative to" file (or the directory
/// itself), with `.`/`..` segments stripped from the requested name, then
/// each configured search directory in order.
#[derive(Clone, Debug, Default)]
pub struct ConfigLocator {
    search_paths: Vec<PathBuf>,
}

impl ConfigLocator {
    /// Creates a locator with no search paths.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a locator over the given search directories.
    pub fn with_paths(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            search_paths: paths.into_iter().collect(),
        }
    }

    /// Appends a search directory.
    pub fn add_path(&mut self, path: impl Into<PathBuf>) {
        self.search_paths.push(path.into());
    }

    /// Locates `file`, optionally relative to another file or directory.
    pub fn locate(&self, file: &str, relative_to: Option<&Path>) -> Result<PathBuf, LocatorError> {
        if let Some(relative_to) = relative_to {
            if let Some(path) = self.find_relative(file, relative_to) {
                return Ok(path);
            }
        }
        if let Some(path) = self.find_in_search_paths(file) {
            return Ok(path);
        }
        Err(LocatorError::NotFound {
            file: file.to_string(),
            relative_to: relative_to.map(Path::to_path_buf),
        })
    }

    fn find_relative(&self, file: &str, relative_to: &Path) -> Option<PathBuf> {
        let base = if relative_to.is_dir() {
            relative_to
        } else {
            relative_to.parent()?
        };
        let candidate = base.join(strip_dot_segments(Path::new(file)));
        candidate.exists().then_some(candidate)
    }

    fn find_in_search_paths(&self, file: &str) -> Option<PathBuf> {
        self.search_paths
            .iter()
            .map(|path| path.join(file))
            .find(|candidate| candidate.exists())
    }
}

/// Drops `.` and `..` segments, keeping only the normal components.
fn strip_dot_segments(path: &Path) -> PathBuf {
    path.components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn strips_dot_segments() {
        assert_eq!(
            strip_dot_segments(Path::new("../sub/./file.yml")),
            PathBuf::from("sub/file.yml")
        );
        assert_eq!(
            strip_dot_segments(Path::new("file.yml")),
            PathBuf::from("file.yml")
        );
    }

    #[test]
    fn finds_relative_to_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("base.yml");
        let target = dir.path().join("import.yml");
        fs::write(&base, "{}").unwrap();
        fs::write(&target, "{}").unwrap();

        let locator = ConfigLocator::new();
        let found = locator.locate("import.yml", Some(&base)).unwrap();
        assert_eq!(found, target);
    }

    #[test]
    fn relative_lookup_ignores_parent_segments() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("import.yml");
        fs::write(&target, "{}").unwrap();

        let locator = ConfigLocator::new();
        let found = locator
            .locate("../import.yml", Some(dir.path()))
            .unwrap();
        assert_eq!(found, target);
    }

    #[test]
    fn falls_back_to_search_paths() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("app.yml");
        fs::write(&target, "{}").unwrap();

        let locator = ConfigLocator::with_paths([dir.path().to_path_buf()]);
        let found = locator.locate("app.yml", None).unwrap();
        assert_eq!(found, target);
    }

    #[test]
    fn search_path_order_wins() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        fs::write(first.path().join("app.yml"), "{}").unwrap();
        fs::write(second.path().join("app.yml"), "{}").unwrap();

        let locator =
            ConfigLocator::with_paths([first.path().to_path_buf(), second.path().to_path_buf()]);
        let found = locator.locate("app.yml", None).unwrap();
        assert_eq!(found, first.path().join("app.yml"));
    }

    #[test]
    fn missing_file_errors() {
        let locator = ConfigLocator::new();
        let err = locator.locate("missing.yml", None).unwrap_err();
        assert!(matches!(err, LocatorError::NotFound { .. }));
    }
}
