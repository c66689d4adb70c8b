//! Protected directories that deletion never touches.

use std::fs;
use std::path::{Path, PathBuf};

/// Set of directory roots under which files are never deleted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProtectedPaths {
    roots: Vec<PathBuf>,
}

impl ProtectedPaths {
    /// Create a set from configured roots. Empty entries are ignored.
    #[must_use]
    pub fn new(roots: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            roots: roots
                .into_iter()
                .filter(|r| !r.as_os_str().is_empty())
                .collect(),
        }
    }

    /// Configured roots.
    #[must_use]
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Protected root containing `path`, if any.
    ///
    /// Both the path as given and its canonical form are checked, so a
    /// symlink into a protected directory is caught.
    #[must_use]
    pub fn protecting_root(&self, path: &Path) -> Option<&Path> {
        let canonical = fs::canonicalize(path).ok();
        self.roots
            .iter()
            .find(|root| {
                is_under(path, root) || canonical.as_deref().is_some_and(|c| is_under(c, root))
            })
            .map(PathBuf::as_path)
    }

    /// Check whether `path` lies under a protected root.
    #[must_use]
    pub fn is_protected(&self, path: &Path) -> bool {
        self.protecting_root(path).is_some()
    }
}

#[cfg(windows)]
fn is_under(path: &Path, root: &Path) -> bool {
    let path = path.to_string_lossy().to_lowercase().replace('/', "\\");
    let root = root.to_string_lossy().to_lowercase().replace('/', "\\");
    let root = root.trim_end_matches('\\');
    path == root || path.starts_with(&format!("{root}\\"))
}

#[cfg(not(windows))]
fn is_under(path: &Path, root: &Path) -> bool {
    path.starts_with(root)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn test_is_protected_by_component() {
        let protected = ProtectedPaths::new(vec![PathBuf::from("/etc"), PathBuf::new()]);

        assert_eq!(protected.roots().len(), 1);
        assert!(protected.is_protected(Path::new("/etc/hosts")));
        assert!(protected.is_protected(Path::new("/etc")));
        assert!(!protected.is_protected(Path::new("/etcetera/file")));
        assert!(!protected.is_protected(Path::new("/home/me/etc/file")));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_into_protected_root() {
        let outer = tempfile::TempDir::new().unwrap();
        let guarded = outer.path().join("guarded");
        std::fs::create_dir(&guarded).unwrap();
        let target = guarded.join("file.txt");
        std::fs::write(&target, b"x").unwrap();
        let link = outer.path().join("link.txt");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let guarded = std::fs::canonicalize(&guarded).unwrap();
        let protected = ProtectedPaths::new(vec![guarded.clone()]);
        assert_eq!(protected.protecting_root(&link), Some(guarded.as_path()));
    }

    #[cfg(windows)]
    #[test]
    fn test_windows_case_insensitive() {
        let protected = ProtectedPaths::new(vec![PathBuf::from(r"C:\Windows")]);
        assert!(protected.is_protected(Path::new(r"c:\windows\System32\x.dll")));
        assert!(!protected.is_protected(Path::new(r"C:\WindowsApps\x")));
    }

    #[test]
    fn test_empty_set_protects_nothing() {
        assert!(!ProtectedPaths::default().is_protected(Path::new("/etc/hosts")));
    }
}
