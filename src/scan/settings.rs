//! User-facing scan parameters collected by the configuration panel.
//!
//! Values arrive as free text from a form (comma-separated extension and
//! directory lists, a size in KB) and are normalised here before they are
//! turned into fclones arguments by [`crate::scan::command`].

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::ScanError;

/// Upper bound of the minimum-size slider, in KB.
pub const MAX_MIN_SIZE_KB: u64 = 1000;

/// Extension input meaning "every file".
pub const ALL_FILES: &str = ".*";

/// Parameters for one scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    /// Directory to scan
    pub root: PathBuf,
    /// Minimum file size in KB (0 to [`MAX_MIN_SIZE_KB`])
    pub min_size_kb: u64,
    /// Comma-separated extensions, e.g. `.txt,.pdf`; `.*` for all files
    pub extensions: String,
    /// Comma-separated directory names or absolute paths to skip
    pub exclude_dirs: String,
    /// Include hidden files and directories
    pub scan_hidden: bool,
    /// Follow symbolic links
    pub follow_symlinks: bool,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            root: default_root(),
            min_size_kb: 0,
            extensions: ALL_FILES.to_string(),
            exclude_dirs: String::new(),
            scan_hidden: false,
            follow_symlinks: false,
        }
    }
}

fn default_root() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

impl ScanSettings {
    /// Create settings for a root with every other option at its default.
    #[must_use]
    pub fn for_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Minimum size in KB, clamped to the slider range.
    #[must_use]
    pub fn clamped_min_size_kb(&self) -> u64 {
        self.min_size_kb.min(MAX_MIN_SIZE_KB)
    }

    /// Minimum size in bytes as passed to the tool.
    ///
    /// Never below one byte: empty files all share the same content and are
    /// never offered as duplicates.
    #[must_use]
    pub fn min_size_bytes(&self) -> u64 {
        (self.clamped_min_size_kb() * 1024).max(1)
    }

    /// Normalised extension filters without the leading dot.
    ///
    /// An empty result means no filter. `.*`, `*` or a blank field select
    /// every file.
    #[must_use]
    pub fn extension_filters(&self) -> Vec<String> {
        let mut filters = Vec::new();
        for item in split_list(&self.extensions) {
            let ext = item.trim_start_matches('*').trim_start_matches('.');
            if ext.is_empty() || ext == "*" {
                return Vec::new();
            }
            let ext = ext.to_string();
            if !filters.contains(&ext) {
                filters.push(ext);
            }
        }
        filters
    }

    /// Excluded directory entries, trimmed, without trailing separators.
    #[must_use]
    pub fn excluded_dirs(&self) -> Vec<String> {
        split_list(&self.exclude_dirs)
            .map(|item| {
                let trimmed = item.trim_end_matches(['/', '\\']);
                if trimmed.is_empty() {
                    item.to_string()
                } else {
                    trimmed.to_string()
                }
            })
            .collect()
    }

    /// Check that the root exists and is a directory.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::RootNotFound`] or [`ScanError::NotADirectory`].
    pub fn validate(&self) -> Result<(), ScanError> {
        validate_root(&self.root)
    }
}

fn validate_root(root: &Path) -> Result<(), ScanError> {
    if root.as_os_str().is_empty() || !root.exists() {
        return Err(ScanError::RootNotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }
    Ok(())
}

fn split_list(input: &str) -> impl Iterator<Item = &str> {
    input.split(',').map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn with_extensions(extensions: &str) -> ScanSettings {
        ScanSettings {
            extensions: extensions.to_string(),
            ..ScanSettings::for_root("/tmp")
        }
    }

    #[test]
    fn test_defaults_match_panel() {
        let settings = ScanSettings::default();
        assert_eq!(settings.min_size_kb, 0);
        assert_eq!(settings.extensions, ".*");
        assert!(settings.exclude_dirs.is_empty());
        assert!(!settings.scan_hidden);
        assert!(!settings.follow_symlinks);
    }

    #[test]
    fn test_extension_filters_all_files() {
        assert!(with_extensions(".*").extension_filters().is_empty());
        assert!(with_extensions("*").extension_filters().is_empty());
        assert!(with_extensions("").extension_filters().is_empty());
        assert!(with_extensions(" , ").extension_filters().is_empty());
        assert!(with_extensions(".txt, .*").extension_filters().is_empty());
    }

    #[test]
    fn test_extension_filters_normalised() {
        assert_eq!(
            with_extensions(".txt, pdf ,*.jpg,.txt").extension_filters(),
            vec!["txt", "pdf", "jpg"]
        );
    }

    #[test]
    fn test_excluded_dirs() {
        let settings = ScanSettings {
            exclude_dirs: "node_modules, /home/me/cache/ ,, target".to_string(),
            ..ScanSettings::for_root("/tmp")
        };
        assert_eq!(
            settings.excluded_dirs(),
            vec!["node_modules", "/home/me/cache", "target"]
        );
    }

    #[test]
    fn test_min_size_bytes() {
        let mut settings = ScanSettings::for_root("/tmp");
        assert_eq!(settings.min_size_bytes(), 1);

        settings.min_size_kb = 4;
        assert_eq!(settings.min_size_bytes(), 4096);

        settings.min_size_kb = 50_000;
        assert_eq!(settings.clamped_min_size_kb(), MAX_MIN_SIZE_KB);
        assert_eq!(settings.min_size_bytes(), MAX_MIN_SIZE_KB * 1024);
    }

    #[test]
    fn test_validate_root() {
        let dir = TempDir::new().unwrap();
        assert!(ScanSettings::for_root(dir.path()).validate().is_ok());

        let missing = dir.path().join("missing");
        assert!(matches!(
            ScanSettings::for_root(&missing).validate(),
            Err(ScanError::RootNotFound(_))
        ));

        let file = dir.path().join("file.txt");
        std::fs::write(&file, b"x").unwrap();
        assert!(matches!(
            ScanSettings::for_root(&file).validate(),
            Err(ScanError::NotADirectory(_))
        ));

        assert!(matches!(
            ScanSettings::for_root("").validate(),
            Err(ScanError::RootNotFound(_))
        ));
    }
}
