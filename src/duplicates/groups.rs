//! Duplicate groups as reported by the external finder.
//!
//! # Overview
//!
//! fclones reports each group as a content hash, a shared length, and a list
//! of paths. This module holds that structure after it has been enriched with
//! per-file metadata (size and modification time) read from the filesystem,
//! plus the [`ScanSummary`] shown above the results.
//!
//! # Example
//!
//! ```
//! use dupecleaner::duplicates::{DuplicateGroup, FileEntry};
//! use std::path::PathBuf;
//!
//! let group = DuplicateGroup::new(
//!     "a1b2".to_string(),
//!     1024,
//!     vec![
//!         FileEntry::new(PathBuf::from("/photos/a.jpg"), 1024, None),
//!         FileEntry::new(PathBuf::from("/backup/a.jpg"), 1024, None),
//!     ],
//! );
//!
//! assert_eq!(group.duplicate_count(), 1);
//! assert_eq!(group.wasted_space(), 1024);
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};

/// Metadata for a single reported file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    /// Path as reported by the external tool
    pub path: PathBuf,
    /// File size in bytes
    pub size: u64,
    /// Last modification time, if it could be read
    pub modified: Option<SystemTime>,
}

impl FileEntry {
    /// Create a new FileEntry.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the file
    /// * `size` - File size in bytes
    /// * `modified` - Last modification time, if known
    #[must_use]
    pub fn new(path: PathBuf, size: u64, modified: Option<SystemTime>) -> Self {
        Self {
            path,
            size,
            modified,
        }
    }

    /// Build an entry by reading the file's metadata.
    ///
    /// If the file cannot be stat'ed (removed since the scan, permission
    /// denied), the entry keeps `fallback_size` and has no modification time.
    #[must_use]
    pub fn from_path(path: PathBuf, fallback_size: u64) -> Self {
        match fs::metadata(&path) {
            Ok(metadata) => {
                let modified = metadata.modified().ok();
                Self::new(path, metadata.len(), modified)
            }
            Err(e) => {
                log::debug!("Could not stat {}: {}", path.display(), e);
                Self::new(path, fallback_size, None)
            }
        }
    }

    /// Number of characters in the displayed path.
    #[must_use]
    pub fn path_len(&self) -> usize {
        self.path.to_string_lossy().chars().count()
    }
}

/// Confirmed duplicate group of files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// Content hash reported by the external tool (hexadecimal)
    pub hash: String,
    /// File size in bytes reported for the group
    pub size: u64,
    /// Detailed file information for each duplicate
    pub files: Vec<FileEntry>,
}

impl DuplicateGroup {
    /// Create a new duplicate group.
    ///
    /// # Arguments
    ///
    /// * `hash` - Content hash as reported by the tool
    /// * `size` - File size in bytes
    /// * `files` - Detailed file entries
    #[must_use]
    pub fn new(hash: String, size: u64, files: Vec<FileEntry>) -> Self {
        Self { hash, size, files }
    }

    /// Number of files in this group.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if this group is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Whether the group still describes a duplicate (two or more files).
    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        self.files.len() > 1
    }

    /// Total size of all files in this group.
    #[must_use]
    pub fn total_size(&self) -> u64 {
        self.files.iter().map(|f| f.size).sum()
    }

    /// Total wasted space (all copies minus one).
    #[must_use]
    pub fn wasted_space(&self) -> u64 {
        if self.files.len() > 1 {
            self.size * (self.files.len() as u64 - 1)
        } else {
            0
        }
    }

    /// Number of duplicate copies (total - 1 original).
    #[must_use]
    pub fn duplicate_count(&self) -> usize {
        self.files.len().saturating_sub(1)
    }

    /// Shortened hash for display.
    #[must_use]
    pub fn short_hash(&self) -> &str {
        let end = self
            .hash
            .char_indices()
            .nth(12)
            .map_or(self.hash.len(), |(idx, _)| idx);
        &self.hash[..end]
    }

    /// Get just the paths of files in this group.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }

    /// Check whether the group contains the given path.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.files.iter().any(|f| f.path == path)
    }
}

/// Summary statistics for one external-tool run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    /// Directory that was scanned
    pub root: PathBuf,
    /// Version string reported by the tool, if present in its output
    pub tool_version: Option<String>,
    /// Number of duplicate groups
    pub duplicate_groups: usize,
    /// Number of files across all groups
    pub total_files: usize,
    /// Number of redundant copies (files minus one per group)
    pub duplicate_files: usize,
    /// Bytes reclaimable by keeping one copy per group
    pub reclaimable_space: u64,
    /// Wall-clock duration of the tool run
    pub scan_duration: Duration,
}

impl ScanSummary {
    /// Compute a summary from the final groups.
    #[must_use]
    pub fn from_groups(
        root: PathBuf,
        tool_version: Option<String>,
        groups: &[DuplicateGroup],
        scan_duration: Duration,
    ) -> Self {
        Self {
            root,
            tool_version,
            duplicate_groups: groups.len(),
            total_files: groups.iter().map(DuplicateGroup::len).sum(),
            duplicate_files: groups.iter().map(DuplicateGroup::duplicate_count).sum(),
            reclaimable_space: groups.iter().map(DuplicateGroup::wasted_space).sum(),
            scan_duration,
        }
    }
}
