//! Safe file deletion using trash crate.
//!
//! # Overview
//!
//! This module deletes the files selected in a [`ReviewState`]:
//! - Move to system trash (default, recoverable)
//! - Permanent deletion (with explicit configuration)
//! - Per-file failures that never abort the batch
//! - TOCTOU verification before deletion
//!
//! # Safety
//!
//! Before anything is removed, every group is checked to keep at least one
//! copy that still exists on disk, and every file is checked against the
//! protected directories.
//!
//! # Example
//!
//! ```no_run
//! use dupecleaner::actions::delete::{delete_to_trash, DeleteConfig};
//! use std::path::PathBuf;
//!
//! let path = PathBuf::from("/path/to/duplicate.txt");
//! match delete_to_trash(&path) {
//!     Ok(result) => println!("Deleted: {}", result.path.display()),
//!     Err(e) => eprintln!("Failed: {}", e),
//! }
//! ```

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use bytesize::ByteSize;
use thiserror::Error;

use crate::config::DeleteSettings;
use crate::duplicates::{DuplicateGroup, FileEntry};
use crate::selection::ReviewState;

use super::ProtectedPaths;

/// Error type for deletion operations.
#[derive(Debug, Error)]
pub enum DeleteError {
    /// File was not found (may have been deleted or moved).
    #[error("file not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied when attempting to delete.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// File was modified since scan (TOCTOU protection).
    #[error("file modified since scan: {0}")]
    Modified(PathBuf),

    /// File lies under a protected directory.
    #[error("protected location ({root}): {path}")]
    Protected { path: PathBuf, root: PathBuf },

    /// Trash operation failed.
    #[error("trash operation failed for {path}: {message}")]
    TrashFailed { path: PathBuf, message: String },

    /// Permanent delete operation failed.
    #[error("permanent delete failed for {path}: {message}")]
    PermanentDeleteFailed { path: PathBuf, message: String },

    /// Every copy in the file's group is selected (at least one must be preserved).
    #[error("cannot delete all copies - at least one file must be preserved: {0}")]
    AllCopiesWouldBeDeleted(PathBuf),

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DeleteError {
    /// Get the path associated with this error.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p)
            | Self::PermissionDenied(p)
            | Self::Modified(p)
            | Self::AllCopiesWouldBeDeleted(p)
            | Self::Protected { path: p, .. }
            | Self::TrashFailed { path: p, .. }
            | Self::PermanentDeleteFailed { path: p, .. }
            | Self::Io { path: p, .. } => p,
        }
    }

    fn from_io(path: &Path, e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: e,
            },
        }
    }
}

/// Result of a successful deletion operation.
#[derive(Debug, Clone)]
pub struct DeleteResult {
    /// Path that was deleted.
    pub path: PathBuf,
    /// Size of the deleted file in bytes.
    pub size: u64,
    /// Whether deletion was permanent (true) or to trash (false).
    pub permanent: bool,
}

impl DeleteResult {
    /// Create a new delete result.
    #[must_use]
    pub fn new(path: PathBuf, size: u64, permanent: bool) -> Self {
        Self {
            path,
            size,
            permanent,
        }
    }
}

/// Results of a batch deletion operation.
#[derive(Debug, Default)]
pub struct BatchDeleteResult {
    /// Successfully deleted files.
    pub successes: Vec<DeleteResult>,
    /// Failed deletions with their errors.
    pub failures: Vec<DeleteError>,
    /// Total bytes freed.
    pub bytes_freed: u64,
}

impl BatchDeleteResult {
    /// Number of successful deletions.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.successes.len()
    }

    /// Number of failed deletions.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Total number of attempted deletions.
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.successes.len() + self.failures.len()
    }

    /// Check if all deletions succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// Paths that no longer exist: deleted now, or already gone.
    ///
    /// These are the paths to drop from the review state.
    #[must_use]
    pub fn removed_paths(&self) -> Vec<PathBuf> {
        self.successes
            .iter()
            .map(|s| s.path.clone())
            .chain(
                self.failures
                    .iter()
                    .filter(|e| matches!(e, DeleteError::NotFound(_)))
                    .map(|e| e.path().to_path_buf()),
            )
            .collect()
    }

    /// Human-readable summary of the operation.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.all_succeeded() {
            format!(
                "Deleted {} file(s), freed {}",
                self.success_count(),
                ByteSize::b(self.bytes_freed)
            )
        } else {
            format!(
                "Deleted {} file(s), {} failed, freed {}",
                self.success_count(),
                self.failure_count(),
                ByteSize::b(self.bytes_freed)
            )
        }
    }
}

/// Configuration for deletion operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteConfig {
    /// Use permanent deletion instead of trash.
    pub permanent: bool,
    /// Verify file modification time before deletion (TOCTOU protection).
    pub verify_mtime: bool,
}

impl Default for DeleteConfig {
    fn default() -> Self {
        Self {
            permanent: false,
            verify_mtime: true,
        }
    }
}

impl From<DeleteSettings> for DeleteConfig {
    fn from(settings: DeleteSettings) -> Self {
        Self {
            permanent: settings.permanent,
            verify_mtime: settings.verify_mtime,
        }
    }
}

impl DeleteConfig {
    /// Create config for trash deletion.
    #[must_use]
    pub fn trash() -> Self {
        Self::default()
    }

    /// Create config for permanent deletion.
    #[must_use]
    pub fn permanent() -> Self {
        Self {
            permanent: true,
            ..Self::default()
        }
    }

    /// Enable/disable TOCTOU verification.
    #[must_use]
    pub fn with_verify_mtime(mut self, verify: bool) -> Self {
        self.verify_mtime = verify;
        self
    }

    /// Short description for confirmation pages and logs.
    #[must_use]
    pub fn mode_label(&self) -> &'static str {
        if self.permanent {
            "permanently deleted"
        } else {
            "moved to the trash"
        }
    }
}

/// Delete a single file to the system trash.
///
/// # Errors
///
/// - `NotFound` if the file doesn't exist
/// - `PermissionDenied` if deletion is not allowed
/// - `TrashFailed` if the trash operation fails
pub fn delete_to_trash(path: &Path) -> Result<DeleteResult, DeleteError> {
    let size = fs::metadata(path)
        .map_err(|e| DeleteError::from_io(path, e))?
        .len();

    trash::delete(path).map_err(|e| {
        log::error!("Trash operation failed for {}: {}", path.display(), e);
        DeleteError::TrashFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })?;

    log::info!("Moved to trash: {} ({} bytes)", path.display(), size);

    Ok(DeleteResult::new(path.to_path_buf(), size, false))
}

/// Permanently delete a single file.
///
/// **WARNING**: This operation cannot be undone.
///
/// # Errors
///
/// - `NotFound` if the file doesn't exist
/// - `PermissionDenied` if deletion is not allowed
/// - `PermanentDeleteFailed` if the delete operation fails
pub fn permanent_delete(path: &Path) -> Result<DeleteResult, DeleteError> {
    let size = fs::metadata(path)
        .map_err(|e| DeleteError::from_io(path, e))?
        .len();

    fs::remove_file(path).map_err(|e| {
        log::error!("Permanent delete failed for {}: {}", path.display(), e);
        match e.kind() {
            io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => {
                DeleteError::from_io(path, e)
            }
            _ => DeleteError::PermanentDeleteFailed {
                path: path.to_path_buf(),
                message: e.to_string(),
            },
        }
    })?;

    log::info!("Permanently deleted: {} ({} bytes)", path.display(), size);

    Ok(DeleteResult::new(path.to_path_buf(), size, true))
}

/// Delete a single scanned file with TOCTOU verification.
///
/// Refuses the file if its modification time or size differs from what the
/// scan recorded. An entry without a recorded mtime is only size-checked.
///
/// # Errors
///
/// - `Modified` if the file was changed since scan
/// - Other errors from `delete_to_trash` or `permanent_delete`
pub fn delete_verified(entry: &FileEntry, config: &DeleteConfig) -> Result<DeleteResult, DeleteError> {
    let path = entry.path.as_path();
    let metadata = fs::symlink_metadata(path).map_err(|e| DeleteError::from_io(path, e))?;

    if !metadata.is_file() {
        return Err(DeleteError::Io {
            path: path.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"),
        });
    }

    if config.verify_mtime {
        if let (Some(expected), Ok(actual)) = (entry.modified, metadata.modified()) {
            if expected != actual {
                log::warn!("File modified since scan: {} (mtime changed)", path.display());
                return Err(DeleteError::Modified(path.to_path_buf()));
            }
        }
        if metadata.len() != entry.size {
            log::warn!(
                "File modified since scan: {} (size changed from {} to {})",
                path.display(),
                entry.size,
                metadata.len()
            );
            return Err(DeleteError::Modified(path.to_path_buf()));
        }
    }

    if config.permanent {
        permanent_delete(path)
    } else {
        delete_to_trash(path)
    }
}

/// Validate that a selection doesn't delete all copies of a group.
///
/// # Errors
///
/// Returns `AllCopiesWouldBeDeleted` (naming the group's first file) if no
/// file of the group would be preserved.
///
/// # Example
///
/// ```
/// use dupecleaner::actions::delete::validate_preserves_copy;
/// use dupecleaner::duplicates::{DuplicateGroup, FileEntry};
/// use std::collections::BTreeSet;
/// use std::path::PathBuf;
///
/// let group = DuplicateGroup::new(
///     "ab".to_string(),
///     1,
///     vec![
///         FileEntry::new(PathBuf::from("/original.txt"), 1, None),
///         FileEntry::new(PathBuf::from("/copy.txt"), 1, None),
///     ],
/// );
///
/// let mut selected = BTreeSet::from([PathBuf::from("/copy.txt")]);
/// assert!(validate_preserves_copy(&selected, &group).is_ok());
///
/// selected.insert(PathBuf::from("/original.txt"));
/// assert!(validate_preserves_copy(&selected, &group).is_err());
/// ```
pub fn validate_preserves_copy(
    selected: &BTreeSet<PathBuf>,
    group: &DuplicateGroup,
) -> Result<(), DeleteError> {
    let preserved_count = group
        .files
        .iter()
        .filter(|f| !selected.contains(&f.path))
        .count();

    if preserved_count == 0 {
        log::error!(
            "Refusing to delete all {} copies of group {}",
            group.len(),
            group.short_hash()
        );
        let first = group.files.first().map(|f| f.path.clone()).unwrap_or_default();
        Err(DeleteError::AllCopiesWouldBeDeleted(first))
    } else {
        Ok(())
    }
}

/// Whether an unselected file of the group is still a regular file on disk.
fn has_surviving_copy(selected: &BTreeSet<PathBuf>, group: &DuplicateGroup) -> bool {
    let survivor = group
        .files
        .iter()
        .filter(|f| !selected.contains(&f.path))
        .any(|f| fs::symlink_metadata(&f.path).is_ok_and(|m| m.is_file()));

    if !survivor {
        log::error!(
            "Refusing to delete from group {}: no unselected copy remains on disk",
            group.short_hash()
        );
    }
    survivor
}

/// Delete every selected file of a review.
///
/// Groups whose files are all selected, or whose unselected copies have
/// vanished from disk, are refused as a whole. Protected
/// paths are refused per file. All other failures are recorded and the
/// batch continues.
#[must_use]
pub fn delete_selection(
    state: &ReviewState,
    config: &DeleteConfig,
    protected: &ProtectedPaths,
) -> BatchDeleteResult {
    let mut result = BatchDeleteResult::default();
    let selected = state.selected();

    log::info!(
        "Deleting {} selected file(s) ({})",
        selected.len(),
        config.mode_label()
    );

    for group in state.groups() {
        let chosen: Vec<&FileEntry> = group
            .files
            .iter()
            .filter(|f| selected.contains(&f.path))
            .collect();
        if chosen.is_empty() {
            continue;
        }

        if validate_preserves_copy(selected, group).is_err() || !has_surviving_copy(selected, group)
        {
            result.failures.extend(
                chosen
                    .iter()
                    .map(|f| DeleteError::AllCopiesWouldBeDeleted(f.path.clone())),
            );
            continue;
        }

        for entry in chosen {
            let outcome = match protected.protecting_root(&entry.path) {
                Some(root) => Err(DeleteError::Protected {
                    path: entry.path.clone(),
                    root: root.to_path_buf(),
                }),
                None => delete_verified(entry, config),
            };

            match outcome {
                Ok(deleted) => {
                    result.bytes_freed += deleted.size;
                    result.successes.push(deleted);
                }
                Err(e) => {
                    log::warn!("Failed to delete {}: {}", entry.path.display(), e);
                    result.failures.push(e);
                }
            }
        }
    }

    log::info!("{}", result.summary());

    result
}
