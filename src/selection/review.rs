//! Review state: groups under review and the files marked for deletion.

use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::duplicates::DuplicateGroup;

use super::{select_for_deletion, KeepStrategy};

/// Counts shown in the results summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SelectionStats {
    /// Number of duplicate groups
    pub group_count: usize,
    /// Redundant copies across all groups (files minus one per group)
    pub duplicate_files: usize,
    /// Files currently selected for deletion
    pub selected_count: usize,
    /// Bytes freed by deleting the selection
    pub selected_bytes: u64,
}

/// Groups under review plus the current selection.
///
/// The selection is recomputed from the active strategy whenever the
/// strategy or the group set changes. Manual edits last until then.
#[derive(Debug, Clone, Default)]
pub struct ReviewState {
    groups: Vec<DuplicateGroup>,
    strategy: Option<KeepStrategy>,
    selected: BTreeSet<PathBuf>,
}

impl ReviewState {
    /// Create a review state and apply `strategy`.
    #[must_use]
    pub fn new(groups: Vec<DuplicateGroup>, strategy: Option<KeepStrategy>) -> Self {
        let mut state = Self {
            groups: Vec::new(),
            strategy,
            selected: BTreeSet::new(),
        };
        state.set_groups(groups);
        state
    }

    /// Groups under review.
    #[must_use]
    pub fn groups(&self) -> &[DuplicateGroup] {
        &self.groups
    }

    /// Active strategy, `None` when nothing is auto-selected.
    #[must_use]
    pub fn strategy(&self) -> Option<KeepStrategy> {
        self.strategy
    }

    /// Selected paths in sorted order.
    #[must_use]
    pub fn selected(&self) -> &BTreeSet<PathBuf> {
        &self.selected
    }

    /// Check if a specific file is selected.
    #[must_use]
    pub fn is_selected(&self, path: &Path) -> bool {
        self.selected.contains(path)
    }

    /// Check if any files are selected.
    #[must_use]
    pub fn has_selections(&self) -> bool {
        !self.selected.is_empty()
    }

    /// Replace the groups and recompute the selection.
    ///
    /// Groups with fewer than two files are discarded.
    pub fn set_groups(&mut self, groups: Vec<DuplicateGroup>) {
        self.groups = groups.into_iter().filter(DuplicateGroup::has_duplicates).collect();
        self.recompute();
    }

    /// Change the strategy and recompute the selection.
    pub fn set_strategy(&mut self, strategy: Option<KeepStrategy>) {
        self.strategy = strategy;
        self.recompute();
    }

    /// Toggle one file. Returns whether it is now selected.
    ///
    /// Paths outside the groups are ignored.
    pub fn toggle(&mut self, path: &Path) -> bool {
        if !self.contains(path) {
            log::debug!("Ignoring toggle of unknown path {}", path.display());
            return false;
        }
        if self.selected.remove(path) {
            log::debug!("Deselected: {}", path.display());
            false
        } else {
            self.selected.insert(path.to_path_buf());
            log::debug!("Selected: {}", path.display());
            true
        }
    }

    /// Replace the selection with exactly the given paths, as submitted by
    /// the checkbox form. Unknown paths are dropped.
    pub fn set_manual_selection<I, P>(&mut self, paths: I)
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let known = self.known_paths();
        let selected: BTreeSet<PathBuf> = paths
            .into_iter()
            .map(Into::into)
            .filter(|p| known.contains(p.as_path()))
            .collect();
        self.selected = selected;
        log::debug!("Manual selection: {} file(s)", self.selected.len());
    }

    /// Select every file in every group.
    pub fn select_all(&mut self) {
        self.selected = self
            .groups
            .iter()
            .flat_map(|g| g.files.iter().map(|f| f.path.clone()))
            .collect();
        log::debug!("Selected all {} files", self.selected.len());
    }

    /// Deselect all files.
    pub fn select_none(&mut self) {
        let count = self.selected.len();
        self.selected.clear();
        log::debug!("Deselected all {} files", count);
    }

    /// Every file path under review.
    #[must_use]
    pub fn file_paths(&self) -> Vec<PathBuf> {
        self.groups
            .iter()
            .flat_map(|g| g.files.iter().map(|f| f.path.clone()))
            .collect()
    }

    /// Drop deleted (or vanished) files, dissolve groups that are no longer
    /// duplicates, and recompute the selection.
    ///
    /// Returns how many files under review were dropped. Nothing is
    /// recomputed when none were.
    pub fn remove_deleted(&mut self, deleted: &[PathBuf]) -> usize {
        let deleted_set: HashSet<&Path> = deleted.iter().map(PathBuf::as_path).collect();
        let removed = self.remove_where(|p| deleted_set.contains(p));

        if removed > 0 {
            log::info!(
                "Removed {} deleted files, {} groups remaining",
                removed,
                self.groups.len()
            );
        }
        removed
    }

    /// Indices of groups in which every file is selected.
    #[must_use]
    pub fn fully_selected_groups(&self) -> Vec<usize> {
        self.groups
            .iter()
            .enumerate()
            .filter(|(_, g)| g.files.iter().all(|f| self.selected.contains(&f.path)))
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Summary counts.
    #[must_use]
    pub fn stats(&self) -> SelectionStats {
        let selected_bytes = self
            .groups
            .iter()
            .flat_map(|g| g.files.iter())
            .filter(|f| self.selected.contains(&f.path))
            .map(|f| f.size)
            .sum();

        SelectionStats {
            group_count: self.groups.len(),
            duplicate_files: self.groups.iter().map(DuplicateGroup::duplicate_count).sum(),
            selected_count: self.selected.len(),
            selected_bytes,
        }
    }

    fn contains(&self, path: &Path) -> bool {
        self.groups.iter().any(|g| g.contains(path))
    }

    fn known_paths(&self) -> HashSet<&Path> {
        self.groups
            .iter()
            .flat_map(|g| g.files.iter().map(|f| f.path.as_path()))
            .collect()
    }

    fn remove_where(&mut self, mut gone: impl FnMut(&Path) -> bool) -> usize {
        let before: usize = self.groups.iter().map(DuplicateGroup::len).sum();
        for group in &mut self.groups {
            group.files.retain(|f| !gone(f.path.as_path()));
        }
        let removed = before - self.groups.iter().map(DuplicateGroup::len).sum::<usize>();
        if removed > 0 {
            self.groups.retain(DuplicateGroup::has_duplicates);
            self.recompute();
        }
        removed
    }

    fn recompute(&mut self) {
        self.selected = match self.strategy {
            Some(strategy) => select_for_deletion(&self.groups, strategy),
            None => BTreeSet::new(),
        };
        log::debug!(
            "Selection recomputed ({}): {} file(s)",
            self.strategy.map_or("none", KeepStrategy::as_str),
            self.selected.len()
        );
    }
}

/// The given paths that no longer exist on disk.
///
/// Stats every path, so call it off any lock that guards the review.
#[must_use]
pub fn missing_from_disk(paths: &[PathBuf]) -> Vec<PathBuf> {
    let missing: Vec<PathBuf> = paths
        .iter()
        .filter(|p| fs::symlink_metadata(p).is_err())
        .cloned()
        .collect();
    if !missing.is_empty() {
        log::debug!("{} file(s) missing from disk", missing.len());
    }
    missing
}
