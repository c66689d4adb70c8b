//! Keep-strategies: which copy of a duplicate group survives.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::duplicates::{DuplicateGroup, FileEntry};

/// Rule for choosing the file to keep in each group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeepStrategy {
    /// Keep the most recently modified copy
    Newest,
    /// Keep the least recently modified copy
    Oldest,
    /// Keep the copy with the shortest path
    ShortestPath,
    /// Keep the copy with the longest path
    LongestPath,
}

impl KeepStrategy {
    /// Every strategy, in menu order.
    pub const ALL: [KeepStrategy; 4] = [
        KeepStrategy::Newest,
        KeepStrategy::Oldest,
        KeepStrategy::ShortestPath,
        KeepStrategy::LongestPath,
    ];

    /// Stable identifier used in forms and on the command line.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::Oldest => "oldest",
            Self::ShortestPath => "shortest-path",
            Self::LongestPath => "longest-path",
        }
    }

    /// Menu label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Newest => "Keep newest",
            Self::Oldest => "Keep oldest",
            Self::ShortestPath => "Keep shortest path",
            Self::LongestPath => "Keep longest path",
        }
    }

    /// Index of the file this strategy keeps, `None` for an empty slice.
    ///
    /// Ties on the strategy key go to the shorter path, then to the
    /// lexicographically smaller path. Unknown modification times count as
    /// the oldest possible.
    #[must_use]
    pub fn keeper(self, files: &[FileEntry]) -> Option<usize> {
        files
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| self.compare(a, b))
            .map(|(idx, _)| idx)
    }

    /// `Less` means `a` is preferred over `b`.
    fn compare(self, a: &FileEntry, b: &FileEntry) -> Ordering {
        let primary = match self {
            // None < Some, so reversing puts unknown mtimes last.
            Self::Newest => b.modified.cmp(&a.modified),
            Self::Oldest => a.modified.cmp(&b.modified),
            Self::ShortestPath => a.path_len().cmp(&b.path_len()),
            Self::LongestPath => b.path_len().cmp(&a.path_len()),
        };
        primary
            .then_with(|| a.path_len().cmp(&b.path_len()))
            .then_with(|| a.path.cmp(&b.path))
    }
}

impl fmt::Display for KeepStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeepStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == normalized)
            .ok_or_else(|| format!("Unknown keep strategy: '{s}'"))
    }
}

/// Paths a strategy selects for deletion: every file except each group's
/// keeper.
#[must_use]
pub fn select_for_deletion(groups: &[DuplicateGroup], strategy: KeepStrategy) -> BTreeSet<PathBuf> {
    let mut selected = BTreeSet::new();
    for group in groups.iter().filter(|g| g.has_duplicates()) {
        let Some(keep) = strategy.keeper(&group.files) else {
            continue;
        };
        selected.extend(
            group
                .files
                .iter()
                .enumerate()
                .filter(|(idx, _)| *idx != keep)
                .map(|(_, f)| f.path.clone()),
        );
    }
    selected
}
