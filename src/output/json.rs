//! JSON rendering.
//!
//! ```json
//! {
//!   "root": "/data",
//!   "tool_version": "0.35.0",
//!   "strategy": "newest",
//!   "groups": [
//!     {
//!       "hash": "abc123",
//!       "size": 1024,
//!       "files": [
//!         { "path": "/data/a.txt", "modified": "2024-01-01T00:00:00+00:00", "action": "keep" },
//!         { "path": "/data/b.txt", "modified": null, "action": "delete" }
//!       ]
//!     }
//!   ],
//!   "summary": { "duplicate_groups": 1, "...": 0 }
//! }
//! ```

use std::io::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::duplicates::{DuplicateGroup, FileEntry, ScanSummary};
use crate::error::ExitCode;
use crate::selection::ReviewState;

use super::file_action;

/// One file of a group.
#[derive(Debug, Clone, Serialize)]
pub struct JsonFile {
    pub path: String,
    /// RFC 3339 modification time, `null` when unknown
    pub modified: Option<String>,
    /// `keep` or `delete`
    pub action: &'static str,
}

/// One duplicate group.
#[derive(Debug, Clone, Serialize)]
pub struct JsonGroup {
    pub hash: String,
    pub size: u64,
    pub files: Vec<JsonFile>,
}

/// Summary statistics.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    pub duplicate_groups: usize,
    pub total_files: usize,
    pub duplicate_files: usize,
    pub reclaimable_space: u64,
    pub selected_files: usize,
    pub selected_bytes: u64,
    pub scan_duration_ms: u64,
    pub exit_code: i32,
    pub exit_code_name: String,
}

/// Complete JSON document.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    pub root: String,
    pub tool_version: Option<String>,
    pub strategy: Option<&'static str>,
    pub groups: Vec<JsonGroup>,
    pub summary: JsonSummary,
}

impl JsonOutput {
    /// Build the document from reviewed results.
    #[must_use]
    pub fn new(review: &ReviewState, summary: &ScanSummary, exit_code: ExitCode) -> Self {
        let stats = review.stats();
        Self {
            root: summary.root.to_string_lossy().into_owned(),
            tool_version: summary.tool_version.clone(),
            strategy: review.strategy().map(|s| s.as_str()),
            groups: review
                .groups()
                .iter()
                .map(|g| json_group(g, review))
                .collect(),
            summary: JsonSummary {
                duplicate_groups: summary.duplicate_groups,
                total_files: summary.total_files,
                duplicate_files: summary.duplicate_files,
                reclaimable_space: summary.reclaimable_space,
                selected_files: stats.selected_count,
                selected_bytes: stats.selected_bytes,
                scan_duration_ms: u64::try_from(summary.scan_duration.as_millis())
                    .unwrap_or(u64::MAX),
                exit_code: exit_code.as_i32(),
                exit_code_name: exit_code.code_prefix().to_string(),
            },
        }
    }

    /// Compact JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write pretty-printed JSON followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        serde_json::to_writer_pretty(&mut writer, self)?;
        writeln!(writer)
    }
}

fn json_group(group: &DuplicateGroup, review: &ReviewState) -> JsonGroup {
    JsonGroup {
        hash: group.hash.clone(),
        size: group.size,
        files: group
            .files
            .iter()
            .map(|f| JsonFile {
                path: f.path.to_string_lossy().into_owned(),
                modified: rfc3339(f),
                action: file_action(review, &f.path),
            })
            .collect(),
    }
}

pub(crate) fn rfc3339(file: &FileEntry) -> Option<String> {
    file.modified
        .map(|m| DateTime::<Utc>::from(m).to_rfc3339())
}
