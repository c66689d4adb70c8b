//! Parsing of fclones reports.
//!
//! Two formats are understood:
//!
//! * **JSON** (`--format json`, what [`crate::scan::command`] requests):
//!
//!   ```json
//!   {
//!     "header": { "version": "0.34.0", "stats": { ... } },
//!     "groups": [
//!       { "file_len": 1024, "file_hash": "3c5f...", "files": ["/a", "/b"] }
//!     ]
//!   }
//!   ```
//!
//! * **Default text report**, accepted so that a user-supplied `--format` in
//!   `fclones.extra_args` or an older tool still produces usable results:
//!
//!   ```text
//!   # Report by fclones 0.34.0
//!   3c5f0e2a, 1024 B (1.0 KB) * 2:
//!       /a
//!       /b
//!   ```
//!
//! The format is picked from the first non-whitespace character. Empty output
//! is a valid report with no groups.

use std::path::PathBuf;
use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

/// Errors raised while reading a report.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The output looked like JSON but did not match the report schema.
    #[error("invalid JSON report: {0}")]
    Json(#[from] serde_json::Error),

    /// A non-indented, non-comment line was not a group header.
    #[error("line {line}: unrecognised group header: {content}")]
    InvalidGroupHeader {
        /// 1-based line number
        line: usize,
        /// Offending line
        content: String,
    },

    /// A file path line appeared before any group header.
    #[error("line {line}: file path outside of a group")]
    FileOutsideGroup {
        /// 1-based line number
        line: usize,
    },
}

/// One group exactly as reported, before filesystem enrichment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportGroup {
    /// Content hash (may be empty if the tool skipped content hashing)
    pub hash: String,
    /// Reported file length in bytes
    pub size: u64,
    /// Reported paths
    pub files: Vec<PathBuf>,
}

/// A parsed report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    /// Tool version from the report header, if present
    pub tool_version: Option<String>,
    /// Groups with at least two files
    pub groups: Vec<ReportGroup>,
}

#[derive(Debug, Deserialize)]
struct JsonReport {
    #[serde(default)]
    header: Option<JsonHeader>,
    #[serde(default)]
    groups: Vec<JsonGroup>,
}

#[derive(Debug, Deserialize)]
struct JsonHeader {
    #[serde(default)]
    version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JsonGroup {
    file_len: u64,
    #[serde(default)]
    file_hash: String,
    files: Vec<PathBuf>,
}

/// Parse fclones stdout into a [`Report`].
///
/// Groups with fewer than two files are dropped.
///
/// # Errors
///
/// Returns [`ParseError`] if the output is neither a valid JSON report nor a
/// valid text report.
pub fn parse_report(output: &str) -> Result<Report, ParseError> {
    let trimmed = output.trim_start();
    let mut report = if trimmed.is_empty() {
        Report::default()
    } else if trimmed.starts_with('{') {
        parse_json(trimmed)?
    } else {
        parse_text(output)?
    };

    let before = report.groups.len();
    report.groups.retain(|g| g.files.len() > 1);
    if report.groups.len() != before {
        log::debug!(
            "Dropped {} reported group(s) with fewer than two files",
            before - report.groups.len()
        );
    }

    Ok(report)
}

fn parse_json(input: &str) -> Result<Report, ParseError> {
    let raw: JsonReport = serde_json::from_str(input)?;
    Ok(Report {
        tool_version: raw.header.and_then(|h| h.version),
        groups: raw
            .groups
            .into_iter()
            .map(|g| ReportGroup {
                hash: g.file_hash,
                size: g.file_len,
                files: g.files,
            })
            .collect(),
    })
}

fn header_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([0-9A-Fa-f]*),\s*(\d+)\s*B(?:\s*\([^)]*\))?\s*\*\s*(\d+):\s*$")
            .expect("group header regex is valid")
    })
}

fn version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^#\s*Report by fclones\s+(\S+)").expect("version regex is valid")
    })
}

fn parse_text(input: &str) -> Result<Report, ParseError> {
    let mut report = Report::default();
    let mut current: Option<ReportGroup> = None;

    for (idx, raw_line) in input.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim_end_matches('\r');

        if line.trim().is_empty() {
            continue;
        }

        if line.starts_with('#') {
            if let Some(caps) = version_regex().captures(line) {
                report.tool_version = Some(caps[1].to_string());
            }
            continue;
        }

        if line.starts_with(char::is_whitespace) {
            let group = current
                .as_mut()
                .ok_or(ParseError::FileOutsideGroup { line: line_no })?;
            group.files.push(PathBuf::from(line.trim_start()));
            continue;
        }

        let caps = header_regex()
            .captures(line)
            .ok_or_else(|| ParseError::InvalidGroupHeader {
                line: line_no,
                content: line.to_string(),
            })?;

        if let Some(done) = current.take() {
            report.groups.push(done);
        }
        // The regex only admits digits here; overflow is the only failure.
        let size = caps[2]
            .parse::<u64>()
            .map_err(|_| ParseError::InvalidGroupHeader {
                line: line_no,
                content: line.to_string(),
            })?;
        current = Some(ReportGroup {
            hash: caps[1].to_string(),
            size,
            files: Vec::new(),
        });
    }

    if let Some(done) = current.take() {
        report.groups.push(done);
    }

    Ok(report)
}
