//! Renderings of scan results for the headless `scan` command.
//!
//! - [`text`]: grouped listing for terminals
//! - [`json`]: machine-readable document with a summary block
//! - [`csv`]: one row per file for spreadsheets
//!
//! Every rendering marks each file with the action the current selection
//! implies (`keep` or `delete`).

pub mod csv;
pub mod json;
pub mod text;

use std::path::Path;

use clap::ValueEnum;

use crate::selection::ReviewState;

pub use csv::CsvOutput;
pub use json::JsonOutput;
pub use text::TextOutput;

/// Output format of the `scan` command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable listing
    #[default]
    Text,
    /// JSON document
    Json,
    /// CSV rows
    Csv,
}

/// Action implied by the selection for one file.
#[must_use]
pub fn file_action(review: &ReviewState, path: &Path) -> &'static str {
    if review.is_selected(path) {
        "delete"
    } else {
        "keep"
    }
}
