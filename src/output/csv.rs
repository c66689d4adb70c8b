//! CSV rendering, one row per file.
//!
//! Columns: `group_id`, `hash`, `path`, `size`, `modified` (RFC 3339, empty
//! when unknown), `action` (`keep` or `delete`).

use std::io;

use serde::Serialize;
use thiserror::Error;

use crate::selection::ReviewState;

use super::file_action;
use super::json::rfc3339;

/// Errors that can occur during CSV output generation.
#[derive(Debug, Error)]
pub enum CsvOutputError {
    /// I/O error during writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Error during CSV serialization.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    group_id: usize,
    hash: &'a str,
    path: String,
    size: u64,
    modified: String,
    action: &'static str,
}

/// CSV output formatter.
pub struct CsvOutput<'a> {
    review: &'a ReviewState,
}

impl<'a> CsvOutput<'a> {
    #[must_use]
    pub fn new(review: &'a ReviewState) -> Self {
        Self { review }
    }

    /// Write the header and all rows.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError` if writing or serialization fails.
    pub fn write_to<W: io::Write>(&self, writer: W) -> Result<(), CsvOutputError> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        for (idx, group) in self.review.groups().iter().enumerate() {
            for file in &group.files {
                csv_writer.serialize(CsvRow {
                    group_id: idx + 1,
                    hash: &group.hash,
                    path: file.path.to_string_lossy().into_owned(),
                    size: file.size,
                    modified: rfc3339(file).unwrap_or_default(),
                    action: file_action(self.review, &file.path),
                })?;
            }
        }

        csv_writer.flush()?;
        Ok(())
    }

    /// Render to a string.
    ///
    /// # Errors
    ///
    /// Returns `CsvOutputError` if serialization fails.
    pub fn to_string(&self) -> Result<String, CsvOutputError> {
        let mut buffer = Vec::new();
        self.write_to(&mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
