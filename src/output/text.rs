//! Plain-text listing for terminals.

use std::io::{self, Write};

use bytesize::ByteSize;
use yansi::Paint;

use crate::duplicates::ScanSummary;
use crate::selection::ReviewState;

/// Grouped listing with a `[keep]`/`[delete]` marker per file.
pub struct TextOutput<'a> {
    review: &'a ReviewState,
    summary: &'a ScanSummary,
}

impl<'a> TextOutput<'a> {
    #[must_use]
    pub fn new(review: &'a ReviewState, summary: &'a ScanSummary) -> Self {
        Self { review, summary }
    }

    /// Write the listing followed by the summary.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, mut out: W) -> io::Result<()> {
        for (idx, group) in self.review.groups().iter().enumerate() {
            writeln!(
                out,
                "{} {} files of {} (hash {})",
                format!("Group {}:", idx + 1).bold(),
                group.len(),
                ByteSize::b(group.size),
                group.short_hash()
            )?;
            for file in &group.files {
                if self.review.is_selected(&file.path) {
                    writeln!(out, "  {} {}", "[delete]".red(), file.path.display())?;
                } else {
                    writeln!(out, "  {} {}", "[keep]  ".green(), file.path.display())?;
                }
            }
            writeln!(out)?;
        }

        let stats = self.review.stats();
        writeln!(
            out,
            "{} duplicate group(s), {} redundant file(s), {} reclaimable",
            self.summary.duplicate_groups,
            self.summary.duplicate_files,
            ByteSize::b(self.summary.reclaimable_space)
        )?;
        match self.review.strategy() {
            Some(strategy) => writeln!(
                out,
                "Strategy '{}' selects {} file(s), {}",
                strategy,
                stats.selected_count,
                ByteSize::b(stats.selected_bytes)
            ),
            None => writeln!(out, "No keep strategy given; nothing selected"),
        }
    }
}
