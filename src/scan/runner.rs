//! fclones process execution.
//!
//! The runner blocks until the tool exits. Web handlers call it from
//! `tokio::task::spawn_blocking`; the headless `scan` command calls it
//! directly behind a spinner.

use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::{Output, Stdio};
use std::time::Instant;

use crate::config::FclonesConfig;
use crate::duplicates::{DuplicateGroup, FileEntry, ScanSummary};

use super::{parse_report, FclonesCommand, ScanError, ScanSettings};

/// Lines of stderr kept in [`ScanError::ToolFailed`].
const STDERR_TAIL_LINES: usize = 20;

/// Result of a successful scan.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    /// Duplicate groups enriched with filesystem metadata
    pub groups: Vec<DuplicateGroup>,
    /// Statistics for the run
    pub summary: ScanSummary,
}

/// Runs the configured fclones binary.
#[derive(Debug, Clone, Default)]
pub struct FclonesRunner {
    config: FclonesConfig,
}

impl FclonesRunner {
    /// Create a runner for the given tool configuration.
    #[must_use]
    pub fn new(config: FclonesConfig) -> Self {
        Self { config }
    }

    /// Tool configuration in use.
    #[must_use]
    pub fn config(&self) -> &FclonesConfig {
        &self.config
    }

    /// Run a scan and return the parsed, enriched duplicate groups.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError`] if the root is invalid, the tool cannot be
    /// started, exits unsuccessfully, or prints an unreadable report.
    pub fn run(&self, settings: &ScanSettings) -> Result<ScanOutcome, ScanError> {
        settings.validate()?;

        let command = FclonesCommand::build(&self.config, settings);
        log::info!("Running: {}", command.display());

        let started = Instant::now();
        let output = self.execute(&command)?;
        let elapsed = started.elapsed();

        let stdout = String::from_utf8_lossy(&output.stdout);
        let report = parse_report(&stdout)?;

        let groups: Vec<DuplicateGroup> = report
            .groups
            .into_iter()
            .map(|raw| {
                let files = raw
                    .files
                    .into_iter()
                    .map(|path| FileEntry::from_path(path, raw.size))
                    .collect();
                DuplicateGroup::new(raw.hash, raw.size, files)
            })
            .collect();

        let summary = ScanSummary::from_groups(
            settings.root.clone(),
            report.tool_version,
            &groups,
            elapsed,
        );

        log::info!(
            "fclones finished in {:.2}s: {} group(s), {} redundant file(s)",
            elapsed.as_secs_f64(),
            summary.duplicate_groups,
            summary.duplicate_files
        );

        Ok(ScanOutcome { groups, summary })
    }

    /// Probe the tool with `--version`.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError`] if the tool cannot be run or exits unsuccessfully.
    pub fn version(&self) -> Result<String, ScanError> {
        let command = FclonesCommand::version(&self.config);
        let output = self.execute(&command)?;
        let text = String::from_utf8_lossy(&output.stdout);
        let line = text.lines().next().unwrap_or_default().trim();
        Ok(line.strip_prefix("fclones").map_or(line, str::trim).to_string())
    }

    fn execute(&self, command: &FclonesCommand) -> Result<Output, ScanError> {
        let program: PathBuf = command.program().to_path_buf();
        let output = command
            .to_command()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                if e.kind() == ErrorKind::NotFound {
                    ScanError::ToolNotFound(program.clone())
                } else {
                    ScanError::Spawn {
                        program: program.clone(),
                        source: e,
                    }
                }
            })?;

        if !output.status.success() {
            let stderr = stderr_tail(&String::from_utf8_lossy(&output.stderr));
            log::error!(
                "'{}' failed with status {}: {}",
                command.display(),
                output.status,
                stderr
            );
            return Err(ScanError::ToolFailed {
                program,
                code: output.status.code(),
                stderr,
            });
        }

        if !output.stderr.is_empty() {
            log::debug!(
                "fclones stderr:\n{}",
                String::from_utf8_lossy(&output.stderr).trim_end()
            );
        }

        Ok(output)
    }
}

/// Last [`STDERR_TAIL_LINES`] non-empty lines of the tool's stderr.
fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr
        .lines()
        .map(str::trim_end)
        .filter(|l| !l.is_empty())
        .collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}
