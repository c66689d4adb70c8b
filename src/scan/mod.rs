//! External duplicate-finder integration.
//!
//! Everything that touches the `fclones` binary lives here:
//!
//! - [`settings`]: user-facing scan parameters and their normalisation
//! - [`command`]: translation of settings into a `fclones group` invocation
//! - [`runner`]: process execution and error mapping
//! - [`parser`]: JSON and text report parsing
//! - [`cloud`]: cloud-sync folder detection for the settings panel

pub mod cloud;
pub mod command;
pub mod parser;
pub mod runner;
pub mod settings;

use std::path::PathBuf;

use thiserror::Error;

pub use cloud::CloudProvider;
pub use command::FclonesCommand;
pub use parser::{parse_report, ParseError, Report, ReportGroup};
pub use runner::{FclonesRunner, ScanOutcome};
pub use settings::ScanSettings;

/// Errors that can occur while running a scan.
#[derive(Debug, Error)]
pub enum ScanError {
    /// The scan root does not exist
    #[error("Path not found: {0}")]
    RootNotFound(PathBuf),

    /// The scan root is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The fclones binary could not be located
    #[error("fclones not found at '{0}'. Install it (cargo install fclones) or set fclones.path in the config file")]
    ToolNotFound(PathBuf),

    /// The process could not be started
    #[error("Failed to start {program}: {source}")]
    Spawn {
        /// Program that was executed
        program: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The process exited unsuccessfully
    #[error("{program} {}: {stderr}", exit_description(.code))]
    ToolFailed {
        /// Program that was executed
        program: PathBuf,
        /// Exit code, `None` if terminated by a signal
        code: Option<i32>,
        /// Trimmed tail of stderr
        stderr: String,
    },

    /// The output could not be parsed
    #[error("Could not read fclones output: {0}")]
    Parse(#[from] ParseError),
}

fn exit_description(code: &Option<i32>) -> String {
    match *code {
        Some(code) => format!("exited with status {code}"),
        None => "was terminated by a signal".to_string(),
    }
}
