//! Command-line interface.
//!
//! Global options (verbosity, colour, error format, config file) apply to
//! every subcommand.
//!
//! ```bash
//! # Create the login, then start the web UI
//! dupecleaner set-password --username admin
//! dupecleaner serve --port 8501
//!
//! # Headless scan that prints which copies the strategy would delete
//! dupecleaner scan ~/Downloads --min-size 1MiB --strategy newest --output json
//!
//! # Check that fclones can be run
//! dupecleaner check
//! ```

use std::net::IpAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::output::OutputFormat;
use crate::scan::settings::MAX_MIN_SIZE_KB;
use crate::selection::KeepStrategy;

/// Web front-end for the fclones duplicate file finder.
#[derive(Debug, Parser)]
#[command(name = "dupecleaner")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Print errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Configuration file (default: platform config dir `config.toml`)
    #[arg(long, global = true, value_name = "PATH", env = "DUPECLEANER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the web interface
    Serve(ServeArgs),
    /// Scan a directory once and print the duplicate groups
    Scan(ScanArgs),
    /// Set or reset the login credentials
    SetPassword(SetPasswordArgs),
    /// Check that fclones can be run and print its version
    Check,
}

/// Arguments for `serve`.
#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Address to listen on (overrides `server.bind`)
    #[arg(long, value_name = "ADDR")]
    pub bind: Option<IpAddr>,

    /// Port to listen on (overrides `server.port`)
    #[arg(short, long, value_name = "N")]
    pub port: Option<u16>,

    /// Move deleted files to the trash even if `delete.permanent` is set
    #[arg(long, conflicts_with = "permanent")]
    pub trash: bool,

    /// Delete files permanently instead of moving them to the trash
    #[arg(long)]
    pub permanent: bool,
}

/// Arguments for `scan`.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// Directory to scan
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Minimum file size (e.g. 100KiB, 1MB); rounded up to whole KiB, at most 1000 KiB
    #[arg(long, value_name = "SIZE", value_parser = parse_size)]
    pub min_size: Option<u64>,

    /// Comma-separated extensions to include, e.g. ".jpg,.png" (".*" for all)
    #[arg(long = "ext", value_name = "LIST")]
    pub extensions: Option<String>,

    /// Comma-separated directory names or absolute paths to skip
    #[arg(long, value_name = "LIST")]
    pub exclude: Option<String>,

    /// Include hidden files and directories
    #[arg(long)]
    pub hidden: bool,

    /// Follow symbolic links
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Keep-strategy used to mark copies for deletion
    #[arg(short, long, value_enum, value_name = "STRATEGY")]
    pub strategy: Option<KeepStrategy>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub output: OutputFormat,
}

impl ScanArgs {
    /// `--min-size` in KiB as used by the settings panel.
    #[must_use]
    pub fn min_size_kb(&self) -> Option<u64> {
        self.min_size
            .map(|bytes| bytes.div_ceil(1024).min(MAX_MIN_SIZE_KB))
    }
}

/// Arguments for `set-password`.
#[derive(Debug, Args)]
pub struct SetPasswordArgs {
    /// Login username
    #[arg(short, long)]
    pub username: String,

    /// New password; read from stdin when omitted
    #[arg(short, long, env = "DUPECLEANER_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

/// Parse a human-readable size string into bytes.
///
/// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB, TB, TiB
/// Case-insensitive. Numbers without suffix are treated as bytes.
///
/// # Examples
///
/// ```
/// use dupecleaner::cli::parse_size;
///
/// assert_eq!(parse_size("1024").unwrap(), 1024);
/// assert_eq!(parse_size("1KB").unwrap(), 1000);
/// assert_eq!(parse_size("1KiB").unwrap(), 1024);
/// assert_eq!(parse_size("1MB").unwrap(), 1_000_000);
/// assert_eq!(parse_size("1MiB").unwrap(), 1_048_576);
/// ```
/// # Errors
///
/// Returns an error if the string is empty, contains an invalid number,
/// a negative number, or an unknown size suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }

    // Find where the number ends and the suffix begins
    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;

    if num < 0.0 {
        return Err("Size cannot be negative".to_string());
    }

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1_000,
        "KIB" => 1_024,
        "MB" | "M" => 1_000_000,
        "MIB" => 1_048_576,
        "GB" | "G" => 1_000_000_000,
        "GIB" => 1_073_741_824,
        "TB" | "T" => 1_000_000_000_000,
        "TIB" => 1_099_511_627_776,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    Ok((num * multiplier as f64) as u64)
}
