//! Logging setup.
//!
//! Uses the `log` facade with the `env_logger` backend. The level comes from
//! (in priority order):
//!
//! 1. `RUST_LOG` environment variable (if set)
//! 2. CLI flags: `--quiet` (error only) or `--verbose` (debug/trace)
//! 3. Default: info level
//!
//! Debug builds prefix every line with a timestamp, and module paths from
//! `-v` on; release builds print level and message only. When a log file is
//! configured, output is appended there without colour.
//!
//! ```rust,no_run
//! use dupecleaner::logging::{init_logging, LogOptions};
//!
//! init_logging(&LogOptions { verbose: 1, ..LogOptions::default() }).unwrap();
//! log::debug!("Debug info here");
//! ```

use std::env;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use env_logger::{Builder, Target, WriteStyle};
use log::LevelFilter;

/// Logging switches gathered from the command line and configuration.
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    /// Verbosity count (0=info, 1=debug, 2+=trace)
    pub verbose: u8,
    /// Errors only
    pub quiet: bool,
    /// Disable ANSI colours on stderr
    pub no_color: bool,
    /// Append to this file instead of stderr
    pub log_file: Option<PathBuf>,
}

/// Initialize the logger. Call once, before any logging.
///
/// # Errors
///
/// Returns an error if the log file cannot be opened or a logger is already
/// installed.
pub fn init_logging(options: &LogOptions) -> anyhow::Result<()> {
    let use_env = env::var("RUST_LOG").is_ok();

    let mut builder = Builder::new();
    if use_env {
        builder.parse_default_env();
    } else {
        builder.filter_level(determine_level(options.verbose, options.quiet));
    }

    if let Some(path) = &options.log_file {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        builder.target(Target::Pipe(Box::new(file)));
        builder.write_style(WriteStyle::Never);
    } else if options.no_color {
        builder.write_style(WriteStyle::Never);
    }

    configure_format(&mut builder, options.verbose);
    builder.try_init()?;

    log::debug!(
        "Logging initialized at level {} ({})",
        current_level_name(),
        if use_env { "RUST_LOG" } else { "flags" }
    );
    Ok(())
}

fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

fn configure_format(builder: &mut Builder, verbose: u8) {
    #[cfg(debug_assertions)]
    {
        builder.format(move |buf, record| {
            let timestamp = buf.timestamp_seconds();
            let level = record.level();
            let level_style = buf.default_level_style(level);

            if verbose >= 1 {
                writeln!(
                    buf,
                    "{} {level_style}{:<5}{level_style:#} [{}] {}",
                    timestamp,
                    level,
                    record.module_path().unwrap_or("unknown"),
                    record.args()
                )
            } else {
                writeln!(
                    buf,
                    "{} {level_style}{:<5}{level_style:#} {}",
                    timestamp,
                    level,
                    record.args()
                )
            }
        });
    }

    #[cfg(not(debug_assertions))]
    {
        let _ = verbose;
        builder.format(|buf, record| {
            let level = record.level();
            let level_style = buf.default_level_style(level);
            writeln!(
                buf,
                "{level_style}{:<5}{level_style:#} {}",
                level,
                record.args()
            )
        });
    }
}

/// Name of the active maximum level.
pub fn current_level_name() -> &'static str {
    match log::max_level() {
        LevelFilter::Off => "off",
        LevelFilter::Error => "error",
        LevelFilter::Warn => "warn",
        LevelFilter::Info => "info",
        LevelFilter::Debug => "debug",
        LevelFilter::Trace => "trace",
    }
}
