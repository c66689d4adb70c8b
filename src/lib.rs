//! DupeCleaner - web front-end for the fclones duplicate file finder.
//!
//! fclones does the scanning; this crate runs it, parses its report, lets a
//! logged-in user pick which copies to keep (automatically via a keep-strategy
//! or by hand) and deletes the rest, to the trash by default.

pub mod actions;
pub mod auth;
pub mod cli;
pub mod commands;
pub mod config;
pub mod duplicates;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;
pub mod scan;
pub mod selection;
pub mod web;

use cli::{Cli, Commands};
use config::Config;
use error::ExitCode;
use logging::LogOptions;

/// Load configuration, set up logging and run the chosen subcommand.
///
/// # Errors
///
/// Returns any configuration, logging or command error.
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    let config_file = Config::resolve_file(cli.config.as_deref())?;
    let config = Config::load_file(config_file.as_deref())?;

    if cli.no_color {
        yansi::disable();
    }
    logging::init_logging(&LogOptions {
        verbose: cli.verbose,
        quiet: cli.quiet,
        no_color: cli.no_color,
        log_file: config.log_file.clone(),
    })?;

    match &config_file {
        Some(file) => log::debug!("Loaded config from {}", file.display()),
        None => log::debug!("No config file, using defaults and environment"),
    }

    match cli.command {
        Commands::Serve(args) => commands::serve(config, &args),
        Commands::Scan(args) => commands::scan(&config, &args, cli.quiet),
        Commands::SetPassword(args) => commands::set_password(&config, &args),
        Commands::Check => commands::check(&config),
    }
}
