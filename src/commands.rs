//! Subcommand implementations.

use std::io::{self, BufRead, IsTerminal, Write};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use anyhow::{bail, Context};

use crate::actions::DeleteConfig;
use crate::auth::{AuthError, CredentialStore};
use crate::cli::{ScanArgs, ServeArgs, SetPasswordArgs};
use crate::config::Config;
use crate::error::ExitCode;
use crate::output::{CsvOutput, JsonOutput, OutputFormat, TextOutput};
use crate::progress::Spinner;
use crate::scan::{CloudProvider, FclonesRunner, ScanSettings};
use crate::selection::ReviewState;
use crate::web::{self, AppState};

/// Run the web interface until Ctrl+C.
///
/// # Errors
///
/// Fails when no credentials are configured, the credentials file is
/// unreadable, or the server cannot start.
pub fn serve(mut config: Config, args: &ServeArgs) -> anyhow::Result<ExitCode> {
    if let Some(bind) = args.bind {
        config.server.bind = bind.to_string();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if args.permanent {
        config.delete.permanent = true;
    } else if args.trash {
        config.delete.permanent = false;
    }

    let credentials = CredentialStore::load(config.credentials_path())?;
    if !credentials.is_initialized() {
        return Err(AuthError::NotInitialized.into());
    }

    let runner = FclonesRunner::new(config.fclones.clone());
    match runner.version() {
        Ok(version) => log::info!("Using fclones {}", version),
        Err(e) => log::warn!("{} (scans will fail until this is fixed)", e),
    }

    let ip: IpAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("Invalid bind address '{}'", config.server.bind))?;
    let addr = SocketAddr::new(ip, config.server.port);
    log::info!(
        "Deleted files will be {}",
        DeleteConfig::from(config.delete).mode_label()
    );

    let state = Arc::new(AppState::new(config, credentials));
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;
    runtime.block_on(web::serve(state, addr))?;

    Ok(ExitCode::Success)
}

/// Merge command-line overrides onto the configured panel defaults.
#[must_use]
pub fn scan_settings(defaults: &ScanSettings, args: &ScanArgs) -> ScanSettings {
    let mut settings = defaults.clone();
    settings.root = args.path.clone();
    if let Some(kb) = args.min_size_kb() {
        settings.min_size_kb = kb;
    }
    if let Some(extensions) = &args.extensions {
        settings.extensions = extensions.clone();
    }
    if let Some(exclude) = &args.exclude {
        settings.exclude_dirs = exclude.clone();
    }
    settings.scan_hidden |= args.hidden;
    settings.follow_symlinks |= args.follow_symlinks;
    settings
}

/// Scan once and print the groups with the strategy's selection.
///
/// # Errors
///
/// Returns the scan error or an output error.
pub fn scan(config: &Config, args: &ScanArgs, quiet: bool) -> anyhow::Result<ExitCode> {
    let settings = scan_settings(&config.defaults, args);

    if let Some(provider) = CloudProvider::detect(&settings.root) {
        for warning in provider.warnings() {
            log::warn!("{}", warning);
        }
    }

    let runner = FclonesRunner::new(config.fclones.clone());
    let show_spinner = !quiet && args.output == OutputFormat::Text && io::stderr().is_terminal();
    let spinner = Spinner::start(&settings.root.to_string_lossy(), !show_spinner);
    let outcome = match runner.run(&settings) {
        Ok(outcome) => {
            spinner.clear();
            outcome
        }
        Err(e) => {
            spinner.clear();
            return Err(e.into());
        }
    };

    let exit_code = if outcome.groups.is_empty() {
        ExitCode::NoDuplicates
    } else {
        ExitCode::Success
    };
    let review = ReviewState::new(outcome.groups, args.strategy);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match args.output {
        OutputFormat::Text => {
            if review.groups().is_empty() {
                writeln!(out, "No duplicate files found in {}", settings.root.display())?;
            } else {
                TextOutput::new(&review, &outcome.summary).write_to(&mut out)?;
            }
        }
        OutputFormat::Json => {
            JsonOutput::new(&review, &outcome.summary, exit_code).write_to(&mut out)?;
        }
        OutputFormat::Csv => CsvOutput::new(&review).write_to(&mut out)?,
    }
    out.flush()?;

    Ok(exit_code)
}

/// Store new credentials, replacing any existing ones.
///
/// # Errors
///
/// Returns an error for an empty username, a short password, or an
/// unwritable credentials file.
pub fn set_password(config: &Config, args: &SetPasswordArgs) -> anyhow::Result<ExitCode> {
    let password = match &args.password {
        Some(password) => password.clone(),
        None => read_password()?,
    };

    let mut store = CredentialStore::load(config.credentials_path())?;
    let replacing = store.is_initialized();
    store.set(&args.username, &password)?;

    log::info!(
        "{} credentials for '{}' in {}",
        if replacing { "Replaced" } else { "Stored" },
        args.username.trim(),
        store.path().display()
    );
    Ok(ExitCode::Success)
}

fn read_password() -> anyhow::Result<String> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        eprint!("New password: ");
        io::stderr().flush()?;
    }
    let mut line = String::new();
    stdin
        .lock()
        .read_line(&mut line)
        .context("Failed to read password from stdin")?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        bail!("No password given; pass --password or pipe it on stdin");
    }
    Ok(password)
}

/// Print the fclones version and the effective setup.
///
/// # Errors
///
/// Returns the scan error when fclones cannot be run.
pub fn check(config: &Config) -> anyhow::Result<ExitCode> {
    let runner = FclonesRunner::new(config.fclones.clone());
    let version = runner.version()?;

    let credentials = CredentialStore::load(config.credentials_path())?;
    println!("fclones:      {} ({})", version, config.fclones.path.display());
    println!(
        "credentials:  {}",
        match credentials.username() {
            Some(user) => format!("'{}' in {}", user, credentials.path().display()),
            None => "not configured (run `dupecleaner set-password`)".to_string(),
        }
    );
    println!(
        "deletion:     files are {}",
        DeleteConfig::from(config.delete).mode_label()
    );
    println!(
        "listen:       {}:{}",
        config.server.bind, config.server.port
    );

    Ok(ExitCode::Success)
}
