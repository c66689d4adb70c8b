//! Application configuration management.
//!
//! Configuration is layered with [`figment`], lowest priority first:
//!
//! 1. Built-in defaults ([`Config::default`])
//! 2. TOML file: `--config PATH`, or `config.toml` in the platform config
//!    directory when present
//! 3. Environment variables prefixed with `DUPECLEANER_`; nested keys use a
//!    double underscore (`DUPECLEANER_SERVER__PORT=9000`)
//!
//! CLI flags are applied on top by the command handlers.
//!
//! # Example file
//!
//! ```toml
//! credentials_path = "/var/lib/dupecleaner/credentials.toml"
//! protected_paths = ["/etc", "/usr"]
//!
//! [server]
//! bind = "0.0.0.0"
//! port = 8501
//! session_ttl_minutes = 30
//!
//! [fclones]
//! path = "/usr/local/bin/fclones"
//! extra_args = ["--threads", "4"]
//!
//! [delete]
//! permanent = false
//!
//! [defaults]
//! root = "/srv/share"
//! min_size_kb = 4
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scan::ScanSettings;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "DUPECLEANER_";

/// Default web UI port.
pub const DEFAULT_PORT: u16 = 8501;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// A source could not be read or did not match the schema
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Invalid(Box::new(err))
    }
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server settings
    pub server: ServerConfig,
    /// External tool settings
    pub fclones: FclonesConfig,
    /// Deletion behaviour
    pub delete: DeleteSettings,
    /// Directories under which files are never deleted
    pub protected_paths: Vec<PathBuf>,
    /// Credentials file; defaults to `credentials.toml` in the config directory
    pub credentials_path: Option<PathBuf>,
    /// Append logs to this file instead of stderr
    pub log_file: Option<PathBuf>,
    /// Initial values of the scan settings panel
    pub defaults: ScanSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            fclones: FclonesConfig::default(),
            delete: DeleteSettings::default(),
            protected_paths: default_protected_paths(),
            credentials_path: None,
            log_file: None,
            defaults: ScanSettings::default(),
        }
    }
}

/// `[server]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind
    pub bind: String,
    /// Port to listen on
    pub port: u16,
    /// Idle timeout for login sessions
    pub session_ttl_minutes: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            session_ttl_minutes: 60,
        }
    }
}

/// `[fclones]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FclonesConfig {
    /// Binary to execute, looked up on `PATH` when not absolute
    pub path: PathBuf,
    /// Arguments appended to every `fclones group` call
    pub extra_args: Vec<String>,
    /// Honour `.gitignore`/`.fdignore` files instead of passing `--no-ignore`
    pub respect_ignore_files: bool,
}

impl Default for FclonesConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("fclones"),
            extra_args: Vec::new(),
            respect_ignore_files: false,
        }
    }
}

/// `[delete]` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeleteSettings {
    /// Delete permanently instead of moving to the system trash
    pub permanent: bool,
    /// Refuse files whose modification time changed since the scan
    pub verify_mtime: bool,
}

impl Default for DeleteSettings {
    fn default() -> Self {
        Self {
            permanent: false,
            verify_mtime: true,
        }
    }
}

/// Operating-system directories that are protected by default.
#[must_use]
pub fn default_protected_paths() -> Vec<PathBuf> {
    #[cfg(windows)]
    {
        let mut paths: Vec<PathBuf> = [
            "WINDIR",
            "SYSTEMROOT",
            "PROGRAMFILES",
            "PROGRAMFILES(X86)",
            "PROGRAMDATA",
        ]
        .iter()
        .filter_map(|var| std::env::var_os(var))
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .collect();
        if paths.is_empty() {
            paths.push(PathBuf::from(r"C:\Windows"));
        }
        paths.dedup();
        paths
    }

    #[cfg(target_os = "macos")]
    {
        ["/System", "/Library", "/bin", "/sbin", "/usr", "/private/etc"]
            .iter()
            .map(PathBuf::from)
            .collect()
    }

    #[cfg(not(any(windows, target_os = "macos")))]
    {
        [
            "/bin", "/boot", "/dev", "/etc", "/lib", "/lib64", "/proc", "/sbin", "/sys", "/usr",
        ]
        .iter()
        .map(PathBuf::from)
        .collect()
    }
}

impl Config {
    /// Load configuration from defaults, the config file and the environment.
    ///
    /// With `path` set, that file must exist. Without it, the platform
    /// default `config.toml` is read if present.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if an explicit file is missing or any source
    /// fails to parse.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = Self::resolve_file(path)?;
        Self::load_file(file.as_deref())
    }

    /// The config file to read: `path` if given, else the platform default
    /// when it exists.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] if an explicit file is missing.
    pub fn resolve_file(path: Option<&Path>) -> Result<Option<PathBuf>, ConfigError> {
        match path {
            Some(path) if !path.is_file() => Err(ConfigError::NotFound(path.to_path_buf())),
            Some(path) => Ok(Some(path.to_path_buf())),
            None => Ok(Self::default_path().filter(|p| p.is_file())),
        }
    }

    /// Extract the layered configuration from an already resolved file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if any source fails to parse.
    pub fn load_file(file: Option<&Path>) -> Result<Self, ConfigError> {
        Ok(Self::figment(file).extract()?)
    }

    /// Build the layered figment for an optional TOML file.
    #[must_use]
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(file) = file {
            figment = figment.merge(Toml::file(file));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Platform-specific default config file path.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Resolved credentials file path.
    ///
    /// Falls back to `./credentials.toml` when the platform has no config
    /// directory.
    #[must_use]
    pub fn credentials_path(&self) -> PathBuf {
        self.credentials_path.clone().unwrap_or_else(|| {
            project_dirs()
                .map(|dirs| dirs.config_dir().join("credentials.toml"))
                .unwrap_or_else(|| PathBuf::from("credentials.toml"))
        })
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "dupecleaner", "dupecleaner")
}
