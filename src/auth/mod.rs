//! Authentication gate.
//!
//! - [`credentials`]: the single stored username and its Argon2id hash
//! - [`sessions`]: token-keyed login sessions with an idle timeout

pub mod credentials;
pub mod sessions;

use std::path::PathBuf;

use thiserror::Error;

pub use credentials::CredentialStore;
pub use sessions::{Session, SessionStore};

/// Minimum password length in characters.
pub const PASSWORD_MIN_LENGTH: usize = 8;

/// Errors raised by credential handling.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No credentials have been set yet
    #[error("No credentials configured. Run `dupecleaner set-password --username <NAME>` first")]
    NotInitialized,

    /// Username was empty
    #[error("Username must not be empty")]
    InvalidUsername,

    /// Password was too short
    #[error("Password must be at least {min} characters")]
    PasswordTooShort {
        /// Minimum length
        min: usize,
    },

    /// Username or password did not match
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Password hashing or hash parsing failed
    #[error("Password hash error: {0}")]
    Hash(String),

    /// Credentials file could not be read or written
    #[error("Credentials file {path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Credentials file is not valid TOML
    #[error("Invalid credentials file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Credentials could not be serialised
    #[error("Could not encode credentials: {0}")]
    Encode(#[from] toml::ser::Error),
}
