//! Stored login credentials.
//!
//! A single username and an Argon2id password hash (PHC string) are kept in
//! a small TOML file:
//!
//! ```toml
//! username = "admin"
//! password_hash = "$argon2id$v=19$m=19456,t=2,p=1$..."
//! updated_at = "2024-05-01T10:00:00Z"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, Utc};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

use super::{AuthError, PASSWORD_MIN_LENGTH};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredCredentials {
    username: String,
    password_hash: String,
    updated_at: DateTime<Utc>,
}

/// Credential file plus its parsed contents.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
    stored: Option<StoredCredentials>,
}

impl CredentialStore {
    /// Load credentials from `path`. A missing file yields an uninitialised
    /// store.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Io`] if the file cannot be read and
    /// [`AuthError::Parse`] if it is not a valid credentials file.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, AuthError> {
        let path = path.into();
        if !path.exists() {
            log::debug!("No credentials file at {}", path.display());
            return Ok(Self { path, stored: None });
        }

        let content = fs::read_to_string(&path).map_err(|source| AuthError::Io {
            path: path.clone(),
            source,
        })?;
        let stored: StoredCredentials = toml::from_str(&content)?;
        // Reject files whose hash cannot be parsed now, not at first login.
        PasswordHash::new(&stored.password_hash).map_err(|e| AuthError::Hash(e.to_string()))?;

        log::debug!("Loaded credentials for '{}'", stored.username);
        Ok(Self {
            path,
            stored: Some(stored),
        })
    }

    /// Credentials file location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a username and password have been set.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.stored.is_some()
    }

    /// Stored username, if initialised.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.stored.as_ref().map(|s| s.username.as_str())
    }

    /// Time of the last credential change.
    #[must_use]
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.stored.as_ref().map(|s| s.updated_at)
    }

    /// Replace the stored credentials and write them to disk.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidUsername`] or
    /// [`AuthError::PasswordTooShort`] on invalid input, and I/O or hashing
    /// errors otherwise. On error the previous credentials stay in effect.
    pub fn set(&mut self, username: &str, password: &str) -> Result<(), AuthError> {
        let username = username.trim();
        validate(username, password)?;

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::Hash(e.to_string()))?
            .to_string();

        let stored = StoredCredentials {
            username: username.to_string(),
            password_hash,
            updated_at: Utc::now(),
        };
        self.persist(&stored)?;
        self.stored = Some(stored);

        log::info!("Credentials updated for '{}'", username);
        Ok(())
    }

    /// Check a username/password pair. An uninitialised store never verifies.
    #[must_use]
    pub fn verify(&self, username: &str, password: &str) -> bool {
        let Some(stored) = &self.stored else {
            return false;
        };
        let Ok(hash) = PasswordHash::new(&stored.password_hash) else {
            log::error!("Stored password hash is malformed");
            return false;
        };
        let password_ok = Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok();
        password_ok && stored.username == username.trim()
    }

    /// Change credentials after re-checking the current password.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] if `current_password` does
    /// not verify for the stored username, and any error from [`Self::set`].
    pub fn change(
        &mut self,
        current_password: &str,
        new_username: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let current_user = self.username().ok_or(AuthError::NotInitialized)?.to_string();
        if !self.verify(&current_user, current_password) {
            log::warn!("Credential change rejected: wrong current password");
            return Err(AuthError::InvalidCredentials);
        }
        self.set(new_username, new_password)
    }

    fn persist(&self, stored: &StoredCredentials) -> Result<(), AuthError> {
        let io_err = |source: std::io::Error| AuthError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let content = toml::to_string_pretty(stored)?;
        let tmp = self.path.with_extension("toml.tmp");
        fs::write(&tmp, content).map_err(io_err)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&tmp, fs::Permissions::from_mode(0o600)).map_err(io_err)?;
        }

        fs::rename(&tmp, &self.path).map_err(io_err)?;
        Ok(())
    }
}

fn validate(username: &str, password: &str) -> Result<(), AuthError> {
    if username.is_empty() {
        return Err(AuthError::InvalidUsername);
    }
    if password.chars().count() < PASSWORD_MIN_LENGTH {
        return Err(AuthError::PasswordTooShort {
            min: PASSWORD_MIN_LENGTH,
        });
    }
    Ok(())
}
