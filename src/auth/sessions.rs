//! In-memory login sessions keyed by random tokens.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;

/// Random bytes per session token.
const TOKEN_BYTES: usize = 32;

/// A live login session carrying per-user state `T`.
#[derive(Debug)]
pub struct Session<T> {
    /// Logged-in username
    pub username: String,
    /// Per-session application state
    pub data: T,
    last_seen: Instant,
}

/// Thread-safe session table with an idle timeout.
#[derive(Debug)]
pub struct SessionStore<T> {
    sessions: Mutex<HashMap<String, Session<T>>>,
    ttl: Duration,
}

impl<T> SessionStore<T> {
    /// Create an empty store whose sessions expire after `ttl` of inactivity.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    /// Idle timeout.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Start a session and return its token.
    pub fn create(&self, username: impl Into<String>, data: T) -> String {
        let token = generate_token();
        let username = username.into();
        let mut sessions = self.lock();
        purge(&mut sessions, self.ttl);
        log::info!("Session started for '{}'", username);
        sessions.insert(
            token.clone(),
            Session {
                username,
                data,
                last_seen: Instant::now(),
            },
        );
        token
    }

    /// Run `f` on a live session and refresh its idle timer.
    ///
    /// Returns `None` for unknown or expired tokens; expired sessions are
    /// removed.
    pub fn with_session<R>(&self, token: &str, f: impl FnOnce(&mut Session<T>) -> R) -> Option<R> {
        let mut sessions = self.lock();
        let now = Instant::now();
        let expired = match sessions.get(token) {
            Some(session) => now.duration_since(session.last_seen) > self.ttl,
            None => return None,
        };
        if expired {
            if let Some(session) = sessions.remove(token) {
                log::info!("Session for '{}' expired", session.username);
            }
            return None;
        }
        let session = sessions.get_mut(token)?;
        session.last_seen = now;
        Some(f(session))
    }

    /// Check whether `token` names a live session.
    #[must_use]
    pub fn is_valid(&self, token: &str) -> bool {
        self.with_session(token, |_| ()).is_some()
    }

    /// End a session. Returns whether it existed.
    pub fn remove(&self, token: &str) -> bool {
        let removed = self.lock().remove(token);
        if let Some(session) = &removed {
            log::info!("Session ended for '{}'", session.username);
        }
        removed.is_some()
    }

    /// End every session except `keep`. Returns how many were removed.
    pub fn retain_only(&self, keep: &str) -> usize {
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|token, _| token == keep);
        before - sessions.len()
    }

    /// Drop expired sessions. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        purge(&mut self.lock(), self.ttl)
    }

    /// Number of stored sessions, including not yet purged expired ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check if no sessions are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Session<T>>> {
        // A panic while holding the lock leaves the map itself intact.
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn purge<T>(sessions: &mut HashMap<String, Session<T>>, ttl: Duration) -> usize {
    let before = sessions.len();
    let now = Instant::now();
    sessions.retain(|_, s| now.duration_since(s.last_seen) <= ttl);
    let removed = before - sessions.len();
    if removed > 0 {
        log::debug!("Purged {} expired session(s)", removed);
    }
    removed
}

fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
