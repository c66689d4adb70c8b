//! Browser front-end.
//!
//! A small axum application: a login gate, the scan settings panel, the
//! duplicate review with keep-strategies and checkboxes, and the two-step
//! delete. Pages are rendered server-side with askama and every action is a
//! plain form POST, so no JavaScript is required.

pub mod handlers;
pub mod session;
pub mod views;

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use anyhow::Context;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;

use crate::actions::{DeleteConfig, ProtectedPaths};
use crate::auth::{CredentialStore, SessionStore};
use crate::config::Config;
use crate::scan::FclonesRunner;

use session::WebSession;

/// How often expired sessions are swept.
const PURGE_INTERVAL: Duration = Duration::from_secs(60);

/// State shared by every request.
#[derive(Debug)]
pub struct AppState {
    /// Effective configuration
    pub config: Config,
    /// Login sessions and their review state
    pub sessions: SessionStore<WebSession>,
    /// fclones invocation settings
    pub runner: FclonesRunner,
    /// Locations that are never deleted from
    pub protected: ProtectedPaths,
    /// Trash or permanent deletion
    pub delete: DeleteConfig,
    credentials: Mutex<CredentialStore>,
}

impl AppState {
    /// Build the shared state from configuration and loaded credentials.
    #[must_use]
    pub fn new(config: Config, credentials: CredentialStore) -> Self {
        let ttl = Duration::from_secs(config.server.session_ttl_minutes.max(1) * 60);
        Self {
            sessions: SessionStore::new(ttl),
            runner: FclonesRunner::new(config.fclones.clone()),
            protected: ProtectedPaths::new(config.protected_paths.iter().cloned()),
            delete: DeleteConfig::from(config.delete),
            credentials: Mutex::new(credentials),
            config,
        }
    }

    /// Lock the credential store.
    pub fn credentials(&self) -> MutexGuard<'_, CredentialStore> {
        self.credentials.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/login", get(handlers::login_page).post(handlers::login))
        .route("/logout", post(handlers::logout))
        .route("/scan", post(handlers::scan))
        .route("/strategy", post(handlers::strategy))
        .route("/selection", post(handlers::selection))
        .route("/select-all", post(handlers::select_all))
        .route("/select-none", post(handlers::select_none))
        .route("/delete", post(handlers::delete_confirm_page))
        .route("/delete/confirm", post(handlers::delete))
        .route("/account", get(handlers::account_page).post(handlers::account))
        .route("/static/style.css", get(handlers::stylesheet))
        .with_state(state)
}

/// Serve until Ctrl+C.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve(state: Arc<AppState>, addr: SocketAddr) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    log::info!("Listening on http://{}", listener.local_addr()?);

    let sweeper_state = Arc::clone(&state);
    let sweeper = tokio::spawn(async move {
        let mut interval = tokio::time::interval(PURGE_INTERVAL);
        loop {
            interval.tick().await;
            sweeper_state.sessions.purge_expired();
        }
    });

    let result = axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error");

    sweeper.abort();
    log::info!("Server stopped");
    result
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    log::info!("Shutdown requested");
}
