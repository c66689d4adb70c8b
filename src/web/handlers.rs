//! Route handlers.
//!
//! Every state-changing route is a form POST answered with a redirect
//! (post/redirect/get); results and errors travel to the next page as flash
//! messages. Only template failures produce an error status.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use askama::Template;
use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Form;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;

use crate::actions::delete_selection;
use crate::scan::settings::MAX_MIN_SIZE_KB;
use crate::scan::ScanSettings;
use crate::selection::{missing_from_disk, KeepStrategy, ReviewState};

use super::session::{Flash, WebSession};
use super::views::{AccountPage, ConfirmPage, IndexPage, LoginPage};
use super::AppState;

/// Name of the login cookie.
pub const SESSION_COOKIE: &str = "dupecleaner_session";

/// Failures listed individually after a deletion; the rest are counted.
const MAX_FAILURE_FLASHES: usize = 10;

const STYLE_CSS: &str = include_str!("../../static/style.css");

type AppStateRef = State<Arc<AppState>>;

/// A request from a logged-in browser.
///
/// Extraction fails with a redirect to `/login` when the cookie is missing
/// or names an expired session.
#[derive(Debug, Clone)]
pub struct AuthSession {
    /// Session token from the cookie
    pub token: String,
    /// Logged-in username
    pub username: String,
}

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for AuthSession {
    type Rejection = Redirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(SESSION_COOKIE)
            .map(|c| c.value().to_string())
            .ok_or_else(|| Redirect::to("/login"))?;

        state
            .sessions
            .with_session(&token, |s| s.username.clone())
            .map(|username| Self { token, username })
            .ok_or_else(|| Redirect::to("/login"))
    }
}

fn render(page: &impl Template) -> Response {
    match page.render() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            log::error!("Template rendering failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
        }
    }
}

fn session_expired() -> Response {
    Redirect::to("/login").into_response()
}

fn with_web_session<R>(
    state: &AppState,
    auth: &AuthSession,
    f: impl FnOnce(&mut WebSession) -> R,
) -> Option<R> {
    state.sessions.with_session(&auth.token, |s| f(&mut s.data))
}

/// Apply `f` to the session and redirect to `to`.
fn update_and_redirect(
    state: &AppState,
    auth: &AuthSession,
    to: &str,
    f: impl FnOnce(&mut WebSession),
) -> Response {
    match with_web_session(state, auth, f) {
        Some(()) => Redirect::to(to).into_response(),
        None => session_expired(),
    }
}

/// Drop files that vanished from disk since the scan.
///
/// Paths are copied out under the session lock and stat'ed on the blocking
/// pool. Returns `None` when the session expired.
async fn prune_vanished(state: &AppState, auth: &AuthSession) -> Option<()> {
    let paths = with_web_session(state, auth, |s| s.review.as_ref().map(ReviewState::file_paths))?;
    let Some(paths) = paths.filter(|p| !p.is_empty()) else {
        return Some(());
    };

    let missing = tokio::task::spawn_blocking(move || missing_from_disk(&paths))
        .await
        .unwrap_or_else(|e| {
            log::error!("Missing-file check failed: {}", e);
            Vec::new()
        });
    if missing.is_empty() {
        return Some(());
    }

    with_web_session(state, auth, |s| {
        let pruned = s.review.as_mut().map_or(0, |r| r.remove_deleted(&missing));
        if pruned > 0 {
            s.flash(Flash::warning(format!(
                "{pruned} file(s) no longer exist and were removed from the results"
            )));
        }
    })
}

// ==================== Login ====================

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

pub async fn login_page(State(state): AppStateRef, jar: CookieJar) -> Response {
    let logged_in = jar
        .get(SESSION_COOKIE)
        .is_some_and(|c| state.sessions.is_valid(c.value()));
    if logged_in {
        return Redirect::to("/").into_response();
    }

    render(&LoginPage {
        error: String::new(),
        username: String::new(),
    })
}

pub async fn login(
    State(state): AppStateRef,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let username = form.username.trim().to_string();
    let store = state.credentials().clone();
    let candidate = username.clone();
    let verified = tokio::task::spawn_blocking(move || store.verify(&candidate, &form.password))
        .await
        .unwrap_or_else(|e| {
            log::error!("Password verification task failed: {}", e);
            false
        });

    if !verified {
        log::warn!("Failed login attempt for '{}'", username);
        let page = LoginPage {
            error: "Invalid username or password".to_string(),
            username,
        };
        return (StatusCode::UNAUTHORIZED, render(&page)).into_response();
    }

    let token = state
        .sessions
        .create(username, WebSession::new(state.config.defaults.clone()));
    let cookie = Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict);

    (jar.add(cookie), Redirect::to("/")).into_response()
}

pub async fn logout(State(state): AppStateRef, jar: CookieJar) -> Response {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.sessions.remove(cookie.value());
    }
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Redirect::to("/login")).into_response()
}

// ==================== Main page ====================

pub async fn index(State(state): AppStateRef, auth: AuthSession) -> Response {
    if prune_vanished(&state, &auth).await.is_none() {
        return session_expired();
    }

    let page = with_web_session(&state, &auth, |s| {
        let flashes = s.take_flashes();
        IndexPage::new(
            &auth.username,
            flashes,
            &s.settings,
            s.review.as_ref(),
            s.summary.as_ref(),
            &state.delete,
        )
    });

    match page {
        Some(page) => render(&page),
        None => session_expired(),
    }
}

pub async fn stylesheet() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], STYLE_CSS)
}

// ==================== Scan ====================

#[derive(Debug, Deserialize)]
pub struct ScanForm {
    #[serde(default)]
    pub root: String,
    #[serde(default)]
    pub min_size_kb: String,
    #[serde(default)]
    pub extensions: String,
    #[serde(default)]
    pub exclude_dirs: String,
    /// Checkbox: present when ticked
    #[serde(default)]
    pub scan_hidden: Option<String>,
    /// Checkbox: present when ticked
    #[serde(default)]
    pub follow_symlinks: Option<String>,
}

impl ScanForm {
    /// Convert the submitted panel into settings.
    ///
    /// # Errors
    ///
    /// Returns a message for an empty root or a non-numeric size.
    pub fn into_settings(self) -> Result<ScanSettings, String> {
        let root = self.root.trim();
        if root.is_empty() {
            return Err("Please enter a directory to scan".to_string());
        }

        let size = self.min_size_kb.trim();
        let min_size_kb = if size.is_empty() {
            0
        } else {
            size.parse::<u64>().map_err(|_| {
                format!("Minimum size must be a whole number of KB between 0 and {MAX_MIN_SIZE_KB}")
            })?
        };

        Ok(ScanSettings {
            root: PathBuf::from(root),
            min_size_kb: min_size_kb.min(MAX_MIN_SIZE_KB),
            extensions: self.extensions.trim().to_string(),
            exclude_dirs: self.exclude_dirs.trim().to_string(),
            scan_hidden: self.scan_hidden.is_some(),
            follow_symlinks: self.follow_symlinks.is_some(),
        })
    }
}

pub async fn scan(
    State(state): AppStateRef,
    auth: AuthSession,
    Form(form): Form<ScanForm>,
) -> Response {
    let settings = match form.into_settings() {
        Ok(settings) => settings,
        Err(message) => {
            return update_and_redirect(&state, &auth, "/", |s| s.flash(Flash::error(message)));
        }
    };

    if with_web_session(&state, &auth, |s| s.settings = settings.clone()).is_none() {
        return session_expired();
    }

    let runner = state.runner.clone();
    let scan_settings = settings.clone();
    let outcome = tokio::task::spawn_blocking(move || runner.run(&scan_settings)).await;

    update_and_redirect(&state, &auth, "/", move |s| match outcome {
        Ok(Ok(outcome)) => {
            let strategy = s.review.as_ref().and_then(ReviewState::strategy);
            let count = outcome.summary.duplicate_groups;
            s.review = Some(ReviewState::new(outcome.groups, strategy));
            s.summary = Some(outcome.summary);
            if count == 0 {
                s.flash(Flash::success("No duplicate files found"));
            } else {
                s.flash(Flash::success(format!("Found {count} duplicate group(s)")));
            }
        }
        Ok(Err(e)) => {
            log::error!("Scan of {} failed: {}", settings.root.display(), e);
            s.review = None;
            s.summary = None;
            s.flash(Flash::error(format!("Scan failed: {e}")));
        }
        Err(e) => {
            log::error!("Scan task failed: {}", e);
            s.flash(Flash::error("Scan failed unexpectedly"));
        }
    })
}

// ==================== Selection ====================

#[derive(Debug, Deserialize)]
pub struct StrategyForm {
    #[serde(default)]
    pub strategy: String,
}

/// Parse the strategy menu value; `none` or blank clears the strategy.
fn parse_strategy(value: &str) -> Result<Option<KeepStrategy>, String> {
    match value.trim() {
        "" | "none" => Ok(None),
        other => other.parse().map(Some),
    }
}

pub async fn strategy(
    State(state): AppStateRef,
    auth: AuthSession,
    Form(form): Form<StrategyForm>,
) -> Response {
    let parsed = parse_strategy(&form.strategy);
    update_and_redirect(&state, &auth, "/", |s| match parsed {
        Err(message) => s.flash(Flash::error(message)),
        Ok(strategy) => match s.review.as_mut() {
            Some(review) => review.set_strategy(strategy),
            None => s.flash(Flash::error("Run a scan first")),
        },
    })
}

/// Checkbox list; unticked boxes are simply absent.
#[derive(Debug, Default, Deserialize)]
pub struct SelectionForm {
    #[serde(default)]
    pub selected: Vec<PathBuf>,
}

pub async fn selection(
    State(state): AppStateRef,
    auth: AuthSession,
    axum_extra::extract::Form(form): axum_extra::extract::Form<SelectionForm>,
) -> Response {
    update_and_redirect(&state, &auth, "/", |s| {
        if let Some(review) = s.review.as_mut() {
            review.set_manual_selection(form.selected);
        }
    })
}

pub async fn select_all(State(state): AppStateRef, auth: AuthSession) -> Response {
    update_and_redirect(&state, &auth, "/", |s| {
        if let Some(review) = s.review.as_mut() {
            review.select_all();
            s.flash(Flash::warning(
                "Every copy is selected. Groups with no copy left are skipped when deleting.",
            ));
        }
    })
}

pub async fn select_none(State(state): AppStateRef, auth: AuthSession) -> Response {
    update_and_redirect(&state, &auth, "/", |s| {
        if let Some(review) = s.review.as_mut() {
            review.select_none();
        }
    })
}

// ==================== Delete ====================

/// First step: record the submitted checkboxes and show the confirmation.
///
/// Vanished files are pruned first so the page lists only files that exist.
pub async fn delete_confirm_page(
    State(state): AppStateRef,
    auth: AuthSession,
    axum_extra::extract::Form(form): axum_extra::extract::Form<SelectionForm>,
) -> Response {
    if prune_vanished(&state, &auth).await.is_none() {
        return session_expired();
    }

    let page = with_web_session(&state, &auth, |s| {
        let Some(review) = s.review.as_mut() else {
            s.flash(Flash::error("Run a scan first"));
            return None;
        };
        review.set_manual_selection(form.selected);
        if !review.has_selections() {
            s.flash(Flash::error("No files selected"));
            return None;
        }
        Some(ConfirmPage::new(
            &auth.username,
            review,
            &state.delete,
            &state.protected,
        ))
    });

    match page {
        Some(Some(page)) => render(&page),
        Some(None) => Redirect::to("/").into_response(),
        None => session_expired(),
    }
}

/// Second step: delete the files listed on the confirmation page.
///
/// The form carries the confirmed paths. If the session selection no longer
/// matches them, nothing is deleted.
pub async fn delete(
    State(state): AppStateRef,
    auth: AuthSession,
    axum_extra::extract::Form(form): axum_extra::extract::Form<SelectionForm>,
) -> Response {
    let confirmed: BTreeSet<PathBuf> = form.selected.into_iter().collect();
    if confirmed.is_empty() {
        return update_and_redirect(&state, &auth, "/", |s| {
            s.flash(Flash::error("No files selected"));
        });
    }

    let Some(review) = with_web_session(&state, &auth, |s| s.review.clone()) else {
        return session_expired();
    };
    let Some(review) = review.filter(|r| r.selected() == &confirmed) else {
        log::warn!("Selection changed after confirmation, nothing deleted");
        return update_and_redirect(&state, &auth, "/", |s| {
            s.flash(Flash::error(
                "The selection changed after it was confirmed. Nothing was deleted.",
            ));
        });
    };

    let worker_state = Arc::clone(&state);
    let result = tokio::task::spawn_blocking(move || {
        delete_selection(&review, &worker_state.delete, &worker_state.protected)
    })
    .await;

    update_and_redirect(&state, &auth, "/", move |s| match result {
        Ok(result) => {
            if let Some(review) = s.review.as_mut() {
                review.remove_deleted(&result.removed_paths());
            }
            let flash = if result.all_succeeded() {
                Flash::success(result.summary())
            } else {
                Flash::warning(result.summary())
            };
            s.flash(flash);
            for failure in result.failures.iter().take(MAX_FAILURE_FLASHES) {
                s.flash(Flash::error(failure.to_string()));
            }
            if result.failure_count() > MAX_FAILURE_FLASHES {
                s.flash(Flash::error(format!(
                    "... and {} more failure(s), see the log",
                    result.failure_count() - MAX_FAILURE_FLASHES
                )));
            }
        }
        Err(e) => {
            log::error!("Delete task failed: {}", e);
            s.flash(Flash::error("Deletion failed unexpectedly"));
        }
    })
}

// ==================== Account ====================

#[derive(Debug, Deserialize)]
pub struct AccountForm {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_username: String,
    #[serde(default)]
    pub new_password: String,
    #[serde(default)]
    pub confirm_password: String,
}

pub async fn account_page(State(state): AppStateRef, auth: AuthSession) -> Response {
    let (updated_at, path) = {
        let store = state.credentials();
        (store.updated_at(), store.path().to_path_buf())
    };
    match with_web_session(&state, &auth, WebSession::take_flashes) {
        Some(flashes) => render(&AccountPage::new(&auth.username, flashes, updated_at, path)),
        None => session_expired(),
    }
}

pub async fn account(
    State(state): AppStateRef,
    auth: AuthSession,
    Form(form): Form<AccountForm>,
) -> Response {
    if form.new_password != form.confirm_password {
        return update_and_redirect(&state, &auth, "/account", |s| {
            s.flash(Flash::error("New passwords do not match"));
        });
    }

    let new_username = if form.new_username.trim().is_empty() {
        auth.username.clone()
    } else {
        form.new_username.trim().to_string()
    };

    let worker_state = Arc::clone(&state);
    let username = new_username.clone();
    let changed = tokio::task::spawn_blocking(move || {
        worker_state
            .credentials()
            .change(&form.current_password, &username, &form.new_password)
            .map_err(|e| e.to_string())
    })
    .await
    .unwrap_or_else(|e| Err(format!("Credential update failed: {e}")));

    match changed {
        Ok(()) => {
            let removed = state.sessions.retain_only(&auth.token);
            log::info!("Credentials changed; {} other session(s) ended", removed);
            state.sessions.with_session(&auth.token, |s| {
                s.username = new_username;
                s.data.flash(Flash::success("Credentials updated"));
            });
            Redirect::to("/account").into_response()
        }
        Err(message) => {
            update_and_redirect(&state, &auth, "/account", |s| s.flash(Flash::error(message)))
        }
    }
}
