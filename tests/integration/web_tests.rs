//! The axum router driven in-process with `tower::ServiceExt::oneshot`.

use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use dupecleaner::auth::CredentialStore;
use dupecleaner::config::{Config, DeleteSettings, FclonesConfig};
use dupecleaner::web::handlers::SESSION_COOKIE;
use dupecleaner::web::{router, AppState};
use tempfile::TempDir;
use tower::ServiceExt;

const USER: &str = "admin";
const PASSWORD: &str = "correct horse";

struct Harness {
    state: Arc<AppState>,
    _dir: TempDir,
}

impl Harness {
    fn new(fclones: FclonesConfig) -> Self {
        let dir = TempDir::new().unwrap();
        let creds_path = dir.path().join("credentials.toml");
        let mut store = CredentialStore::load(&creds_path).unwrap();
        store.set(USER, PASSWORD).unwrap();

        let config = Config {
            credentials_path: Some(creds_path),
            fclones,
            delete: DeleteSettings {
                permanent: true,
                verify_mtime: true,
            },
            protected_paths: Vec::new(),
            ..Config::default()
        };
        Self {
            state: Arc::new(AppState::new(config, store)),
            _dir: dir,
        }
    }

    async fn send(&self, request: Request<Body>) -> Response {
        router(Arc::clone(&self.state)).oneshot(request).await.unwrap()
    }

    async fn get(&self, uri: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    async fn post(&self, uri: &str, body: &str, cookie: Option<&str>) -> Response {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    /// Log in and return the `Cookie` header value.
    async fn login_as(&self, password: &str) -> String {
        let body = format!("username={USER}&password={}", encode(password));
        let response = self.post("/login", &body, None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/");
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .expect("login sets a cookie")
            .to_str()
            .unwrap();
        assert!(set_cookie.contains("HttpOnly"));
        assert!(set_cookie.contains("SameSite=Strict"));
        set_cookie.split(';').next().unwrap().to_string()
    }

    async fn login(&self) -> String {
        self.login_as(PASSWORD).await
    }

    async fn page(&self, uri: &str, cookie: &str) -> String {
        let response = self.get(uri, Some(cookie)).await;
        assert_eq!(response.status(), StatusCode::OK);
        text(response).await
    }
}

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .map(|v| v.to_str().unwrap())
        .unwrap_or_default()
}

async fn text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Percent-encode a form value.
fn encode(value: &str) -> String {
    value
        .bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                (b as char).to_string()
            }
            _ => format!("%{b:02X}"),
        })
        .collect()
}

fn path_value(path: &Path) -> String {
    encode(&path.to_string_lossy())
}

#[tokio::test]
async fn test_pages_require_login() {
    let app = Harness::new(FclonesConfig::default());

    for uri in ["/", "/account"] {
        let response = app.get(uri, None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login");
    }

    let response = app.post("/scan", "root=%2Ftmp", None).await;
    assert_eq!(location(&response), "/login");

    let bogus = format!("{SESSION_COOKIE}=forged");
    let response = app.get("/", Some(&bogus)).await;
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_login_rejects_bad_password() {
    let app = Harness::new(FclonesConfig::default());

    let response = app
        .post("/login", "username=admin&password=wrong-password", None)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert!(text(response).await.contains("Invalid username or password"));
    assert!(app.state.sessions.is_empty());
}

#[tokio::test]
async fn test_login_and_logout() {
    let app = Harness::new(FclonesConfig::default());
    let cookie = app.login().await;

    let html = app.page("/", &cookie).await;
    assert!(html.contains("Scan settings"));
    assert!(html.contains("Signed in as <strong>admin</strong>"));

    let response = app.get("/login", Some(&cookie)).await;
    assert_eq!(location(&response), "/");

    let response = app.post("/logout", "", Some(&cookie)).await;
    assert_eq!(location(&response), "/login");

    let response = app.get("/", Some(&cookie)).await;
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_stylesheet_is_public() {
    let app = Harness::new(FclonesConfig::default());
    let response = app.get("/static/style.css", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/css"));
}

#[tokio::test]
async fn test_scan_of_missing_root_is_flashed() {
    let app = Harness::new(FclonesConfig::default());
    let cookie = app.login().await;
    let missing = TempDir::new().unwrap().path().join("nope");

    let body = format!("root={}&min_size_kb=0", path_value(&missing));
    let response = app.post("/scan", &body, Some(&cookie)).await;
    assert_eq!(location(&response), "/");

    let html = app.page("/", &cookie).await;
    assert!(html.contains("Scan failed"));
    assert!(!html.contains("Results"));

    let html = app.page("/", &cookie).await;
    assert!(!html.contains("Scan failed"));
}

#[tokio::test]
async fn test_invalid_panel_values_are_rejected() {
    let app = Harness::new(FclonesConfig::default());
    let cookie = app.login().await;

    app.post("/scan", "root=%2Ftmp&min_size_kb=lots", Some(&cookie))
        .await;
    assert!(app
        .page("/", &cookie)
        .await
        .contains("Minimum size must be a whole number"));

    app.post("/scan", "root=++&min_size_kb=1", Some(&cookie)).await;
    assert!(app
        .page("/", &cookie)
        .await
        .contains("Please enter a directory to scan"));
}

#[tokio::test]
async fn test_actions_without_results() {
    let app = Harness::new(FclonesConfig::default());
    let cookie = app.login().await;

    let response = app.post("/strategy", "strategy=newest", Some(&cookie)).await;
    assert_eq!(location(&response), "/");
    assert!(app.page("/", &cookie).await.contains("Run a scan first"));

    let response = app.post("/delete", "", Some(&cookie)).await;
    assert_eq!(location(&response), "/");
    assert!(app.page("/", &cookie).await.contains("Run a scan first"));

    let response = app.post("/delete/confirm", "", Some(&cookie)).await;
    assert_eq!(location(&response), "/");
    assert!(app.page("/", &cookie).await.contains("No files selected"));
}

#[tokio::test]
async fn test_account_change_ends_other_sessions() {
    let app = Harness::new(FclonesConfig::default());
    let mine = app.login().await;
    let other = app.login().await;

    let mismatch = "current_password=correct+horse&new_username=&new_password=battery+staple&confirm_password=typo";
    let response = app.post("/account", mismatch, Some(&mine)).await;
    assert_eq!(location(&response), "/account");
    assert!(app
        .page("/account", &mine)
        .await
        .contains("New passwords do not match"));

    let wrong_current = "current_password=guess&new_username=&new_password=battery+staple&confirm_password=battery+staple";
    app.post("/account", wrong_current, Some(&mine)).await;
    assert!(app
        .page("/account", &mine)
        .await
        .contains("Invalid username or password"));

    let good = "current_password=correct+horse&new_username=&new_password=battery+staple&confirm_password=battery+staple";
    let response = app.post("/account", good, Some(&mine)).await;
    assert_eq!(location(&response), "/account");
    assert!(app.page("/account", &mine).await.contains("Credentials updated"));

    let response = app.get("/", Some(&other)).await;
    assert_eq!(location(&response), "/login");

    let response = app
        .post("/login", "username=admin&password=correct+horse", None)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    app.login_as("battery staple").await;
}

#[cfg(unix)]
mod with_fake_tool {
    use super::*;
    use crate::integration::common::{json_report, tool_lock, write_file, FakeTool};

    #[tokio::test]
    async fn test_scan_review_and_delete_flow() {
        let root = TempDir::new().unwrap();
        let older = write_file(root.path(), "older.txt", b"dup", 500);
        let newer = write_file(root.path(), "newer.txt", b"dup", 100);
        let tool = FakeTool::reporting(&json_report(&[(3, vec![older.as_path(), newer.as_path()])]));
        let app = Harness::new(tool.config());
        let cookie = app.login().await;

        let body = format!(
            "root={}&min_size_kb=0&extensions=.*&exclude_dirs=&scan_hidden=on",
            path_value(root.path())
        );
        let response = {
            let _guard = tool_lock();
            app.post("/scan", &body, Some(&cookie)).await
        };
        assert_eq!(location(&response), "/");
        assert!(tool.recorded_args().iter().any(|a| a == "--hidden"));

        let html = app.page("/", &cookie).await;
        assert!(html.contains("Found 1 duplicate group(s)"));
        assert!(html.contains("older.txt"));
        assert!(html.contains("newer.txt"));
        assert!(html.contains("fclones 0.35.0"));

        let response = app.post("/strategy", "strategy=newest", Some(&cookie)).await;
        assert_eq!(location(&response), "/");
        let html = app.page("/", &cookie).await;
        assert!(html.contains(r#"<option value="newest" selected>"#));

        let body = format!("selected={}", path_value(&older));
        let response = app.post("/delete", &body, Some(&cookie)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let html = text(response).await;
        assert!(html.contains("Confirm deletion"));
        assert!(html.contains("will be permanently deleted"));
        assert!(html.contains("cannot be undone"));
        assert_eq!(html.matches(r#"type="hidden" name="selected""#).count(), 1);

        let response = app.post("/delete/confirm", &body, Some(&cookie)).await;
        assert_eq!(location(&response), "/");
        assert!(!older.exists());
        assert!(newer.exists());

        let html = app.page("/", &cookie).await;
        assert!(html.contains("Deleted 1 file(s)"));
        assert!(!html.contains("older.txt"));
    }

    #[tokio::test]
    async fn test_every_copy_selected_is_refused() {
        let root = TempDir::new().unwrap();
        let a = write_file(root.path(), "a.dat", b"twin", 50);
        let b = write_file(root.path(), "b.dat", b"twin", 40);
        let tool = FakeTool::reporting(&json_report(&[(4, vec![a.as_path(), b.as_path()])]));
        let app = Harness::new(tool.config());
        let cookie = app.login().await;

        {
            let _guard = tool_lock();
            let body = format!("root={}", path_value(root.path()));
            app.post("/scan", &body, Some(&cookie)).await;
        }
        app.post("/select-all", "", Some(&cookie)).await;
        let html = app.page("/", &cookie).await;
        assert!(html.contains("Every copy is selected"));

        let body = format!("selected={}&selected={}", path_value(&a), path_value(&b));
        let html = text(app.post("/delete", &body, Some(&cookie)).await).await;
        assert!(html.contains("Group 1 has every copy selected"));

        app.post("/delete/confirm", &body, Some(&cookie)).await;
        assert!(a.exists() && b.exists());
        assert!(app.page("/", &cookie).await.contains("2 failed"));
    }

    /// Scan `root` with a fake tool reporting one group of `files`.
    async fn scanned_app(root: &Path, files: &[&Path]) -> (Harness, String, FakeTool) {
        let tool = FakeTool::reporting(&json_report(&[(4, files.to_vec())]));
        let app = Harness::new(tool.config());
        let cookie = app.login().await;
        {
            let _guard = tool_lock();
            let body = format!("root={}", path_value(root));
            app.post("/scan", &body, Some(&cookie)).await;
        }
        (app, cookie, tool)
    }

    #[tokio::test]
    async fn test_selection_changed_after_confirmation_deletes_nothing() {
        let root = TempDir::new().unwrap();
        let older = write_file(root.path(), "older.txt", b"twin", 500);
        let newer = write_file(root.path(), "newer.txt", b"twin", 100);
        let (app, cookie, _tool) = scanned_app(root.path(), &[older.as_path(), newer.as_path()]).await;

        let confirmed = format!("selected={}", path_value(&older));
        let html = text(app.post("/delete", &confirmed, Some(&cookie)).await).await;
        assert!(html.contains("Confirm deletion"));

        app.post("/strategy", "strategy=oldest", Some(&cookie)).await;

        let response = app.post("/delete/confirm", &confirmed, Some(&cookie)).await;
        assert_eq!(location(&response), "/");
        assert!(older.exists() && newer.exists());
        assert!(app
            .page("/", &cookie)
            .await
            .contains("The selection changed after it was confirmed"));

        let unlisted = format!("selected={}", path_value(&newer));
        app.post("/delete/confirm", &unlisted, Some(&cookie)).await;
        assert!(older.exists());
        assert!(!newer.exists());
    }

    #[tokio::test]
    async fn test_vanished_kept_copy_blocks_deletion() {
        let root = TempDir::new().unwrap();
        let keep = write_file(root.path(), "a.txt", b"twin", 500);
        let copy = write_file(root.path(), "copy-b.txt", b"twin", 100);
        let (app, cookie, _tool) = scanned_app(root.path(), &[keep.as_path(), copy.as_path()]).await;
        app.post("/strategy", "strategy=shortest-path", Some(&cookie)).await;

        std::fs::remove_file(&keep).unwrap();

        let body = format!("selected={}", path_value(&copy));
        let response = app.post("/delete", &body, Some(&cookie)).await;
        assert_eq!(location(&response), "/");
        let html = app.page("/", &cookie).await;
        assert!(html.contains("1 file(s) no longer exist"));
        assert!(html.contains("No files selected"));

        app.post("/delete/confirm", &body, Some(&cookie)).await;
        assert!(copy.exists());
    }

    #[tokio::test]
    async fn test_tool_failure_is_flashed() {
        let root = TempDir::new().unwrap();
        let tool = FakeTool::failing("error: walk failed", 1);
        let app = Harness::new(tool.config());
        let cookie = app.login().await;

        {
            let _guard = tool_lock();
            let body = format!("root={}", path_value(root.path()));
            app.post("/scan", &body, Some(&cookie)).await;
        }
        let html = app.page("/", &cookie).await;
        assert!(html.contains("Scan failed"));
        assert!(html.contains("walk failed"));
    }
}
