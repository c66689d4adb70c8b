//! Shared fixtures: duplicate trees on disk and a shell script standing in
//! for fclones.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, SystemTime};

use dupecleaner::config::FclonesConfig;
use filetime::FileTime;
use tempfile::TempDir;

static TOOL_LOCK: Mutex<()> = Mutex::new(());

/// Serialises script creation and tool runs within a test binary.
///
/// Writing an executable while another thread forks can make `exec` fail
/// with "text file busy".
pub fn tool_lock() -> MutexGuard<'static, ()> {
    TOOL_LOCK.lock().unwrap_or_else(|e| e.into_inner())
}

/// Write `content` to `dir/name` and set its mtime `age_secs` in the past.
pub fn write_file(dir: &Path, name: &str, content: &[u8], age_secs: u64) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    let when = SystemTime::now() - Duration::from_secs(age_secs);
    filetime::set_file_mtime(&path, FileTime::from_system_time(when)).unwrap();
    path
}

/// A fclones JSON report listing `groups` of (size, paths).
pub fn json_report(groups: &[(u64, Vec<&Path>)]) -> String {
    let groups: Vec<serde_json::Value> = groups
        .iter()
        .enumerate()
        .map(|(idx, (size, files))| {
            serde_json::json!({
                "file_len": size,
                "file_hash": format!("{:032x}", idx + 1),
                "files": files.iter().map(|p| p.to_string_lossy()).collect::<Vec<_>>(),
            })
        })
        .collect();
    serde_json::json!({
        "header": {
            "version": "0.35.0",
            "timestamp": "2024-05-01T10:00:00.000000000+00:00",
            "command": ["fclones", "group"],
            "base_dir": "/",
            "stats": { "group_count": groups.len() }
        },
        "groups": groups,
    })
    .to_string()
}

/// Fake fclones that records its arguments and prints a fixed report.
#[cfg(unix)]
pub struct FakeTool {
    pub dir: TempDir,
    pub script: PathBuf,
    pub args_file: PathBuf,
}

#[cfg(unix)]
impl FakeTool {
    /// Tool that prints `report` on stdout and exits 0.
    pub fn reporting(report: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let report_file = dir.path().join("report.out");
        fs::write(&report_file, report).unwrap();
        let args_file = dir.path().join("args.txt");
        let body = format!(
            "if [ \"$1\" = \"--version\" ]; then echo 'fclones 0.35.0'; exit 0; fi\n\
             printf '%s\\n' \"$@\" > '{}'\n\
             cat '{}'\n",
            args_file.display(),
            report_file.display()
        );
        Self::with_body(dir, args_file, &body)
    }

    /// Tool that prints `stderr` and exits with `code`.
    pub fn failing(stderr: &str, code: i32) -> Self {
        let dir = TempDir::new().unwrap();
        let args_file = dir.path().join("args.txt");
        let body = format!("echo '{stderr}' >&2\nexit {code}\n");
        Self::with_body(dir, args_file, &body)
    }

    fn with_body(dir: TempDir, args_file: PathBuf, body: &str) -> Self {
        use std::os::unix::fs::PermissionsExt;

        let script = dir.path().join("fclones");
        {
            let _guard = tool_lock();
            fs::write(&script, format!("#!/bin/sh\n{body}")).unwrap();
            fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        }
        Self {
            dir,
            script,
            args_file,
        }
    }

    pub fn config(&self) -> FclonesConfig {
        FclonesConfig {
            path: self.script.clone(),
            ..FclonesConfig::default()
        }
    }

    /// Arguments of the last invocation, one per line.
    pub fn recorded_args(&self) -> Vec<String> {
        fs::read_to_string(&self.args_file)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }
}
