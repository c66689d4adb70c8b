//! Askama page models.
//!
//! Handlers never pass domain types to templates directly: everything is
//! pre-formatted here so the templates only loop and print. Askama escapes
//! every interpolated value, file paths included.

use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use askama::Template;
use bytesize::ByteSize;
use chrono::{DateTime, Local};

use crate::actions::{DeleteConfig, ProtectedPaths};
use crate::duplicates::{DuplicateGroup, FileEntry, ScanSummary};
use crate::scan::settings::MAX_MIN_SIZE_KB;
use crate::scan::{CloudProvider, ScanSettings};
use crate::selection::{KeepStrategy, ReviewState};

use super::session::{Flash, FlashKind};

/// A flash message ready for display.
pub struct FlashView {
    /// CSS class (`success`, `error`, `warning`)
    pub class: &'static str,
    /// Message text
    pub message: String,
}

impl From<Flash> for FlashView {
    fn from(flash: Flash) -> Self {
        Self {
            class: match flash.kind {
                FlashKind::Success => "success",
                FlashKind::Error => "error",
                FlashKind::Warning => "warning",
            },
            message: flash.message,
        }
    }
}

/// Login form.
#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginPage {
    /// Error from the last attempt, empty if none
    pub error: String,
    /// Previously entered username
    pub username: String,
}

/// Scan settings panel values.
pub struct SettingsView {
    pub root: String,
    pub min_size_kb: u64,
    pub max_min_size_kb: u64,
    pub extensions: String,
    pub exclude_dirs: String,
    pub scan_hidden: bool,
    pub follow_symlinks: bool,
}

impl From<&ScanSettings> for SettingsView {
    fn from(settings: &ScanSettings) -> Self {
        Self {
            root: settings.root.to_string_lossy().into_owned(),
            min_size_kb: settings.clamped_min_size_kb(),
            max_min_size_kb: MAX_MIN_SIZE_KB,
            extensions: settings.extensions.clone(),
            exclude_dirs: settings.exclude_dirs.clone(),
            scan_hidden: settings.scan_hidden,
            follow_symlinks: settings.follow_symlinks,
        }
    }
}

/// One entry of the strategy menu.
pub struct StrategyOption {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

/// Strategy menu with "none" first.
#[must_use]
pub fn strategy_options(active: Option<KeepStrategy>) -> Vec<StrategyOption> {
    std::iter::once(StrategyOption {
        value: "none",
        label: "No automatic selection",
        selected: active.is_none(),
    })
    .chain(KeepStrategy::ALL.into_iter().map(|s| StrategyOption {
        value: s.as_str(),
        label: s.label(),
        selected: active == Some(s),
    }))
    .collect()
}

/// A file row.
pub struct FileView {
    pub path: String,
    pub size: String,
    pub modified: String,
    pub selected: bool,
}

/// A duplicate group with its rows, oldest file first.
pub struct GroupView {
    pub number: usize,
    pub hash: String,
    pub size: String,
    pub count: usize,
    pub wasted: String,
    pub all_selected: bool,
    pub files: Vec<FileView>,
}

impl GroupView {
    fn new(number: usize, group: &DuplicateGroup, review: &ReviewState) -> Self {
        let mut files: Vec<&FileEntry> = group.files.iter().collect();
        files.sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.path.cmp(&b.path)));

        let files: Vec<FileView> = files
            .into_iter()
            .map(|f| FileView {
                path: f.path.to_string_lossy().into_owned(),
                size: ByteSize::b(f.size).to_string(),
                modified: format_time(f.modified),
                selected: review.is_selected(&f.path),
            })
            .collect();

        Self {
            number,
            hash: group.short_hash().to_string(),
            size: ByteSize::b(group.size).to_string(),
            count: group.len(),
            wasted: ByteSize::b(group.wasted_space()).to_string(),
            all_selected: files.iter().all(|f| f.selected),
            files,
        }
    }
}

/// Main page: settings panel, summary and review.
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexPage {
    pub username: String,
    pub flashes: Vec<FlashView>,
    pub settings: SettingsView,
    pub cloud_provider: String,
    pub cloud_warnings: Vec<String>,
    pub has_results: bool,
    pub scan_info: String,
    pub group_count: usize,
    pub duplicate_files: usize,
    pub selected_count: usize,
    pub savings: String,
    pub strategies: Vec<StrategyOption>,
    pub groups: Vec<GroupView>,
    pub delete_mode: &'static str,
}

impl IndexPage {
    /// Build the page from a session's state.
    #[must_use]
    pub fn new(
        username: &str,
        flashes: Vec<Flash>,
        settings: &ScanSettings,
        review: Option<&ReviewState>,
        summary: Option<&ScanSummary>,
        delete: &DeleteConfig,
    ) -> Self {
        let cloud = CloudProvider::detect(&settings.root);
        let stats = review.map(ReviewState::stats).unwrap_or_default();

        Self {
            username: username.to_string(),
            flashes: flashes.into_iter().map(FlashView::from).collect(),
            settings: SettingsView::from(settings),
            cloud_provider: cloud.map(|c| c.display_name().to_string()).unwrap_or_default(),
            cloud_warnings: cloud.map(CloudProvider::warnings).unwrap_or_default(),
            has_results: review.is_some(),
            scan_info: summary.map(describe_scan).unwrap_or_default(),
            group_count: stats.group_count,
            duplicate_files: stats.duplicate_files,
            selected_count: stats.selected_count,
            savings: ByteSize::b(stats.selected_bytes).to_string(),
            strategies: strategy_options(review.and_then(ReviewState::strategy)),
            groups: review
                .map(|r| {
                    r.groups()
                        .iter()
                        .enumerate()
                        .map(|(idx, g)| GroupView::new(idx + 1, g, r))
                        .collect()
                })
                .unwrap_or_default(),
            delete_mode: delete.mode_label(),
        }
    }
}

/// Delete confirmation listing every selected file.
#[derive(Template)]
#[template(path = "confirm_delete.html")]
pub struct ConfirmPage {
    pub username: String,
    pub files: Vec<FileView>,
    pub total: String,
    pub delete_mode: &'static str,
    pub permanent: bool,
    pub warnings: Vec<String>,
}

impl ConfirmPage {
    /// Build the confirmation for the current selection.
    ///
    /// Files that will be refused (every copy selected, protected location)
    /// are listed as warnings.
    #[must_use]
    pub fn new(
        username: &str,
        review: &ReviewState,
        delete: &DeleteConfig,
        protected: &ProtectedPaths,
    ) -> Self {
        let selected: Vec<&FileEntry> = review
            .groups()
            .iter()
            .flat_map(|g| g.files.iter())
            .filter(|f| review.is_selected(&f.path))
            .collect();

        let mut warnings: Vec<String> = review
            .fully_selected_groups()
            .into_iter()
            .map(|idx| {
                format!(
                    "Group {} has every copy selected and will be skipped.",
                    idx + 1
                )
            })
            .collect();
        warnings.extend(selected.iter().filter_map(|f| {
            protected.protecting_root(&f.path).map(|root| {
                format!(
                    "{} is under protected {} and will be skipped.",
                    f.path.display(),
                    root.display()
                )
            })
        }));

        Self {
            username: username.to_string(),
            total: ByteSize::b(selected.iter().map(|f| f.size).sum()).to_string(),
            files: selected
                .iter()
                .map(|f| FileView {
                    path: f.path.to_string_lossy().into_owned(),
                    size: ByteSize::b(f.size).to_string(),
                    modified: format_time(f.modified),
                    selected: true,
                })
                .collect(),
            delete_mode: delete.mode_label(),
            permanent: delete.permanent,
            warnings,
        }
    }
}

/// Credential reset form.
#[derive(Template)]
#[template(path = "account.html")]
pub struct AccountPage {
    pub username: String,
    pub flashes: Vec<FlashView>,
    pub updated_at: String,
    pub credentials_path: String,
    pub min_length: usize,
}

impl AccountPage {
    /// Build the account page.
    #[must_use]
    pub fn new(
        username: &str,
        flashes: Vec<Flash>,
        updated_at: Option<DateTime<chrono::Utc>>,
        credentials_path: PathBuf,
    ) -> Self {
        Self {
            username: username.to_string(),
            flashes: flashes.into_iter().map(FlashView::from).collect(),
            updated_at: updated_at
                .map(|t| {
                    t.with_timezone(&Local)
                        .format("%Y-%m-%d %H:%M:%S")
                        .to_string()
                })
                .unwrap_or_else(|| "never".to_string()),
            credentials_path: credentials_path.to_string_lossy().into_owned(),
            min_length: crate::auth::PASSWORD_MIN_LENGTH,
        }
    }
}

fn describe_scan(summary: &ScanSummary) -> String {
    let mut parts = vec![format!("Scanned {}", summary.root.display())];
    if let Some(version) = &summary.tool_version {
        parts.push(format!("fclones {version}"));
    }
    parts.push(format!("took {}", format_duration(summary.scan_duration)));
    parts.push(format!(
        "{} reclaimable",
        ByteSize::b(summary.reclaimable_space)
    ));
    parts.join(" · ")
}

/// Format a duration as a human-readable string.
fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs >= 3600 {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    } else if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs > 0 {
        format!("{}.{:03}s", secs, duration.subsec_millis())
    } else {
        format!("{}ms", duration.subsec_millis())
    }
}

/// Format a modification time as a local date string.
fn format_time(time: Option<SystemTime>) -> String {
    match time {
        Some(time) => {
            let datetime: DateTime<Local> = time.into();
            datetime.format("%Y-%m-%d %H:%M:%S").to_string()
        }
        None => "unknown".to_string(),
    }
}
