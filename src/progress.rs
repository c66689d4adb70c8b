//! Terminal spinner shown while fclones runs.
//!
//! fclones reports no machine-readable progress, so the headless `scan`
//! command shows an elapsed-time spinner instead of a bar. The spinner draws
//! to stderr and is hidden in quiet mode or when stderr is not a terminal.

use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Tick interval of the spinner animation.
const TICK: Duration = Duration::from_millis(100);

/// Longest root path shown next to the spinner.
const MAX_PATH_DISPLAY: usize = 40;

/// Elapsed-time spinner for a single long-running step.
pub struct Spinner {
    bar: ProgressBar,
}

impl Spinner {
    /// Start a spinner for a scan of `root`.
    #[must_use]
    pub fn start(root: &str, quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::with_draw_target(None, ProgressDrawTarget::hidden())
        } else {
            ProgressBar::new_spinner()
        };
        bar.set_style(
            ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed_precise}]")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "),
        );
        bar.set_message(format!(
            "Running fclones on {}",
            truncate_path(root, MAX_PATH_DISPLAY)
        ));
        if !quiet {
            bar.enable_steady_tick(TICK);
        }
        Self { bar }
    }

    /// Stop and leave a final message.
    pub fn finish(&self, message: impl Into<String>) {
        self.bar.finish_with_message(message.into());
    }

    /// Stop and erase the spinner line.
    pub fn clear(&self) {
        self.bar.finish_and_clear();
    }

    /// Whether the spinner is drawing nothing.
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.bar.is_hidden()
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        if !self.bar.is_finished() {
            self.bar.finish_and_clear();
        }
    }
}

/// Shorten a path to its file name for display.
fn truncate_path(path: &str, max_len: usize) -> String {
    if path.chars().count() <= max_len {
        return path.to_string();
    }

    let file_name = std::path::Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    let name_len = file_name.chars().count();
    if name_len + 4 > max_len {
        let tail: String = file_name.chars().skip(name_len + 3 - max_len).collect();
        return format!("...{tail}");
    }

    format!(".../{file_name}")
}
