//! Per-login state kept between requests.

use crate::duplicates::ScanSummary;
use crate::scan::ScanSettings;
use crate::selection::ReviewState;

/// Flash message severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashKind {
    Success,
    Warning,
    Error,
}

/// A message shown once on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Warning,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }
}

/// State of one logged-in browser.
#[derive(Debug, Clone, Default)]
pub struct WebSession {
    /// Current contents of the settings panel
    pub settings: ScanSettings,
    /// Results under review, `None` before the first successful scan
    pub review: Option<ReviewState>,
    /// Statistics of the last successful scan
    pub summary: Option<ScanSummary>,
    flashes: Vec<Flash>,
}

impl WebSession {
    /// Fresh session starting from the configured panel defaults.
    #[must_use]
    pub fn new(settings: ScanSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    /// Queue a flash message.
    pub fn flash(&mut self, flash: Flash) {
        self.flashes.push(flash);
    }

    /// Take queued flash messages, leaving none behind.
    pub fn take_flashes(&mut self) -> Vec<Flash> {
        std::mem::take(&mut self.flashes)
    }
}
