//! Cloud-sync folder detection.
//!
//! Deleting inside a synced folder also deletes the cloud copy on every
//! connected device, so the settings panel warns when the scan root looks
//! like one. Detection is a case-insensitive substring match on the path.

use std::fmt;
use std::path::Path;

/// A recognised cloud storage provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloudProvider {
    /// Microsoft OneDrive (personal and business)
    OneDrive,
    /// Dropbox
    Dropbox,
    /// Google Drive desktop client
    GoogleDrive,
    /// Apple iCloud Drive
    ICloud,
}

impl CloudProvider {
    /// Every provider, in detection order.
    pub const ALL: [CloudProvider; 4] = [
        CloudProvider::OneDrive,
        CloudProvider::Dropbox,
        CloudProvider::GoogleDrive,
        CloudProvider::ICloud,
    ];

    /// Detect the provider whose folder contains `path`, if any.
    #[must_use]
    pub fn detect(path: &Path) -> Option<Self> {
        let lowered = path.to_string_lossy().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|provider| provider.markers().iter().any(|m| lowered.contains(m)))
    }

    /// Lowercase path fragments that identify the provider's folder.
    #[must_use]
    pub fn markers(self) -> &'static [&'static str] {
        match self {
            Self::OneDrive => &["onedrive"],
            Self::Dropbox => &["dropbox"],
            Self::GoogleDrive => &["google drive", "googledrive", "my drive"],
            Self::ICloud => &["icloud", "mobile documents"],
        }
    }

    /// Human-readable provider name.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::OneDrive => "OneDrive",
            Self::Dropbox => "Dropbox",
            Self::GoogleDrive => "Google Drive",
            Self::ICloud => "iCloud",
        }
    }

    /// Warning lines shown above the scan form.
    #[must_use]
    pub fn warnings(self) -> Vec<String> {
        let name = self.display_name();
        let offline = match self {
            Self::OneDrive => "marked as \"Always keep on this device\"",
            Self::Dropbox => "set as \"Available offline\"",
            Self::GoogleDrive => "not in \"cloud storage only\" mode",
            Self::ICloud => "downloaded, not just placeholders",
        };
        vec![
            format!("{name} files must be available locally ({offline}) to be scanned."),
            format!(
                "Deleting files from {name} folders removes them from this machine and from {name} cloud storage."
            ),
            format!("Deletions sync to every device connected to your {name} account."),
        ]
    }
}

impl fmt::Display for CloudProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
