//! Duplicate group data model.
//!
//! Groups come from the external finder; this module only stores them and
//! derives statistics.

pub mod groups;

pub use groups::{DuplicateGroup, FileEntry, ScanSummary};
