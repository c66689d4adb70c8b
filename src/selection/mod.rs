//! Selection engine.
//!
//! A [`KeepStrategy`] picks one file per duplicate group to keep; every
//! other file is selected for deletion. [`ReviewState`] holds the groups
//! being reviewed and lets the user override the automatic selection.

pub mod review;
pub mod strategy;

pub use review::{missing_from_disk, ReviewState, SelectionStats};
pub use strategy::{select_for_deletion, KeepStrategy};
