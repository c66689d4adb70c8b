//! File actions module.
//!
//! Deletion of reviewed duplicates:
//! - Move to system trash (default, recoverable)
//! - Permanent deletion (requires explicit configuration)
//! - Refusal of protected directories and of groups with no copy left
//! - TOCTOU verification to detect modified files
//!
//! ```no_run
//! use dupecleaner::actions::delete::delete_to_trash;
//! use std::path::PathBuf;
//!
//! let path = PathBuf::from("/path/to/duplicate.txt");
//! let result = delete_to_trash(&path);
//! ```

pub mod delete;
pub mod protected;

pub use delete::{
    delete_selection, delete_to_trash, delete_verified, permanent_delete, validate_preserves_copy,
    BatchDeleteResult, DeleteConfig, DeleteError, DeleteResult,
};
pub use protected::ProtectedPaths;
