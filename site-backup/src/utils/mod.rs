//! Utility modules for site-backup.

pub mod errors;
pub mod logger;

pub use errors::{BackupError, Result};
