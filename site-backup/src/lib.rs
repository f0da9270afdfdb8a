//! Site Backup Library
//!
//! Mirrors a web site's FTP tree to local disk and exports its database
//! through the sqlexport HTTP API into a dated archive.

pub mod archive;
pub mod config;
pub mod mirror;
pub mod remote;
pub mod sqlexport;
pub mod utils;

// Re-export commonly used types
pub use crate::config::Config;
pub use utils::errors::BackupError;
pub type Result<T> = std::result::Result<T, BackupError>;
