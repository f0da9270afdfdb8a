//! Remote file store access.
//!
//! Every operation takes an explicit full path; nothing depends on a remote
//! working directory. A [`RemoteStore`] is one exclusively owned connection,
//! and a [`Connect`] opens fresh ones so parallel workers never share a
//! session.

pub mod ftp;
pub mod listing;

#[cfg(test)]
pub mod memory;

use crate::utils::errors::Result;
use std::io::Write;

pub use listing::{join_remote, parse_listing, RemoteEntry};

/// A blocking connection to the remote file tree.
pub trait RemoteStore: Send {
    /// Raw listing lines of `path`, including the `.` and `..` entries.
    fn list_directory(&mut self, path: &str) -> Result<Vec<String>>;

    /// Stream the file at `path` into `dest`, returning the bytes written.
    fn retrieve_file(&mut self, path: &str, dest: &mut dyn Write) -> Result<u64>;

    fn change_directory(&mut self, path: &str) -> Result<()>;

    fn delete_file(&mut self, path: &str) -> Result<()>;

    fn remove_directory(&mut self, path: &str) -> Result<()>;

    /// Close the session.
    fn quit(&mut self) -> Result<()>;

    /// List and parse `path` in one step.
    fn entries(&mut self, path: &str) -> Result<Vec<RemoteEntry>> {
        let lines = self.list_directory(path)?;
        parse_listing(path, &lines)
    }
}

/// Opens new, logged-in remote sessions.
pub trait Connect: Send + Sync + 'static {
    type Store: RemoteStore + 'static;

    fn connect(&self) -> Result<Self::Store>;
}
