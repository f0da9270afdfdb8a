//! Recursive traversal of the remote tree.
//!
//! Two modes: [`enumerate`] only collects file paths (the parallel,
//! deduplicated flow transfers them afterwards), while
//! [`replicate_and_download`] rebuilds the directory structure locally and
//! downloads each file as soon as it is seen.

use crate::remote::RemoteStore;
use crate::utils::errors::Result;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// Result of a replicate-and-download pass
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReplicateSummary {
    pub directories: usize,
    pub files: usize,
    pub bytes: u64,
}

/// Collect every file path below `root`, depth-first.
///
/// Only reads from the store; calling it again against the same remote state
/// yields the same list.
pub fn enumerate<S: RemoteStore + ?Sized>(store: &mut S, root: &str) -> Result<Vec<String>> {
    let mut files = Vec::new();
    enumerate_into(store, root, &mut files)?;
    Ok(files)
}

fn enumerate_into<S: RemoteStore + ?Sized>(
    store: &mut S,
    directory: &str,
    files: &mut Vec<String>,
) -> Result<()> {
    for entry in store.entries(directory)? {
        if entry.is_directory {
            enumerate_into(store, &entry.path, files)?;
        } else {
            files.push(entry.path);
        }
    }
    debug!("Enumerated {} ({} files so far)", directory, files.len());
    Ok(())
}

/// Mirror `from` into the existing local directory `to`, downloading as it goes.
///
/// Local directories are created with `create_dir`, so a directory left over
/// from an earlier run aborts the walk.
pub fn replicate_and_download<S: RemoteStore + ?Sized>(
    store: &mut S,
    from: &str,
    to: &Path,
) -> Result<ReplicateSummary> {
    let mut summary = ReplicateSummary::default();
    replicate_into(store, from, to, &mut summary)?;
    Ok(summary)
}

fn replicate_into<S: RemoteStore + ?Sized>(
    store: &mut S,
    from: &str,
    to: &Path,
    summary: &mut ReplicateSummary,
) -> Result<()> {
    for entry in store.entries(from)? {
        let local = to.join(entry_name(&entry.path));
        if entry.is_directory {
            fs::create_dir(&local)?;
            summary.directories += 1;
            replicate_into(store, &entry.path, &local, summary)?;
        } else {
            let mut file = fs::File::create(&local)?;
            let bytes = store.retrieve_file(&entry.path, &mut file)?;
            summary.files += 1;
            summary.bytes += bytes;
            info!("{}", local.display());
        }
    }
    Ok(())
}

/// Delete everything below the remote directory `path`, then the directory itself.
pub fn remove_tree<S: RemoteStore + ?Sized>(store: &mut S, path: &str) -> Result<usize> {
    let mut removed = 0;
    for entry in store.entries(path)? {
        if entry.is_directory {
            removed += remove_tree(store, &entry.path)?;
        } else {
            store.delete_file(&entry.path)?;
            removed += 1;
        }
    }
    store.remove_directory(path)?;
    Ok(removed + 1)
}

fn entry_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}
