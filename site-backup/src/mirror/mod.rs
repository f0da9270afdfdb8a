//! FTP mirroring.
//!
//! [`FileExporter::download_files`] enumerates the requested remote
//! directories, skips files already on disk and downloads the rest in
//! parallel. [`FileExporter::mirror_simple`] walks the same directories once on a
//! single connection and downloads while it walks.

pub mod dedup;
pub mod scheduler;
pub mod walker;

use crate::remote::{join_remote, Connect, RemoteStore};
use crate::utils::errors::Result;
use scheduler::{TransferScheduler, TransferSummary};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};
use walker::ReplicateSummary;

/// Mirrors part of a remote tree into a local directory.
pub struct FileExporter<C: Connect> {
    connector: Arc<C>,
    root: String,
    directories: Vec<String>,
    to_dir: PathBuf,
    workers: usize,
}

impl<C: Connect> FileExporter<C> {
    /// `directories` are relative to `root`; an empty list mirrors all of `root`.
    pub fn new(
        connector: Arc<C>,
        root: impl Into<String>,
        directories: Vec<String>,
        to_dir: impl Into<PathBuf>,
        workers: usize,
    ) -> Self {
        Self {
            connector,
            root: root.into(),
            directories,
            to_dir: to_dir.into(),
            workers,
        }
    }

    /// Absolute remote directories to mirror.
    pub fn source_directories(&self) -> Vec<String> {
        if self.directories.is_empty() {
            return vec![join_remote(&self.root, "")];
        }
        self.directories
            .iter()
            .map(|dir| join_remote(&self.root, dir.trim_start_matches('/')))
            .collect()
    }

    /// Every remote file below the source directories, on one connection.
    pub async fn list_files(&self) -> Result<Vec<String>> {
        let connector = Arc::clone(&self.connector);
        let sources = self.source_directories();

        tokio::task::spawn_blocking(move || -> Result<Vec<String>> {
            let mut store = connector.connect()?;
            let mut files = Vec::new();
            for source in &sources {
                let found = walker::enumerate(&mut store, source)?;
                info!("Found {} files in {}", found.len(), source);
                files.extend(found);
            }
            if let Err(e) = store.quit() {
                debug!("Quit after listing failed: {}", e);
            }
            Ok(files)
        })
        .await?
    }

    /// Download every remote file that is not already present locally.
    pub async fn download_files(&self) -> Result<TransferSummary> {
        let files = self.list_files().await?;
        let listed = files.len();

        let jobs = dedup::filter_existing(dedup::plan_jobs(files, &self.to_dir));
        info!(
            "{} remote files, {} missing under {}",
            listed,
            jobs.len(),
            self.to_dir.display()
        );

        TransferScheduler::new(Arc::clone(&self.connector), self.workers)
            .run(jobs)
            .await
    }

    /// Replicate every source directory into `to_dir/<remote path>` while walking.
    ///
    /// Lays files out like [`FileExporter::download_files`]. Parents of each
    /// destination are created as needed; the destination itself must not
    /// exist yet.
    pub async fn mirror_simple(&self) -> Result<ReplicateSummary> {
        let connector = Arc::clone(&self.connector);
        let sources = self.source_directories();
        let to_dir = self.to_dir.clone();

        let summary = tokio::task::spawn_blocking(move || -> Result<ReplicateSummary> {
            let mut store = connector.connect()?;
            let mut total = ReplicateSummary::default();
            for source in &sources {
                let dest = dedup::local_destination(&to_dir, source);
                if let Some(parent) = dest.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::create_dir(&dest)?;
                let summary = walker::replicate_and_download(&mut store, source, &dest)?;
                total.directories += summary.directories;
                total.files += summary.files;
                total.bytes += summary.bytes;
            }
            if let Err(e) = store.quit() {
                debug!("Quit after mirroring failed: {}", e);
            }
            Ok(total)
        })
        .await??;

        info!(
            "Mirrored {} files ({} bytes) in {} directories",
            summary.files, summary.bytes, summary.directories
        );
        Ok(summary)
    }
}
