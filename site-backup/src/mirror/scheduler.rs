//! Parallel download of transfer jobs over a fixed pool of FTP connections.
//!
//! Jobs are dealt round-robin into `workers` shards. Each shard runs on its own
//! blocking worker with its own connection and processes its jobs one after
//! another. A failed job stops the rest of its shard only; the first error is
//! returned once every shard has settled.

use crate::remote::{Connect, RemoteStore};
use crate::utils::errors::{BackupError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// One remote file and where it goes locally.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct TransferJob {
    remote_path: String,
    local_path: PathBuf,
}

impl TransferJob {
    pub fn new(remote_path: String, local_path: PathBuf) -> Self {
        Self { remote_path, local_path }
    }

    pub fn remote_path(&self) -> &str {
        &self.remote_path
    }

    pub fn local_path(&self) -> &Path {
        &self.local_path
    }
}

/// Totals over all shards
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TransferSummary {
    pub transferred_files: usize,
    pub transferred_bytes: u64,
    pub failed_shards: usize,
}

#[derive(Default)]
struct ShardOutcome {
    files: usize,
    bytes: u64,
    error: Option<BackupError>,
}

/// Deal `jobs` into `k` shards: `jobs[i]` goes to shard `i % k`.
///
/// Always returns `k` shards (some possibly empty); `k` of zero is treated as one.
pub fn partition(jobs: Vec<TransferJob>, k: usize) -> Vec<Vec<TransferJob>> {
    let k = k.max(1);
    let mut shards: Vec<Vec<TransferJob>> = (0..k).map(|_| Vec::new()).collect();
    for (i, job) in jobs.into_iter().enumerate() {
        shards[i % k].push(job);
    }
    shards
}

pub struct TransferScheduler<C: Connect> {
    connector: Arc<C>,
    workers: usize,
}

impl<C: Connect> TransferScheduler<C> {
    pub fn new(connector: Arc<C>, workers: usize) -> Self {
        Self {
            connector,
            workers: workers.max(1),
        }
    }

    /// Download every job and wait for all shards to finish.
    pub async fn run(&self, jobs: Vec<TransferJob>) -> Result<TransferSummary> {
        let total = jobs.len();
        info!("Transferring {} files over {} workers", total, self.workers);

        let mut set = JoinSet::new();
        for (index, shard) in partition(jobs, self.workers).into_iter().enumerate() {
            if shard.is_empty() {
                continue;
            }
            let connector = Arc::clone(&self.connector);
            set.spawn_blocking(move || run_shard(index, connector.as_ref(), shard));
        }

        let mut summary = TransferSummary::default();
        let mut first_error: Option<BackupError> = None;

        while let Some(joined) = set.join_next().await {
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(e) => ShardOutcome {
                    error: Some(BackupError::from(e)),
                    ..Default::default()
                },
            };

            summary.transferred_files += outcome.files;
            summary.transferred_bytes += outcome.bytes;
            if let Some(e) = outcome.error {
                summary.failed_shards += 1;
                first_error.get_or_insert(e);
            }
        }

        info!(
            "Transfer finished: {}/{} files, {} bytes, {} failed shards",
            summary.transferred_files, total, summary.transferred_bytes, summary.failed_shards
        );

        match first_error {
            Some(e) => Err(e),
            None => Ok(summary),
        }
    }
}

fn run_shard<C: Connect>(index: usize, connector: &C, jobs: Vec<TransferJob>) -> ShardOutcome {
    let mut outcome = ShardOutcome::default();

    let mut store = match connector.connect() {
        Ok(store) => store,
        Err(e) => {
            warn!("Shard {} could not connect: {}", index, e);
            outcome.error = Some(e);
            return outcome;
        }
    };

    debug!("Shard {} started with {} jobs", index, jobs.len());

    for job in &jobs {
        match transfer(&mut store, job) {
            Ok(bytes) => {
                outcome.files += 1;
                outcome.bytes += bytes;
                info!("{}", job.local_path.display());
            }
            Err(e) => {
                warn!(
                    "Shard {} failed on {}: {} ({} jobs skipped)",
                    index,
                    job.remote_path,
                    e,
                    jobs.len() - outcome.files - 1
                );
                outcome.error = Some(e);
                break;
            }
        }
    }

    if let Err(e) = store.quit() {
        debug!("Shard {} quit failed: {}", index, e);
    }

    outcome
}

/// Download one job, creating its parent directory if needed.
fn transfer<S: RemoteStore>(store: &mut S, job: &TransferJob) -> Result<u64> {
    if let Some(parent) = job.local_path.parent() {
        // create_dir_all tolerates other shards creating the same directory
        fs::create_dir_all(parent)?;
    }
    let mut file = fs::File::create(&job.local_path)?;
    store.retrieve_file(&job.remote_path, &mut file)
}
