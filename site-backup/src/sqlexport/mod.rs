//! Database export through the sqlexport API.
//!
//! A full run writes `tables.sql` and one `<table>.sql` per table into a
//! working directory, packs it into `<YYYY-MM-DD HH:MM>.tar.gz` and removes
//! the working directory.

pub mod client;
pub mod pipeline;

use crate::archive;
use crate::utils::errors::Result;
use chrono::{DateTime, Local};
use client::QueryApi;
use pipeline::{DumpOptions, DumpPipeline};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Name of the working directory inside the output directory.
pub const WORK_DIR: &str = "sql";

pub struct SqlExporter<Q: QueryApi> {
    pipeline: DumpPipeline<Q>,
    work_dir: PathBuf,
    archive_dir: PathBuf,
}

impl<Q: QueryApi> SqlExporter<Q> {
    /// Dump into `<output_dir>/sql` and archive into `output_dir`.
    pub fn new(api: Arc<Q>, options: DumpOptions, output_dir: impl Into<PathBuf>) -> Self {
        let archive_dir = output_dir.into();
        Self {
            pipeline: DumpPipeline::new(api, options),
            work_dir: archive_dir.join(WORK_DIR),
            archive_dir,
        }
    }

    pub fn work_dir(&self) -> &std::path::Path {
        &self.work_dir
    }

    /// Dump schema and data, archive them and remove the working directory.
    ///
    /// A failed dump leaves the working directory in place and writes no archive.
    pub async fn do_backup(&self, started_at: DateTime<Local>) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.work_dir).await?;

        self.pipeline.dump_schema(&self.work_dir).await?;
        let summary = self.pipeline.dump_tables(&self.work_dir).await?;
        info!("Dumped {} tables in {} pages", summary.tables, summary.pages);

        let work_dir = self.work_dir.clone();
        let archive_dir = self.archive_dir.clone();
        tokio::task::spawn_blocking(move || {
            archive::archive_and_remove(&work_dir, &archive_dir, &started_at)
        })
        .await?
    }
}
