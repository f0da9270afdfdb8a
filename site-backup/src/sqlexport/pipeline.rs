//! Concurrent, page-ordered export of schema and table data.
//!
//! Each table is exported in pages of `page_size` rows. Pages are requested
//! concurrently and may complete in any order, so every page lands in its own
//! slot and the table file is written once, from the slots in page order,
//! after the last page has arrived.

use super::client::QueryApi;
use crate::config::DumpConfig;
use crate::utils::errors::{BackupError, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// File holding the `CREATE TABLE` statements.
pub const SCHEMA_FILE: &str = "tables.sql";

/// Statements in a dump file are separated by a blank line.
const STATEMENT_SEPARATOR: &str = "\n\n";

/// Concurrency and paging limits for one dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DumpOptions {
    pub page_size: u64,
    pub table_workers: usize,
    pub page_workers: usize,
}

impl Default for DumpOptions {
    fn default() -> Self {
        Self {
            page_size: 1000,
            table_workers: 5,
            page_workers: 3,
        }
    }
}

impl From<&DumpConfig> for DumpOptions {
    fn from(config: &DumpConfig) -> Self {
        Self {
            page_size: config.page_size.max(1),
            table_workers: config.table_workers.max(1),
            page_workers: config.page_workers.max(1),
        }
    }
}

/// Result of dumping all tables
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DumpSummary {
    pub tables: usize,
    pub pages: usize,
    pub failed_tables: usize,
}

/// Offsets of every page for a table of `rows` rows: `0, page_size, ...`.
pub fn page_offsets(rows: u64, page_size: u64) -> Vec<u64> {
    (0..rows).step_by(page_size.max(1) as usize).collect()
}

pub struct DumpPipeline<Q: QueryApi> {
    api: Arc<Q>,
    options: DumpOptions,
}

impl<Q: QueryApi> DumpPipeline<Q> {
    pub fn new(api: Arc<Q>, options: DumpOptions) -> Self {
        Self { api, options }
    }

    /// Write every `CREATE TABLE` statement to `dir/tables.sql`.
    pub async fn dump_schema(&self, dir: &Path) -> Result<PathBuf> {
        let statements = self.api.schema_statements().await?;
        let path = dir.join(SCHEMA_FILE);
        tokio::fs::write(&path, statements.join(STATEMENT_SEPARATOR)).await?;
        info!("Wrote {} table definitions to {}", statements.len(), path.display());
        Ok(path)
    }

    /// Export every table into `dir/<table>.sql`.
    ///
    /// A failing table does not stop the others. Once all tables have settled
    /// the first error is returned, unless some table hit a missing endpoint.
    pub async fn dump_tables(&self, dir: &Path) -> Result<DumpSummary> {
        let tables = self.api.list_tables().await?;
        info!("Exporting {} tables", tables.len());

        let table_slots = Arc::new(Semaphore::new(self.options.table_workers));
        let mut set = JoinSet::new();

        for table in tables {
            let api = Arc::clone(&self.api);
            let slots = Arc::clone(&table_slots);
            let options = self.options;
            let dir = dir.to_path_buf();

            set.spawn(async move {
                let _permit = slots
                    .acquire_owned()
                    .await
                    .map_err(|e| BackupError::Task(e.to_string()))?;

                let pages = fetch_table(api, &table, options).await?;
                let page_count = pages.len();
                let statements: Vec<String> = pages.into_iter().flatten().collect();
                write_table(&dir, &table, &statements).await?;
                Ok::<usize, BackupError>(page_count)
            });
        }

        let mut summary = DumpSummary::default();
        let mut first_error: Option<BackupError> = None;

        while let Some(joined) = set.join_next().await {
            match joined.map_err(BackupError::from).and_then(|result| result) {
                Ok(pages) => {
                    summary.tables += 1;
                    summary.pages += pages;
                }
                Err(e) => {
                    warn!("Table export failed: {}", e);
                    summary.failed_tables += 1;
                    keep_error(&mut first_error, e);
                }
            }
        }

        info!(
            "Exported {} tables ({} failed)",
            summary.tables, summary.failed_tables
        );

        match first_error {
            Some(e) => Err(e),
            None => Ok(summary),
        }
    }
}

/// Fetch all pages of `table`, returned in ascending offset order.
///
/// At most `page_workers` requests are in flight. The first failing page
/// aborts the rest.
pub async fn fetch_table<Q: QueryApi>(
    api: Arc<Q>,
    table: &str,
    options: DumpOptions,
) -> Result<Vec<Vec<String>>> {
    let rows = api.row_count(table).await?;
    let offsets = page_offsets(rows, options.page_size);
    let expected = offsets.len();
    debug!("{}: {} rows in {} pages", table, rows, expected);

    let page_slots = Arc::new(Semaphore::new(options.page_workers));
    let mut set = JoinSet::new();

    for (index, offset) in offsets.into_iter().enumerate() {
        let api = Arc::clone(&api);
        let slots = Arc::clone(&page_slots);
        let table = table.to_string();
        let limit = options.page_size;

        set.spawn(async move {
            let _permit = slots
                .acquire_owned()
                .await
                .map_err(|e| BackupError::Task(e.to_string()))?;
            let statements = api.insert_statements(&table, offset, limit).await?;
            Ok::<(usize, Vec<String>), BackupError>((index, statements))
        });
    }

    let mut pages: Vec<Option<Vec<String>>> = vec![None; expected];
    let mut completed = 0;

    while let Some(joined) = set.join_next().await {
        let (index, statements) = joined?.map_err(|e| {
            warn!("{}: page request failed: {}", table, e);
            e
        })?;
        pages[index] = Some(statements);
        completed += 1;
    }

    if completed != expected {
        return Err(BackupError::Task(format!(
            "{}: {} of {} pages completed",
            table, completed, expected
        )));
    }

    Ok(pages.into_iter().flatten().collect())
}

/// Record `e` unless an error is already held. `EndpointNotFound` replaces
/// any other error so the caller can report the missing URL.
fn keep_error(slot: &mut Option<BackupError>, e: BackupError) {
    match slot {
        None => *slot = Some(e),
        Some(BackupError::EndpointNotFound(_)) => {}
        Some(_) if matches!(e, BackupError::EndpointNotFound(_)) => *slot = Some(e),
        Some(_) => {}
    }
}

/// File name for `table`'s dump. Path separators and `%` are percent-escaped
/// so every table stays a single file directly inside the dump directory.
pub fn table_file_name(table: &str) -> String {
    let mut name = String::with_capacity(table.len() + 4);
    for c in table.chars() {
        match c {
            '%' => name.push_str("%25"),
            '/' => name.push_str("%2F"),
            '\\' => name.push_str("%5C"),
            '\0' => name.push_str("%00"),
            c => name.push(c),
        }
    }
    name.push_str(".sql");
    name
}

async fn write_table(dir: &Path, table: &str, statements: &[String]) -> Result<PathBuf> {
    let path = dir.join(table_file_name(table));
    tokio::fs::write(&path, statements.join(STATEMENT_SEPARATOR)).await?;
    info!("{}", path.display());
    Ok(path)
}
