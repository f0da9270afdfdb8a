//! Site Backup - Main entry point
//!
//! Mirrors the configured FTP tree into `ftp/` and dumps the database into a
//! dated `.tar.gz`.

use anyhow::Result;
use chrono::{DateTime, Local};
use clap::Parser;
use site_backup::mirror::FileExporter;
use site_backup::remote::ftp::FtpConnector;
use site_backup::sqlexport::client::SqlExportClient;
use site_backup::sqlexport::pipeline::DumpOptions;
use site_backup::sqlexport::SqlExporter;
use site_backup::{utils, BackupError, Config};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::Instrument;

const EXAMPLES: &str = "\
Example commands:
    $ site-backup
    $ site-backup /var/lib/dpkg
    $ site-backup -r /var/lib/dpkg
    $ site-backup -r /var/lib dpkg/alternatives pam
    $ site-backup --sql-only";

/// Directory the FTP mirror is written to, inside the output directory.
const MIRROR_DIR: &str = "ftp";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, after_help = EXAMPLES)]
struct Args {
    /// Root directory on the FTP to back up from
    #[arg(short, long, value_name = "PATH", default_value = "/")]
    root: String,

    /// Directories to back up, relative to the root (default: all of it)
    #[arg(value_name = "DIR")]
    directories: Vec<String>,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config.ini")]
    config: PathBuf,

    /// Where `ftp/` and the SQL archive are written
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    output: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Walk and download on one connection instead of the parallel, deduplicated transfer
    #[arg(long)]
    simple: bool,

    /// Only mirror files
    #[arg(long, conflicts_with = "sql_only")]
    files_only: bool,

    /// Only export the database
    #[arg(long)]
    sql_only: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::from_file(&args.config)?;

    // Initialize logging
    utils::logger::init(&config.log, args.log_level.as_deref())?;

    let started_at = Local::now();
    let run_id = uuid::Uuid::new_v4();

    tracing::info!(
        "Starting site-backup v{} (run: {})",
        env!("CARGO_PKG_VERSION"),
        run_id
    );

    let outcome = run(&args, &config, started_at)
        .instrument(tracing::info_span!("run", id = %run_id))
        .await;

    match outcome {
        Ok(()) => {
            tracing::info!("Backup finished");
            Ok(())
        }
        Err(BackupError::EndpointNotFound(url)) => {
            eprintln!("Couldn't find {}", url);
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}

async fn run(args: &Args, config: &Config, started_at: DateTime<Local>) -> site_backup::Result<()> {
    let mirror_files = !args.sql_only && (config.backup.ftp || args.files_only);
    let dump_sql = !args.files_only && (config.sql_enabled() || args.sql_only);

    if config.backup.wp_complete_backup {
        tracing::warn!("backup.wp_complete_backup is enabled; remote snapshots are not triggered by this tool");
    }

    if mirror_files {
        let ftp = config.ftp()?;
        let connector = Arc::new(FtpConnector::new(ftp, config.transfer.timeout()));
        let exporter = FileExporter::new(
            connector,
            args.root.clone(),
            args.directories.clone(),
            args.output.join(MIRROR_DIR),
            config.transfer.workers,
        );

        tracing::info!("Mirroring ftp://{}{} into {}", ftp.host, args.root, args.output.join(MIRROR_DIR).display());
        if args.simple {
            exporter.mirror_simple().await?;
        } else {
            exporter.download_files().await?;
        }
    }

    if dump_sql {
        let client = SqlExportClient::new(config.sqlexport()?, config.dump.timeout())?;
        tracing::info!("Exporting database from {}", client.url());

        let exporter = SqlExporter::new(
            Arc::new(client),
            DumpOptions::from(&config.dump),
            args.output.clone(),
        );
        exporter.do_backup(started_at).await?;
    }

    Ok(())
}
