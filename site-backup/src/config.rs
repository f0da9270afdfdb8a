//! Configuration management for site-backup.
//!
//! Loads configuration from an INI file with environment variable overrides
//! (`SITE_BACKUP__FTP__PASSWORD=...` overrides `[ftp] password`). The value is
//! built once in `main` and handed to every component by reference.

use crate::utils::errors::{BackupError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Prefix for environment variable overrides.
const ENV_PREFIX: &str = "SITE_BACKUP";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backup: BackupToggles,

    #[serde(default)]
    pub ftp: Option<FtpConfig>,

    #[serde(default)]
    pub sqlexport: Option<SqlExportConfig>,

    #[serde(default)]
    pub wp_complete_backup: Option<WpCompleteBackupConfig>,

    #[serde(default)]
    pub transfer: TransferConfig,

    #[serde(default)]
    pub dump: DumpConfig,

    #[serde(default)]
    pub log: LogConfig,
}

/// Which pipelines a run executes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackupToggles {
    /// Mirror the FTP tree
    #[serde(default)]
    pub ftp: bool,

    /// Export the database through the sqlexport API (default: when [sqlexport] exists)
    #[serde(default)]
    pub sql: Option<bool>,

    /// Remote-triggered WordPress snapshot (not handled by this tool)
    #[serde(default)]
    pub wp_complete_backup: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FtpConfig {
    pub host: String,

    #[serde(default = "default_ftp_port")]
    pub port: u16,

    pub username: String,

    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SqlExportConfig {
    /// API key sent as `key` with every request
    pub api_key: String,

    /// URL of the sqlexport endpoint
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WpCompleteBackupConfig {
    pub url: String,

    #[serde(default)]
    pub delete_previous_backups: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferConfig {
    /// Number of download shards, each with its own FTP connection
    #[serde(default = "default_transfer_workers")]
    pub workers: usize,

    /// Connect and socket read/write timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumpConfig {
    /// Rows per `insert_into` request
    #[serde(default = "default_page_size")]
    pub page_size: u64,

    /// Tables exported concurrently
    #[serde(default = "default_table_workers")]
    pub table_workers: usize,

    /// Page requests in flight per table
    #[serde(default = "default_page_workers")]
    pub page_workers: usize,

    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// One line per event, no timestamps
    #[serde(default)]
    pub compact: bool,
}

// Default values
fn default_ftp_port() -> u16 {
    21
}

fn default_transfer_workers() -> usize {
    10
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_page_size() -> u64 {
    1000
}

fn default_table_workers() -> usize {
    5
}

fn default_page_workers() -> usize {
    3
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            workers: default_transfer_workers(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl TransferConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            table_workers: default_table_workers(),
            page_workers: default_page_workers(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl DumpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            compact: false,
        }
    }
}

impl Config {
    /// Load configuration from an INI file, then apply environment overrides.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(BackupError::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }

        let settings = config::Config::builder()
            .add_source(config::File::from(path).format(config::FileFormat::Ini))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every enabled pipeline has the section it needs.
    pub fn validate(&self) -> Result<()> {
        if self.backup.ftp && self.ftp.is_none() {
            return Err(BackupError::Config(
                "backup.ftp is enabled but the [ftp] section is missing".to_string(),
            ));
        }
        if self.backup.sql == Some(true) && self.sqlexport.is_none() {
            return Err(BackupError::Config(
                "backup.sql is enabled but the [sqlexport] section is missing".to_string(),
            ));
        }
        if self.backup.wp_complete_backup && self.wp_complete_backup.is_none() {
            return Err(BackupError::Config(
                "backup.wp_complete_backup is enabled but the [wp_complete_backup] section is missing"
                    .to_string(),
            ));
        }
        if self.transfer.workers == 0 || self.dump.table_workers == 0 || self.dump.page_workers == 0 {
            return Err(BackupError::Config("worker counts must be at least 1".to_string()));
        }
        if self.dump.page_size == 0 {
            return Err(BackupError::Config("dump.page_size must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Whether the database export runs.
    pub fn sql_enabled(&self) -> bool {
        self.backup.sql.unwrap_or(self.sqlexport.is_some())
    }

    /// FTP settings, or a configuration error when the section is absent.
    pub fn ftp(&self) -> Result<&FtpConfig> {
        self.ftp
            .as_ref()
            .ok_or_else(|| BackupError::Config("missing [ftp] section".to_string()))
    }

    /// sqlexport settings, or a configuration error when the section is absent.
    pub fn sqlexport(&self) -> Result<&SqlExportConfig> {
        self.sqlexport
            .as_ref()
            .ok_or_else(|| BackupError::Config("missing [sqlexport] section".to_string()))
    }
}
