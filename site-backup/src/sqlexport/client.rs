//! Client for the `sqlexport.php` API on the web server.
//!
//! Every call is one GET carrying the API key and a `function` name
//! (`tables`, `create_tables`, `count_rows`, `insert_into`) plus its
//! arguments; the body is JSON.

use crate::config::SqlExportConfig;
use crate::utils::errors::{BackupError, Result};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Queries a remote database can answer.
pub trait QueryApi: Send + Sync + 'static {
    /// Names of all tables.
    fn list_tables(&self) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// One `CREATE TABLE` statement per table.
    fn schema_statements(&self) -> impl Future<Output = Result<Vec<String>>> + Send;

    fn row_count(&self, table: &str) -> impl Future<Output = Result<u64>> + Send;

    /// `INSERT INTO` statements for `limit` rows starting at `offset`.
    fn insert_statements(
        &self,
        table: &str,
        offset: u64,
        limit: u64,
    ) -> impl Future<Output = Result<Vec<String>>> + Send;
}

/// `insert_into` answers with either one statement or a list of them.
#[derive(Deserialize)]
#[serde(untagged)]
enum Statements {
    One(String),
    Many(Vec<String>),
}

impl From<Statements> for Vec<String> {
    fn from(statements: Statements) -> Self {
        match statements {
            Statements::One(statement) => vec![statement],
            Statements::Many(statements) => statements,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SqlExportClient {
    http: reqwest::Client,
    url: String,
    api_key: String,
}

impl SqlExportClient {
    pub fn new(config: &SqlExportConfig, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: config.url.clone(),
            api_key: config.api_key.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn query<T: DeserializeOwned>(&self, function: &str, args: &[(&str, String)]) -> Result<T> {
        let mut params: Vec<(&str, &str)> = vec![("key", self.api_key.as_str()), ("function", function)];
        params.extend(args.iter().map(|(name, value)| (*name, value.as_str())));

        let response = self.http.get(&self.url).query(&params).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(BackupError::EndpointNotFound(self.url.clone()));
        }

        let body = response.error_for_status()?.bytes().await?;
        debug!("sqlexport {} returned {} bytes", function, body.len());
        Ok(serde_json::from_slice(&body)?)
    }
}

impl QueryApi for SqlExportClient {
    async fn list_tables(&self) -> Result<Vec<String>> {
        self.query("tables", &[]).await
    }

    async fn schema_statements(&self) -> Result<Vec<String>> {
        self.query("create_tables", &[]).await
    }

    async fn row_count(&self, table: &str) -> Result<u64> {
        self.query("count_rows", &[("table", table.to_string())]).await
    }

    async fn insert_statements(&self, table: &str, offset: u64, limit: u64) -> Result<Vec<String>> {
        let statements: Statements = self
            .query(
                "insert_into",
                &[
                    ("table", table.to_string()),
                    ("limit", format!("{}, {}", offset, limit)),
                ],
            )
            .await?;
        Ok(statements.into())
    }
}
