//! Columnar warehouse interface
//!
//! The pipeline asks three things of the warehouse: does a table exist,
//! start a load job, and report a job's state. [`Warehouse`] captures that;
//! [`bigquery::BigQueryClient`] implements it over the REST API.

pub mod bigquery;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::config::Settings;
use crate::schema::{EntityConfig, SchemaPolicy, TableSchema, WriteDisposition};
use crate::storage::ObjectLocation;

pub use bigquery::BigQueryClient;

/// Default REST endpoint of the warehouse.
pub const DEFAULT_WAREHOUSE_BASE_URL: &str = "https://bigquery.googleapis.com/bigquery/v2";

/// Instance metadata endpoint issuing tokens for the attached service account.
pub const DEFAULT_METADATA_TOKEN_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/token";

/// Fully qualified destination table
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    pub project_id: String,
    pub dataset_id: String,
    pub table_id: String,
}

impl TableRef {
    pub fn new(
        project_id: impl Into<String>,
        dataset_id: impl Into<String>,
        table_id: impl Into<String>,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            dataset_id: dataset_id.into(),
            table_id: table_id.into(),
        }
    }
}

impl std::fmt::Display for TableRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.project_id, self.dataset_id, self.table_id)
    }
}

#[derive(Clone)]
pub struct WarehouseConfig {
    pub base_url: String,
    /// Project that owns submitted jobs
    pub project_id: String,
    /// Static bearer token; when unset one is requested from `metadata_token_url`
    pub access_token: Option<String>,
    pub metadata_token_url: String,
}

impl WarehouseConfig {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_WAREHOUSE_BASE_URL.to_string(),
            project_id: project_id.into(),
            access_token: None,
            metadata_token_url: DEFAULT_METADATA_TOKEN_URL.to_string(),
        }
    }

    pub(crate) fn from_settings<F>(settings: &Settings<F>, project_id: &str) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new(project_id);
        if let Some(url) = settings.optional("WAREHOUSE_BASE_URL") {
            config.base_url = url;
        }
        if let Some(url) = settings.optional("WAREHOUSE_METADATA_TOKEN_URL") {
            config.metadata_token_url = url;
        }
        config.access_token = settings.optional("WAREHOUSE_ACCESS_TOKEN");
        config
    }
}

impl std::fmt::Debug for WarehouseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WarehouseConfig")
            .field("base_url", &self.base_url)
            .field("project_id", &self.project_id)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("metadata_token_url", &self.metadata_token_url)
            .finish()
    }
}

#[derive(Error, Debug)]
pub enum WarehouseError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Warehouse returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Could not obtain access token: {0}")]
    Token(String),

    #[error("Unexpected job state: {0}")]
    UnknownState(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableMetadata {
    /// Reported as a decimal string
    pub num_rows: Option<String>,
    pub creation_time: Option<String>,
}

/// Load job request: one staged object into one table
#[derive(Debug, Clone, PartialEq)]
pub struct LoadJob {
    pub destination: TableRef,
    pub source: ObjectLocation,
    pub schema_policy: SchemaPolicy,
    pub write_disposition: WriteDisposition,
    /// Present exactly when `schema_policy` is explicit
    pub schema: Option<TableSchema>,
}

impl LoadJob {
    pub fn new(source: ObjectLocation, config: &EntityConfig) -> Self {
        Self {
            destination: config.table.clone(),
            source,
            schema_policy: config.schema_policy,
            write_disposition: config.write_disposition,
            schema: config.schema(),
        }
    }
}

/// Handle of a submitted job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRef {
    pub project_id: String,
    pub job_id: String,
    pub location: Option<String>,
}

/// One error reported by a finished job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobErrorDetail {
    pub reason: Option<String>,
    pub location: Option<String>,
    pub message: String,
}

impl JobErrorDetail {
    pub fn new(reason: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            reason: Some(reason.into()),
            location: None,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for JobErrorDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.reason {
            Some(reason) => write!(f, "{}: {}", reason, self.message)?,
            None => f.write_str(&self.message)?,
        }
        if let Some(location) = &self.location {
            write!(f, " (at {})", location)?;
        }
        Ok(())
    }
}

/// Load job lifecycle. `Succeeded` and `Failed` are terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Running,
    Succeeded,
    Failed(Vec<JobErrorDetail>),
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Succeeded | JobState::Failed(_))
    }
}

#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Fails with [`WarehouseError::NotFound`] when the table does not exist.
    async fn table_metadata(&self, table: &TableRef) -> Result<TableMetadata, WarehouseError>;

    async fn insert_load_job(&self, job: &LoadJob) -> Result<JobRef, WarehouseError>;

    async fn job_state(&self, job: &JobRef) -> Result<JobState, WarehouseError>;
}
