//! BigQuery REST implementation of [`Warehouse`]

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::{
    JobErrorDetail, JobRef, JobState, LoadJob, TableMetadata, TableRef, Warehouse,
    WarehouseConfig, WarehouseError,
};
use crate::schema::{SchemaPolicy, TableSchema};

// ============================================================================
// Constants
// ============================================================================

/// Staged pages are always newline-delimited JSON.
pub const SOURCE_FORMAT: &str = "NEWLINE_DELIMITED_JSON";

const CREATE_DISPOSITION: &str = "CREATE_IF_NEEDED";

/// Prefix of client-generated job ids.
pub const JOB_ID_PREFIX: &str = "ccsync_";

enum TokenSource {
    Static(String),
    Metadata { url: String, token: OnceCell<String> },
}

pub struct BigQueryClient {
    client: Client,
    base_url: String,
    project_id: String,
    token: TokenSource,
}

impl BigQueryClient {
    pub fn new(config: &WarehouseConfig) -> Result<Self, WarehouseError> {
        let client = Client::builder().build()?;
        let token = match &config.access_token {
            Some(token) => TokenSource::Static(token.clone()),
            None => TokenSource::Metadata {
                url: config.metadata_token_url.clone(),
                token: OnceCell::new(),
            },
        };

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            project_id: config.project_id.clone(),
            token,
        })
    }

    async fn access_token(&self) -> Result<&str, WarehouseError> {
        match &self.token {
            TokenSource::Static(token) => Ok(token.as_str()),
            TokenSource::Metadata { url, token } => token
                .get_or_try_init(|| fetch_metadata_token(&self.client, url))
                .await
                .map(String::as_str),
        }
    }

    fn table_url(&self, table: &TableRef) -> String {
        format!(
            "{}/projects/{}/datasets/{}/tables/{}",
            self.base_url, table.project_id, table.dataset_id, table.table_id
        )
    }

    fn jobs_url(&self, project_id: &str) -> String {
        format!("{}/projects/{}/jobs", self.base_url, project_id)
    }
}

#[async_trait]
impl Warehouse for BigQueryClient {
    #[instrument(skip(self), fields(table = %table))]
    async fn table_metadata(&self, table: &TableRef) -> Result<TableMetadata, WarehouseError> {
        let token = self.access_token().await?;
        let response = self
            .client
            .get(self.table_url(table))
            .bearer_auth(token)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(WarehouseError::NotFound(table.to_string()));
        }

        read_json(response).await
    }

    #[instrument(skip(self, job), fields(table = %job.destination, source = %job.source))]
    async fn insert_load_job(&self, job: &LoadJob) -> Result<JobRef, WarehouseError> {
        let token = self.access_token().await?;
        let job_id = format!("{}{}", JOB_ID_PREFIX, Uuid::new_v4().simple());
        let request = JobInsertRequest::new(&self.project_id, &job_id, job);

        let response = self
            .client
            .post(self.jobs_url(&self.project_id))
            .bearer_auth(token)
            .json(&request)
            .send()
            .await?;
        let body: JobResource = read_json(response).await?;

        let job_ref = match body.job_reference {
            Some(reference) => JobRef {
                project_id: reference.project_id,
                job_id: reference.job_id,
                location: reference.location,
            },
            None => JobRef {
                project_id: self.project_id.clone(),
                job_id,
                location: None,
            },
        };

        info!(job_id = %job_ref.job_id, "Submitted load job");
        Ok(job_ref)
    }

    #[instrument(skip(self), fields(job_id = %job.job_id))]
    async fn job_state(&self, job: &JobRef) -> Result<JobState, WarehouseError> {
        let token = self.access_token().await?;
        let mut request = self
            .client
            .get(format!("{}/{}", self.jobs_url(&job.project_id), job.job_id))
            .bearer_auth(token);
        if let Some(location) = &job.location {
            request = request.query(&[("location", location)]);
        }

        let body: JobResource = read_json(request.send().await?).await?;
        let status = body.status.unwrap_or_default();
        debug!(state = %status.state, "Polled load job");

        status.into_state()
    }
}

async fn fetch_metadata_token(client: &Client, url: &str) -> Result<String, WarehouseError> {
    let response = client
        .get(url)
        .header("Metadata-Flavor", "Google")
        .send()
        .await
        .map_err(|e| WarehouseError::Token(e.to_string()))?;

    if !response.status().is_success() {
        return Err(WarehouseError::Token(format!(
            "metadata server returned status {}",
            response.status().as_u16()
        )));
    }

    let token: MetadataToken = response
        .json()
        .await
        .map_err(|e| WarehouseError::Token(e.to_string()))?;
    Ok(token.access_token)
}

async fn read_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, WarehouseError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(WarehouseError::Status {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response.json().await?)
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
struct MetadataToken {
    access_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JobInsertRequest<'a> {
    job_reference: JobReference,
    configuration: JobConfiguration<'a>,
}

impl<'a> JobInsertRequest<'a> {
    fn new(project_id: &str, job_id: &str, job: &'a LoadJob) -> Self {
        let explicit = job.schema_policy == SchemaPolicy::ExplicitSchema;

        Self {
            job_reference: JobReference {
                project_id: project_id.to_string(),
                job_id: job_id.to_string(),
                location: None,
            },
            configuration: JobConfiguration {
                load: LoadConfiguration {
                    source_uris: vec![job.source.uri()],
                    source_format: SOURCE_FORMAT,
                    destination_table: TableReference {
                        project_id: &job.destination.project_id,
                        dataset_id: &job.destination.dataset_id,
                        table_id: &job.destination.table_id,
                    },
                    write_disposition: job.write_disposition.as_str(),
                    create_disposition: CREATE_DISPOSITION,
                    autodetect: !explicit,
                    schema: job.schema.as_ref(),
                    ignore_unknown_values: explicit,
                },
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct JobConfiguration<'a> {
    load: LoadConfiguration<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoadConfiguration<'a> {
    source_uris: Vec<String>,
    source_format: &'static str,
    destination_table: TableReference<'a>,
    write_disposition: &'static str,
    create_disposition: &'static str,
    autodetect: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    schema: Option<&'a TableSchema>,
    /// Records carry more fields than the declared schema lists
    ignore_unknown_values: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TableReference<'a> {
    project_id: &'a str,
    dataset_id: &'a str,
    table_id: &'a str,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobReference {
    project_id: String,
    job_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobResource {
    job_reference: Option<JobReference>,
    status: Option<JobStatus>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobStatus {
    #[serde(default)]
    state: String,
    error_result: Option<ErrorProto>,
    #[serde(default)]
    errors: Vec<ErrorProto>,
}

impl JobStatus {
    /// A job is failed only once it is `DONE` with an `errorResult`; `errors`
    /// alone may hold warnings on a successful job.
    fn into_state(self) -> Result<JobState, WarehouseError> {
        match self.state.as_str() {
            "PENDING" => Ok(JobState::Pending),
            "RUNNING" => Ok(JobState::Running),
            "DONE" => match self.error_result {
                None => Ok(JobState::Succeeded),
                Some(error_result) => {
                    let errors = if self.errors.is_empty() {
                        vec![error_result]
                    } else {
                        self.errors
                    };
                    Ok(JobState::Failed(errors.into_iter().map(Into::into).collect()))
                },
            },
            other => Err(WarehouseError::UnknownState(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ErrorProto {
    reason: Option<String>,
    location: Option<String>,
    #[serde(default)]
    message: String,
}

impl From<ErrorProto> for JobErrorDetail {
    fn from(proto: ErrorProto) -> Self {
        Self {
            reason: proto.reason,
            location: proto.location,
            message: proto.message,
        }
    }
}
