//! Bulk loader
//!
//! Submits one load job per staged object and polls it to a terminal state.
//! Failed jobs are never retried.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use crate::config::DEFAULT_LOAD_POLL_INTERVAL_MS;
use crate::diagnostics::missing_schema_component;
use crate::error::{PipelineError, Result};
use crate::schema::EntityConfig;
use crate::storage::ObjectLocation;
use crate::warehouse::{JobState, LoadJob, TableRef, Warehouse};

/// A load job that finished without errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadResult {
    pub table: TableRef,
    pub job_id: String,
    pub source: ObjectLocation,
}

#[derive(Clone)]
pub struct BulkLoader {
    warehouse: Arc<dyn Warehouse>,
    poll_interval: Duration,
}

impl BulkLoader {
    pub fn new(warehouse: Arc<dyn Warehouse>) -> Self {
        Self {
            warehouse,
            poll_interval: Duration::from_millis(DEFAULT_LOAD_POLL_INTERVAL_MS),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Load `source` into the table named by `config` and wait for the job.
    #[instrument(skip(self, source, config), fields(object = %source, table = %config.table))]
    pub async fn load(&self, source: &ObjectLocation, config: &EntityConfig) -> Result<LoadResult> {
        let table = config.table.clone();
        let job = LoadJob::new(source.clone(), config);

        let job_ref = self
            .warehouse
            .insert_load_job(&job)
            .await
            .map_err(|source| PipelineError::LoadSubmit {
                table: table.clone(),
                source,
            })?;

        loop {
            let state = self
                .warehouse
                .job_state(&job_ref)
                .await
                .map_err(|source| PipelineError::LoadSubmit {
                    table: table.clone(),
                    source,
                })?;

            match state {
                JobState::Succeeded => {
                    info!(job_id = %job_ref.job_id, "Load job completed");
                    return Ok(LoadResult {
                        table,
                        job_id: job_ref.job_id,
                        source: source.clone(),
                    });
                },
                JobState::Failed(errors) => {
                    let missing_component = errors
                        .first()
                        .and_then(|error| missing_schema_component(&error.message));

                    if let Some(component) = &missing_component {
                        warn!(job_id = %job_ref.job_id, component = %component, "Schema mismatch on load");
                    }

                    return Err(PipelineError::LoadJob {
                        table,
                        job_id: job_ref.job_id,
                        errors,
                        missing_component,
                    });
                },
                pending @ (JobState::Pending | JobState::Running) => {
                    debug!(job_id = %job_ref.job_id, state = ?pending, "Waiting for load job");
                    tokio::time::sleep(self.poll_interval).await;
                },
            }
        }
    }
}
