//! Error taxonomy for extraction and load runs
//!
//! Severity is decided by the caller, not the variant: a [`PipelineError::Fetch`]
//! on the first page only skips an entity, while `partial: true` means some
//! pages were already staged before the run lost the rest.

use ccsync_common::EntityKind;
use thiserror::Error;

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::stager::StageError;
use crate::warehouse::{JobErrorDetail, TableRef, WarehouseError};

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Authorization failed: {0}")]
    Auth(String),

    #[error("Failed to fetch {entity} page {page}: {source}")]
    Fetch {
        entity: EntityKind,
        page: u32,
        partial: bool,
        #[source]
        source: ApiError,
    },

    #[error("Failed to stage {object}: {source}")]
    Stage {
        object: String,
        #[source]
        source: StageError,
    },

    #[error("Load job for {table} could not be run: {source}")]
    LoadSubmit {
        table: TableRef,
        #[source]
        source: WarehouseError,
    },

    #[error("Load job {job_id} for {table} completed with errors: {}", JobErrors(.errors))]
    LoadJob {
        table: TableRef,
        job_id: String,
        errors: Vec<JobErrorDetail>,
        missing_component: Option<String>,
    },
}

impl PipelineError {
    /// Whether the run must report failure once every entity has been attempted.
    pub fn is_partial_fetch(&self) -> bool {
        matches!(self, PipelineError::Fetch { partial: true, .. })
    }
}

struct JobErrors<'a>(&'a [JobErrorDetail]);

impl std::fmt::Display for JobErrors<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[")?;
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", error)?;
        }
        f.write_str("]")
    }
}
