//! Object stager
//!
//! Serializes one page of records as newline-delimited JSON and writes it to
//! the staging bucket under its [`ObjectName`]. Writing the same name twice
//! replaces the object.

use ccsync_common::checksum::sha256_hex;
use ccsync_common::ObjectName;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument};

use crate::storage::{ObjectLocation, ObjectStore, StoreError};

/// Content type of staged pages.
pub const STAGED_CONTENT_TYPE: &str = "application/x-ndjson";

#[derive(Error, Debug)]
pub enum StageError {
    #[error("Failed to serialize records: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Write(#[from] StoreError),
}

/// A page that made it to the bucket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedObject {
    pub location: ObjectLocation,
    pub name: ObjectName,
    pub records: usize,
    pub size: usize,
    /// SHA-256 of the written bytes
    pub checksum: String,
}

#[derive(Clone)]
pub struct Stager {
    store: Arc<dyn ObjectStore>,
    bucket: String,
}

impl Stager {
    pub fn new(store: Arc<dyn ObjectStore>, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
        }
    }

    #[instrument(skip(self, records), fields(object = %name, records = records.len()))]
    pub async fn stage(&self, name: ObjectName, records: &[Value]) -> Result<StagedObject, StageError> {
        let payload = encode_ndjson(records)?;
        let size = payload.len();
        let checksum = sha256_hex(&payload);
        let location = ObjectLocation::new(&self.bucket, name.to_string());

        self.store
            .put_object(&location, payload, STAGED_CONTENT_TYPE)
            .await?;

        info!(object = %location, size, checksum = %checksum, "Staged page");

        Ok(StagedObject {
            location,
            name,
            records: records.len(),
            size,
            checksum,
        })
    }
}

/// One record per line, each line terminated by `\n`.
pub fn encode_ndjson(records: &[Value]) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::new();
    for record in records {
        serde_json::to_writer(&mut buf, record)?;
        buf.push(b'\n');
    }
    Ok(buf)
}
