use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::{config::Region, error::DisplayErrorContext, primitives::ByteStream, Client};
use thiserror::Error;
use tracing::{debug, info, instrument};

pub mod config;

use config::StorageConfig;

/// Where a staged object lives
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectLocation {
    pub bucket: String,
    pub name: String,
}

impl ObjectLocation {
    pub fn new(bucket: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            name: name.into(),
        }
    }

    /// Parse `bucket/name`. The name may itself contain slashes.
    pub fn parse(value: &str) -> Option<Self> {
        let (bucket, name) = value.trim().split_once('/')?;
        if bucket.is_empty() || name.is_empty() {
            return None;
        }
        Some(Self::new(bucket, name))
    }

    /// `gs://bucket/name`, the form load jobs reference sources by.
    pub fn uri(&self) -> String {
        format!("gs://{}/{}", self.bucket, self.name)
    }
}

impl std::fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.bucket, self.name)
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to write {location}: {message}")]
    Write {
        location: ObjectLocation,
        message: String,
    },
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Create or overwrite `location` with `body`.
    async fn put_object(
        &self,
        location: &ObjectLocation,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StoreError>;
}

/// Bucket access over the S3-compatible XML API
#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    pub async fn new(config: &StorageConfig) -> Self {
        debug!("Initializing object store with config: {:?}", config);

        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(config.region.clone()));

        if let Some((access_key, secret_key)) = config.static_credentials() {
            loader = loader.credentials_provider(Credentials::new(
                access_key,
                secret_key,
                None,
                None,
                "ccsync-storage",
            ));
        }

        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }

        let shared = loader.load().await;
        let s3_config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(config.path_style)
            .build();

        info!(endpoint = ?config.endpoint, "Object store client initialized");

        Self {
            client: Client::from_conf(s3_config),
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    #[instrument(skip(self, body), fields(object = %location))]
    async fn put_object(
        &self,
        location: &ObjectLocation,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StoreError> {
        let size = body.len();
        debug!("Uploading {} bytes to {}", size, location);

        self.client
            .put_object()
            .bucket(&location.bucket)
            .key(&location.name)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| StoreError::Write {
                location: location.clone(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        info!("Successfully uploaded {} bytes to {}", size, location);

        Ok(())
    }
}
