//! ccsync Pipeline Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Incremental extract-load of contact-center analytics into a columnar
//! warehouse.
//!
//! # Overview
//!
//! Two independently triggered runs:
//!
//! - **Extraction** ([`extract::ExtractRun`]): selects the conversation time
//!   window, pages conversations, queues and users out of the analytics API,
//!   and stages every page as a newline-delimited JSON object.
//! - **Load** ([`load::LoadRun`]): routes each staged object to its entity's
//!   table by the token in its name and runs one warehouse load job for it.
//!
//! Every remote collaborator sits behind a trait ([`api::AnalyticsApi`],
//! [`storage::ObjectStore`], [`warehouse::Warehouse`]) so the orchestration
//! can run against in-memory fakes.
//!
//! # Example
//!
//! ```no_run
//! use ccsync_pipeline::{
//!     api::AnalyticsClient,
//!     config::ExtractConfig,
//!     extract::ExtractRun,
//!     stager::Stager,
//!     storage::S3ObjectStore,
//!     warehouse::BigQueryClient,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ExtractConfig::from_env()?;
//!     let api = Arc::new(AnalyticsClient::authorize(&config.api).await?);
//!     let warehouse = Arc::new(BigQueryClient::new(&config.warehouse)?);
//!     let store = Arc::new(S3ObjectStore::new(&config.storage).await);
//!     let stager = Stager::new(store, &config.bucket);
//!
//!     let report = ExtractRun::from_config(api, warehouse, stager, &config)
//!         .run(chrono::Utc::now())
//!         .await;
//!     report.log_summary();
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod extract;
pub mod load;
pub mod loader;
pub mod paginator;
pub mod router;
pub mod schema;
pub mod stager;
pub mod storage;
pub mod warehouse;
pub mod window;

// Re-export commonly used types
pub use error::{PipelineError, Result};
pub use extract::{ExtractReport, ExtractRun};
pub use load::{LoadReport, LoadRun};
