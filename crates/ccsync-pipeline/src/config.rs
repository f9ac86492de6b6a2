//! Trigger configuration
//!
//! Each trigger reads its settings exactly once at start-up. Every absent
//! required key and every unparseable optional value is collected and
//! reported together in a single [`ConfigError`].

use ccsync_common::EntityKind;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::api::ApiConfig;
use crate::storage::config::StorageConfig;
use crate::warehouse::{TableRef, WarehouseConfig};

// ============================================================================
// Defaults
// ============================================================================

/// Page size for the conversation details query.
pub const DEFAULT_PAGE_SIZE_CONVERSATION: u32 = 100;

/// Page size for the user and queue listings.
pub const DEFAULT_PAGE_SIZE_DIRECTORY: u32 = 200;

/// Delay between two load job status checks.
pub const DEFAULT_LOAD_POLL_INTERVAL_MS: u64 = 1000;

/// Aggregated configuration failure
#[derive(Error, Debug, Clone, Default, PartialEq, Eq)]
#[error("{}", describe(.missing, .invalid))]
pub struct ConfigError {
    /// Required keys that were absent or empty, in declaration order
    pub missing: Vec<&'static str>,
    /// Human-readable descriptions of values that failed to parse
    pub invalid: Vec<String>,
}

impl ConfigError {
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.invalid.is_empty()
    }
}

fn describe(missing: &[&'static str], invalid: &[String]) -> String {
    let mut parts = Vec::new();
    if !missing.is_empty() {
        parts.push(format!("missing required settings: {}", missing.join(", ")));
    }
    if !invalid.is_empty() {
        parts.push(format!("invalid settings: {}", invalid.join(", ")));
    }
    parts.join("; ")
}

/// Reads settings through a lookup function and records every problem.
pub(crate) struct Settings<F> {
    lookup: F,
    errors: ConfigError,
}

impl<F> Settings<F>
where
    F: Fn(&str) -> Option<String>,
{
    pub(crate) fn new(lookup: F) -> Self {
        Self {
            lookup,
            errors: ConfigError::default(),
        }
    }

    /// Trimmed value; empty counts as absent.
    pub(crate) fn optional(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    pub(crate) fn required(&mut self, key: &'static str) -> String {
        match self.optional(key) {
            Some(value) => value,
            None => {
                self.errors.missing.push(key);
                String::new()
            },
        }
    }

    pub(crate) fn parsed<T>(&mut self, key: &'static str, default: T) -> T
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let Some(raw) = self.optional(key) else {
            return default;
        };
        match raw.parse() {
            Ok(value) => value,
            Err(e) => {
                self.errors.invalid.push(format!("{}={:?} ({})", key, raw, e));
                default
            },
        }
    }

    pub(crate) fn positive(&mut self, key: &'static str, default: u32) -> u32 {
        let value = self.parsed(key, default);
        if value == 0 {
            self.errors
                .invalid
                .push(format!("{} must be greater than 0", key));
            return default;
        }
        value
    }

    pub(crate) fn invalid(&mut self, description: String) {
        self.errors.invalid.push(description);
    }

    pub(crate) fn finish(self) -> Result<(), ConfigError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

/// Destination table per entity kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityTables {
    pub conversation: TableRef,
    pub users: TableRef,
    pub queues: TableRef,
}

impl EntityTables {
    pub fn table_for(&self, entity: EntityKind) -> &TableRef {
        match entity {
            EntityKind::Conversation => &self.conversation,
            EntityKind::User => &self.users,
            EntityKind::Queue => &self.queues,
        }
    }
}

/// Settings for the extraction trigger
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub warehouse: WarehouseConfig,
    /// Bucket receiving staged pages
    pub bucket: String,
    /// Probed to choose between the bootstrap and incremental windows
    pub conversation_table: TableRef,
    pub page_size_conversation: u32,
    pub page_size_directory: u32,
}

impl ExtractConfig {
    /// Load from `.env` (if present) and the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::new(lookup);

        let region = settings.required("REGION");
        let client_id = settings.required("CLIENTID");
        let client_secret = settings.required("SECRET");
        let bucket = settings.required("BUCKETNAME");
        let project_id = settings.required("PROJECTID");
        let dataset_id = settings.required("DATASETID");
        let table_id = settings.required("TABLEID_CONVERSATION");

        let page_size_conversation =
            settings.positive("PAGE_SIZE_CONVERSATION", DEFAULT_PAGE_SIZE_CONVERSATION);
        let page_size_directory =
            settings.positive("PAGE_SIZE_DIRECTORY", DEFAULT_PAGE_SIZE_DIRECTORY);

        let api = ApiConfig::from_settings(&settings, region, client_id, client_secret);
        let storage = StorageConfig::from_settings(&mut settings);
        let warehouse = WarehouseConfig::from_settings(&settings, &project_id);

        settings.finish()?;

        Ok(Self {
            api,
            storage,
            warehouse,
            bucket,
            conversation_table: TableRef::new(project_id, dataset_id, table_id),
            page_size_conversation,
            page_size_directory,
        })
    }
}

/// Settings for the load trigger
#[derive(Debug, Clone)]
pub struct LoadConfig {
    pub warehouse: WarehouseConfig,
    pub tables: EntityTables,
    pub poll_interval: Duration,
}

impl LoadConfig {
    /// Load from `.env` (if present) and the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::new(lookup);

        let project_id = settings.required("PROJECTID");
        let dataset_id = settings.required("DATASETID");
        let conversation = settings.required("TABLEID_CONVERSATION");
        let users = settings.required("TABLEID_USERS");
        let queues = settings.required("TABLEID_QUEUES");

        let poll_interval_ms =
            settings.parsed("LOAD_POLL_INTERVAL_MS", DEFAULT_LOAD_POLL_INTERVAL_MS);
        let warehouse = WarehouseConfig::from_settings(&settings, &project_id);

        settings.finish()?;

        let table = |table_id: String| TableRef::new(&project_id, &dataset_id, table_id);

        Ok(Self {
            warehouse,
            tables: EntityTables {
                conversation: table(conversation),
                users: table(users),
                queues: table(queues),
            },
            poll_interval: Duration::from_millis(poll_interval_ms),
        })
    }
}
