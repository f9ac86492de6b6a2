//! In-memory collaborators for orchestration tests
//!
//! - [`FakeApi`]: serves synthetic pages with a configurable result set size
//! - [`MemoryStore`]: keeps staged objects in a map, can refuse chosen names
//! - [`FakeWarehouse`]: records load jobs and replays scripted job states

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use async_trait::async_trait;
use ccsync_common::EntityKind;
use ccsync_pipeline::api::{AnalyticsApi, ApiError, Page};
use ccsync_pipeline::storage::{ObjectLocation, ObjectStore, StoreError};
use ccsync_pipeline::warehouse::{
    JobRef, JobState, LoadJob, TableMetadata, TableRef, Warehouse, WarehouseError,
};
use ccsync_pipeline::window::FetchWindow;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::Mutex;

// ============================================================================
// Analytics API
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct FetchCall {
    pub entity: EntityKind,
    pub page_number: u32,
    pub page_size: u32,
    pub window: Option<FetchWindow>,
}

#[derive(Default)]
pub struct FakeApi {
    totals: HashMap<EntityKind, u64>,
    failing_pages: HashSet<(EntityKind, u32)>,
    drifting_pages: HashMap<(EntityKind, u32), u64>,
    calls: Mutex<Vec<FetchCall>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_total(mut self, entity: EntityKind, total_hits: u64) -> Self {
        self.totals.insert(entity, total_hits);
        self
    }

    pub fn failing_on(mut self, entity: EntityKind, page_number: u32) -> Self {
        self.failing_pages.insert((entity, page_number));
        self
    }

    /// Report a different result set size on one page.
    pub fn drifting_on(mut self, entity: EntityKind, page_number: u32, total_hits: u64) -> Self {
        self.drifting_pages.insert((entity, page_number), total_hits);
        self
    }

    pub fn calls(&self) -> Vec<FetchCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn pages_requested(&self, entity: EntityKind) -> Vec<u32> {
        self.calls()
            .into_iter()
            .filter(|call| call.entity == entity)
            .map(|call| call.page_number)
            .collect()
    }
}

#[async_trait]
impl AnalyticsApi for FakeApi {
    async fn fetch_page(
        &self,
        entity: EntityKind,
        page_number: u32,
        page_size: u32,
        window: Option<&FetchWindow>,
    ) -> Result<Page, ApiError> {
        self.calls.lock().unwrap().push(FetchCall {
            entity,
            page_number,
            page_size,
            window: window.copied(),
        });

        if self.failing_pages.contains(&(entity, page_number)) {
            return Err(ApiError::Status {
                status: 503,
                body: "service unavailable".to_string(),
            });
        }

        let total_hits = self.totals.get(&entity).copied().unwrap_or(0);
        let offset = u64::from(page_number - 1) * u64::from(page_size);
        let count = total_hits.saturating_sub(offset).min(u64::from(page_size));
        let records: Vec<Value> = (0..count)
            .map(|i| json!({ "id": format!("{}-{}", entity, offset + i) }))
            .collect();

        Ok(Page {
            entity,
            page_number,
            page_size,
            records,
            total_hits: self
                .drifting_pages
                .get(&(entity, page_number))
                .copied()
                .unwrap_or(total_hits),
        })
    }
}

// ============================================================================
// Object store
// ============================================================================

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub content_type: String,
}

impl StoredObject {
    pub fn lines(&self) -> Vec<Value> {
        String::from_utf8(self.body.clone())
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }
}

#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<String, StoredObject>>,
    attempts: Mutex<Vec<String>>,
    failing_names: HashSet<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse writes of the object called `name`.
    pub fn failing_on(mut self, name: impl Into<String>) -> Self {
        self.failing_names.insert(name.into());
        self
    }

    pub fn names(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn get(&self, location: &str) -> Option<StoredObject> {
        self.objects.lock().unwrap().get(location).cloned()
    }

    /// Object names in the order writes were attempted, failed ones included.
    pub fn attempts(&self) -> Vec<String> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put_object(
        &self,
        location: &ObjectLocation,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StoreError> {
        self.attempts.lock().unwrap().push(location.name.clone());

        if self.failing_names.contains(&location.name) {
            return Err(StoreError::Write {
                location: location.clone(),
                message: "disk quota exceeded".to_string(),
            });
        }

        self.objects.lock().unwrap().insert(
            location.to_string(),
            StoredObject {
                body,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }
}

// ============================================================================
// Warehouse
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    Exists,
    Missing,
    Unavailable,
}

pub struct FakeWarehouse {
    probe: Probe,
    probed: Mutex<Vec<TableRef>>,
    jobs: Mutex<Vec<LoadJob>>,
    scripts: Mutex<HashMap<String, VecDeque<JobState>>>,
    rejected_tables: HashSet<String>,
    polls: Mutex<usize>,
}

impl FakeWarehouse {
    pub fn new(probe: Probe) -> Self {
        Self {
            probe,
            probed: Mutex::new(Vec::new()),
            jobs: Mutex::new(Vec::new()),
            scripts: Mutex::new(HashMap::new()),
            rejected_tables: HashSet::new(),
            polls: Mutex::new(0),
        }
    }

    /// States returned by successive polls of jobs loading `table_id`.
    /// Unscripted jobs succeed on the first poll.
    pub fn script(self, table_id: &str, states: Vec<JobState>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(table_id.to_string(), states.into());
        self
    }

    /// Refuse job submission for `table_id`.
    pub fn rejecting(mut self, table_id: &str) -> Self {
        self.rejected_tables.insert(table_id.to_string());
        self
    }

    pub fn jobs(&self) -> Vec<LoadJob> {
        self.jobs.lock().unwrap().clone()
    }

    pub fn probed(&self) -> Vec<TableRef> {
        self.probed.lock().unwrap().clone()
    }

    pub fn polls(&self) -> usize {
        *self.polls.lock().unwrap()
    }
}

#[async_trait]
impl Warehouse for FakeWarehouse {
    async fn table_metadata(&self, table: &TableRef) -> Result<TableMetadata, WarehouseError> {
        self.probed.lock().unwrap().push(table.clone());
        match self.probe {
            Probe::Exists => Ok(TableMetadata::default()),
            Probe::Missing => Err(WarehouseError::NotFound(table.to_string())),
            Probe::Unavailable => Err(WarehouseError::Status {
                status: 500,
                body: "backend error".to_string(),
            }),
        }
    }

    async fn insert_load_job(&self, job: &LoadJob) -> Result<JobRef, WarehouseError> {
        if self.rejected_tables.contains(&job.destination.table_id) {
            return Err(WarehouseError::Status {
                status: 403,
                body: "access denied".to_string(),
            });
        }

        let mut jobs = self.jobs.lock().unwrap();
        jobs.push(job.clone());

        Ok(JobRef {
            project_id: job.destination.project_id.clone(),
            job_id: format!("{}#{}", job.destination.table_id, jobs.len()),
            location: None,
        })
    }

    async fn job_state(&self, job: &JobRef) -> Result<JobState, WarehouseError> {
        *self.polls.lock().unwrap() += 1;

        let table_id = job.job_id.split('#').next().unwrap_or_default().to_string();
        let mut scripts = self.scripts.lock().unwrap();
        let state = scripts
            .get_mut(&table_id)
            .and_then(VecDeque::pop_front)
            .unwrap_or(JobState::Succeeded);
        Ok(state)
    }
}
