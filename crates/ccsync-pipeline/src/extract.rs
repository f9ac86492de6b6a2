//! Extraction run
//!
//! Picks the conversation window, then pages every entity kind into the
//! staging bucket one after another. Each entity is isolated: a failure while
//! paging one kind is recorded in the report and the run moves on.

use ccsync_common::EntityKind;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::api::AnalyticsApi;
use crate::config::{ExtractConfig, DEFAULT_PAGE_SIZE_CONVERSATION, DEFAULT_PAGE_SIZE_DIRECTORY};
use crate::paginator::{FetchSummary, Paginator, StageFailure, StagingLog, MIN_PAGE_SIZE};
use crate::stager::{StagedObject, Stager};
use crate::warehouse::{TableRef, Warehouse};
use crate::window::{probe_table_exists, select_window, FetchWindow, WindowMode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityOutcome {
    Completed(FetchSummary),
    /// First page failed, nothing was staged
    Skipped { reason: String },
    /// A later page failed after some pages were staged
    Aborted { reason: String },
}

#[derive(Debug, Clone)]
pub struct EntityReport {
    pub entity: EntityKind,
    pub outcome: EntityOutcome,
    pub staged: Vec<StagedObject>,
    pub stage_failures: Vec<StageFailure>,
}

#[derive(Debug, Clone)]
pub struct ExtractReport {
    pub mode: WindowMode,
    pub window: FetchWindow,
    pub entities: Vec<EntityReport>,
}

impl ExtractReport {
    /// Skipped entities and staging failures do not fail a run; a partial
    /// retrieval does.
    pub fn is_success(&self) -> bool {
        !self
            .entities
            .iter()
            .any(|report| matches!(report.outcome, EntityOutcome::Aborted { .. }))
    }

    /// Every object written during the run, in staging order.
    pub fn staged_objects(&self) -> impl Iterator<Item = &StagedObject> {
        self.entities.iter().flat_map(|report| report.staged.iter())
    }

    pub fn entity(&self, entity: EntityKind) -> Option<&EntityReport> {
        self.entities.iter().find(|report| report.entity == entity)
    }

    pub fn log_summary(&self) {
        for report in &self.entities {
            match &report.outcome {
                EntityOutcome::Completed(summary) => info!(
                    entity = %report.entity,
                    total_hits = summary.total_hits,
                    pages = summary.pages_fetched,
                    staged = report.staged.len(),
                    stage_failures = report.stage_failures.len(),
                    "Entity extracted"
                ),
                EntityOutcome::Skipped { reason } => {
                    warn!(entity = %report.entity, reason = %reason, "Entity skipped")
                },
                EntityOutcome::Aborted { reason } => error!(
                    entity = %report.entity,
                    staged = report.staged.len(),
                    reason = %reason,
                    "Entity extraction aborted"
                ),
            }
        }

        info!(
            mode = ?self.mode,
            window = %self.window,
            staged = self.staged_objects().count(),
            success = self.is_success(),
            "Extraction run finished"
        );
    }
}

pub struct ExtractRun {
    api: Arc<dyn AnalyticsApi>,
    warehouse: Arc<dyn Warehouse>,
    stager: Stager,
    conversation_table: TableRef,
    page_size_conversation: u32,
    page_size_directory: u32,
}

impl ExtractRun {
    pub fn new(
        api: Arc<dyn AnalyticsApi>,
        warehouse: Arc<dyn Warehouse>,
        stager: Stager,
        conversation_table: TableRef,
    ) -> Self {
        Self {
            api,
            warehouse,
            stager,
            conversation_table,
            page_size_conversation: DEFAULT_PAGE_SIZE_CONVERSATION,
            page_size_directory: DEFAULT_PAGE_SIZE_DIRECTORY,
        }
    }

    pub fn from_config(
        api: Arc<dyn AnalyticsApi>,
        warehouse: Arc<dyn Warehouse>,
        stager: Stager,
        config: &ExtractConfig,
    ) -> Self {
        Self::new(api, warehouse, stager, config.conversation_table.clone())
            .with_page_sizes(config.page_size_conversation, config.page_size_directory)
    }

    /// Zero is raised to [`MIN_PAGE_SIZE`].
    pub fn with_page_sizes(mut self, conversation: u32, directory: u32) -> Self {
        self.page_size_conversation = conversation.max(MIN_PAGE_SIZE);
        self.page_size_directory = directory.max(MIN_PAGE_SIZE);
        self
    }

    fn page_size_for(&self, entity: EntityKind) -> u32 {
        match entity {
            EntityKind::Conversation => self.page_size_conversation,
            EntityKind::User | EntityKind::Queue => self.page_size_directory,
        }
    }

    pub async fn run(&self, now: DateTime<Utc>) -> ExtractReport {
        let table_exists = probe_table_exists(self.warehouse.as_ref(), &self.conversation_table).await;
        let mode = WindowMode::for_table(table_exists);
        let window = select_window(table_exists, now);
        info!(mode = ?mode, window = %window, "Starting extraction run");

        let paginator = Paginator::new(self.api.clone(), self.stager.clone(), now.date_naive());
        let mut entities = Vec::with_capacity(EntityKind::EXTRACTION_ORDER.len());

        for entity in EntityKind::EXTRACTION_ORDER {
            let mut log = StagingLog::default();
            let entity_window = entity.is_windowed().then_some(&window);

            let outcome = match paginator
                .fetch_all(entity, self.page_size_for(entity), entity_window, &mut log)
                .await
            {
                Ok(summary) => EntityOutcome::Completed(summary),
                Err(e) if e.is_partial_fetch() => {
                    error!(entity = %entity, error = %e, "Paging aborted, continuing with next entity");
                    EntityOutcome::Aborted {
                        reason: e.to_string(),
                    }
                },
                Err(e) => {
                    warn!(entity = %entity, error = %e, "First page failed, skipping entity");
                    EntityOutcome::Skipped {
                        reason: e.to_string(),
                    }
                },
            };

            entities.push(EntityReport {
                entity,
                outcome,
                staged: log.staged,
                stage_failures: log.failures,
            });
        }

        ExtractReport {
            mode,
            window,
            entities,
        }
    }
}
