//! Paginator
//!
//! Fetches page 1 to learn the result set size, then walks the remaining
//! pages in order. Every page is handed to the [`Stager`] before the next one
//! is requested.
//!
//! Failure severity depends on how far paging got:
//!
//! - page 1 fails: nothing was staged, the error carries `partial: false`
//! - a later page fails: earlier pages stay staged, the error carries `partial: true`
//! - staging fails: logged and recorded, paging continues

use ccsync_common::{EntityKind, ObjectName};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::api::{AnalyticsApi, Page};
use crate::error::{PipelineError, Result};
use crate::stager::{StagedObject, Stager};
use crate::window::FetchWindow;

/// Smallest page size ever requested; zero is raised to it.
pub const MIN_PAGE_SIZE: u32 = 1;

/// Number of pages fetched for a result set of `total_hits`.
///
/// Conversation queries round up by always requesting one page past the
/// floor; directory listings stop at the floor.
pub fn page_count(entity: EntityKind, total_hits: u64, page_size: u32) -> u32 {
    let page_size = u64::from(page_size.max(MIN_PAGE_SIZE));
    if total_hits <= page_size {
        return 1;
    }

    let full_pages = total_hits / page_size;
    let pages = match entity {
        EntityKind::Conversation => full_pages + 1,
        EntityKind::User | EntityKind::Queue => full_pages,
    };
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// A page that could not be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageFailure {
    pub name: ObjectName,
    pub error: String,
}

/// Staging results accumulated while paging one entity
#[derive(Debug, Clone, Default)]
pub struct StagingLog {
    pub staged: Vec<StagedObject>,
    pub failures: Vec<StageFailure>,
}

/// Result set size and pages retrieved by a completed fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchSummary {
    pub total_hits: u64,
    pub pages_fetched: u32,
}

pub struct Paginator {
    api: Arc<dyn AnalyticsApi>,
    stager: Stager,
    date: NaiveDate,
}

impl Paginator {
    /// `date` is stamped into every object name staged by this paginator.
    pub fn new(api: Arc<dyn AnalyticsApi>, stager: Stager, date: NaiveDate) -> Self {
        Self { api, stager, date }
    }

    #[instrument(skip(self, window, log), fields(entity = %entity))]
    pub async fn fetch_all(
        &self,
        entity: EntityKind,
        page_size: u32,
        window: Option<&FetchWindow>,
        log: &mut StagingLog,
    ) -> Result<FetchSummary> {
        let page_size = page_size.max(MIN_PAGE_SIZE);
        let first = self
            .api
            .fetch_page(entity, 1, page_size, window)
            .await
            .map_err(|source| PipelineError::Fetch {
                entity,
                page: 1,
                partial: false,
                source,
            })?;

        let total_hits = first.total_hits;
        let pages = page_count(entity, total_hits, page_size);
        info!(total_hits, page_size, pages, "Fetched first page");

        self.stage_page(&first, 0, log).await;

        for page_number in 2..=pages {
            let page = self
                .api
                .fetch_page(entity, page_number, page_size, window)
                .await
                .map_err(|source| PipelineError::Fetch {
                    entity,
                    page: page_number,
                    partial: true,
                    source,
                })?;

            if page.total_hits != total_hits {
                warn!(
                    page = page_number,
                    expected = total_hits,
                    reported = page.total_hits,
                    "Result set size changed between pages"
                );
            }

            self.stage_page(&page, page_number - 1, log).await;
        }

        Ok(FetchSummary {
            total_hits,
            pages_fetched: pages,
        })
    }

    async fn stage_page(&self, page: &Page, index: u32, log: &mut StagingLog) {
        let name = ObjectName::new(self.date, page.entity, index);

        match self.stager.stage(name, &page.records).await {
            Ok(staged) => log.staged.push(staged),
            Err(source) => {
                let error = PipelineError::Stage {
                    object: name.to_string(),
                    source,
                };
                warn!(object = %name, page = page.page_number, error = %error, "Staging failed, continuing");
                log.failures.push(StageFailure {
                    name,
                    error: error.to_string(),
                });
            },
        }
    }
}
