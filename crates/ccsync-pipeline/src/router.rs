//! Entity router
//!
//! The storage event only carries an untyped `bucket/name` path. The router
//! turns it into an [`EntityKind`] once, then everything downstream works on
//! the tagged kind.

use ccsync_common::{EntityKind, ObjectName};
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::config::EntityTables;
use crate::error::PipelineError;
use crate::loader::{BulkLoader, LoadResult};
use crate::schema::EntityConfig;
use crate::storage::ObjectLocation;

/// First entity token found in `path`, in routing priority order.
pub fn classify(path: &str) -> Option<EntityKind> {
    EntityKind::ROUTING_ORDER
        .into_iter()
        .find(|entity| path.contains(entity.token()))
}

/// Page metadata of an object written by the stager, if its name follows
/// the `{date}_{token}_{index}.json` convention.
pub fn staged_name(location: &ObjectLocation) -> Option<ObjectName> {
    ObjectName::parse(&location.name).ok()
}

/// Object-creation notification. Only the fields routing needs are read.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageEvent {
    pub bucket: String,
    pub name: String,
}

impl StorageEvent {
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    pub fn location(&self) -> ObjectLocation {
        ObjectLocation::new(&self.bucket, &self.name)
    }
}

#[derive(Debug)]
pub enum LoadOutcome {
    Loaded {
        entity: EntityKind,
        result: LoadResult,
    },
    /// No entity token in the path
    Ignored,
    Failed {
        entity: EntityKind,
        error: PipelineError,
    },
}

impl LoadOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, LoadOutcome::Failed { .. })
    }
}

pub struct EntityRouter {
    loader: BulkLoader,
    tables: EntityTables,
}

impl EntityRouter {
    pub fn new(loader: BulkLoader, tables: EntityTables) -> Self {
        Self { loader, tables }
    }

    pub fn config_for(&self, entity: EntityKind) -> EntityConfig {
        EntityConfig::for_entity(entity, self.tables.table_for(entity).clone())
    }

    #[instrument(skip(self, location), fields(object = %location))]
    pub async fn route_and_load(&self, location: &ObjectLocation) -> LoadOutcome {
        let Some(entity) = classify(&location.to_string()) else {
            info!("No entity token in object path, ignoring");
            return LoadOutcome::Ignored;
        };

        let config = self.config_for(entity);
        match staged_name(location) {
            Some(name) => info!(
                entity = %entity,
                table = %config.table,
                date = %name.date(),
                page_index = name.index(),
                "Routing staged page"
            ),
            None => {
                debug!("Object name does not follow the staging convention");
                info!(entity = %entity, table = %config.table, "Routing object");
            },
        }

        match self.loader.load(location, &config).await {
            Ok(result) => LoadOutcome::Loaded { entity, result },
            Err(error) => {
                warn!(entity = %entity, table = %config.table, error = %error, "Load failed");
                LoadOutcome::Failed { entity, error }
            },
        }
    }
}
