//! Load run
//!
//! Routes each staged object independently. One object's failure never
//! undoes or prevents another's load; the run succeeds only if none failed.

use tracing::{error, info};

use crate::router::{EntityRouter, LoadOutcome};
use crate::storage::ObjectLocation;

#[derive(Debug)]
pub struct ObjectReport {
    pub location: ObjectLocation,
    pub outcome: LoadOutcome,
}

#[derive(Debug, Default)]
pub struct LoadReport {
    pub objects: Vec<ObjectReport>,
}

impl LoadReport {
    pub fn is_success(&self) -> bool {
        self.objects.iter().all(|report| !report.outcome.is_failure())
    }

    pub fn loaded(&self) -> usize {
        self.count(|outcome| matches!(outcome, LoadOutcome::Loaded { .. }))
    }

    pub fn ignored(&self) -> usize {
        self.count(|outcome| matches!(outcome, LoadOutcome::Ignored))
    }

    pub fn failed(&self) -> usize {
        self.count(LoadOutcome::is_failure)
    }

    fn count(&self, predicate: impl Fn(&LoadOutcome) -> bool) -> usize {
        self.objects
            .iter()
            .filter(|report| predicate(&report.outcome))
            .count()
    }

    pub fn log_summary(&self) {
        for report in &self.objects {
            if let LoadOutcome::Failed { entity, error } = &report.outcome {
                error!(object = %report.location, entity = %entity, error = %error, "Object not loaded");
            }
        }

        info!(
            loaded = self.loaded(),
            ignored = self.ignored(),
            failed = self.failed(),
            success = self.is_success(),
            "Load run finished"
        );
    }
}

pub struct LoadRun {
    router: EntityRouter,
}

impl LoadRun {
    pub fn new(router: EntityRouter) -> Self {
        Self { router }
    }

    pub async fn run(&self, locations: &[ObjectLocation]) -> LoadReport {
        let mut report = LoadReport::default();

        for location in locations {
            info!(bucket = %location.bucket, object = %location.name, "Received object");
            let outcome = self.router.route_and_load(location).await;
            report.objects.push(ObjectReport {
                location: location.clone(),
                outcome,
            });
        }

        report
    }
}
