//! Incremental window selection
//!
//! The conversation query is bounded by a time window. The first run against
//! an empty warehouse backfills one month; every later run takes one day.

use chrono::{DateTime, Duration, Months, SecondsFormat, Utc};
use tracing::{debug, info, warn};

use crate::warehouse::{TableRef, Warehouse, WarehouseError};

/// Half-open time interval queried for conversations. `start < end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl FetchWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// `{start}/{end}` as the conversation query expects it.
    pub fn interval(&self) -> String {
        format!(
            "{}/{}",
            self.start.to_rfc3339_opts(SecondsFormat::Millis, true),
            self.end.to_rfc3339_opts(SecondsFormat::Millis, true)
        )
    }
}

impl std::fmt::Display for FetchWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.interval())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowMode {
    /// No conversation table yet
    Bootstrap,
    Incremental,
}

impl WindowMode {
    pub fn for_table(table_exists: bool) -> Self {
        if table_exists {
            WindowMode::Incremental
        } else {
            WindowMode::Bootstrap
        }
    }
}

/// Window ending at `now`: one month when bootstrapping, one day otherwise.
pub fn select_window(table_exists: bool, now: DateTime<Utc>) -> FetchWindow {
    let start = match WindowMode::for_table(table_exists) {
        WindowMode::Bootstrap => now
            .checked_sub_months(Months::new(1))
            .unwrap_or(now - Duration::days(31)),
        WindowMode::Incremental => now - Duration::days(1),
    };

    FetchWindow { start, end: now }
}

/// Only a definite "not found" counts as absent. Any other failure prefers
/// the narrow window so a transient error never triggers a month-long backfill.
pub async fn probe_table_exists<W>(warehouse: &W, table: &TableRef) -> bool
where
    W: Warehouse + ?Sized,
{
    match warehouse.table_metadata(table).await {
        Ok(metadata) => {
            debug!(table = %table, rows = ?metadata.num_rows, "Destination table exists");
            true
        },
        Err(WarehouseError::NotFound(_)) => {
            info!(table = %table, "Destination table not found, fetching one month");
            false
        },
        Err(e) => {
            warn!(table = %table, error = %e, "Table probe failed, assuming table exists");
            true
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn test_bootstrap_window_is_one_month() {
        let now = at(2024, 5, 15, 6);
        let window = select_window(false, now);

        assert_eq!(window.end(), now);
        assert_eq!(window.start(), at(2024, 4, 15, 6));
    }

    #[test]
    fn test_incremental_window_is_one_day() {
        let now = at(2024, 5, 15, 6);
        let window = select_window(true, now);

        assert_eq!(window.end(), now);
        assert_eq!(window.duration(), Duration::days(1));
    }

    #[test]
    fn test_bootstrap_clamps_to_month_end() {
        let window = select_window(false, at(2024, 3, 31, 0));
        assert_eq!(window.start(), at(2024, 2, 29, 0));
    }

    #[test]
    fn test_interval_format() {
        let window = FetchWindow::new(at(2024, 1, 1, 0), at(2024, 1, 2, 0)).unwrap();
        assert_eq!(
            window.interval(),
            "2024-01-01T00:00:00.000Z/2024-01-02T00:00:00.000Z"
        );
    }

    #[test]
    fn test_window_rejects_empty_interval() {
        let now = at(2024, 1, 1, 0);
        assert!(FetchWindow::new(now, now).is_none());
        assert!(FetchWindow::new(now, now - Duration::hours(1)).is_none());
    }
}
