#![forbid(unsafe_code)]

use super::{FilterColumns, QueryBuilder, TaskFilter};
use crate::store::{AttemptStatsRow, MonitorStore, StoreError};

/// Grouping key for attempt statistics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroupBy {
    /// One row per task.
    Task,
    /// One row per app name, accumulated over all of its tasks.
    AppName,
}

impl GroupBy {
    pub(crate) fn column(self) -> &'static str {
        match self {
            // Task numbers repeat across runs.
            GroupBy::Task => "tv.runnum, tv.tasknum",
            GroupBy::AppName => "tv.appname",
        }
    }
}

// Durations are in minutes. An attempt missing either endpoint yields NULL,
// which sum() and count() skip, so it never contributes a zero.
const STATS_TEMPLATE: &str = r#"
        SELECT
          min(tv.runnum) AS runnum,
          min(tv.tasknum) AS tasknum,
          tv.appname,
          count(y.try_id) AS tries,
          sum((julianday(y.task_try_time_running) - julianday(y.task_try_time_launched)) * 1440)
            AS waitTime,
          count(julianday(y.task_try_time_running) - julianday(y.task_try_time_launched))
            AS waitSamples,
          sum((julianday(y.task_try_time_returned) - julianday(y.task_try_time_running)) * 1440)
            AS runTime,
          count(julianday(y.task_try_time_returned) - julianday(y.task_try_time_running))
            AS runSamples,
          sum((julianday(y.task_try_time_returned) - julianday(y.task_try_time_launched)) * 1440)
            AS elapsedTime,
          count(julianday(y.task_try_time_returned) - julianday(y.task_try_time_launched))
            AS elapsedSamples
        FROM try y
        JOIN task t ON t.run_id = y.run_id AND t.task_id = y.task_id
        JOIN taskview tv ON tv.run_id = t.run_id AND tv.task_id = t.task_id
        #filter#
        GROUP BY #groupby#
        ORDER BY min(tv.runnum) ASC, min(tv.tasknum) ASC
"#;

const STATS_COLUMNS: FilterColumns = FilterColumns {
    run_number: Some("tv.runnum"),
    task_number: Some("tv.tasknum"),
    task_id: Some("tv.task_id"),
    app_name: Some("tv.appname"),
    status: Some("tv.status"),
};

impl MonitorStore {
    pub fn attempt_stats(
        &self,
        group_by: GroupBy,
        filter: &TaskFilter,
    ) -> Result<Vec<AttemptStatsRow>, StoreError> {
        let query = QueryBuilder::new(STATS_TEMPLATE)
            .filter(&STATS_COLUMNS, filter)?
            .group_by(group_by)
            .build()?;
        tracing::debug!(?group_by, "attempt statistics query");
        self.fetch(&query, AttemptStatsRow::from_row)
    }
}
