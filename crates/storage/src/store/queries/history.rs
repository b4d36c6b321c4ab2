#![forbid(unsafe_code)]

use super::{FilterColumns, QueryBuilder, TaskFilter};
use crate::store::{MonitorStore, StatusEventRow, StoreError};

const EVENT_COLUMNS: &str = concat!(
    r#"
          rv.runnum,
          tv.tasknum,
          s.task_id,
          tv.appname,
          s.task_status_name AS status,
          strftime('%Y-%m-%d %H:%M:%S', s.timestamp) AS timestamp,
          tv.fails,
          tv.failcost,
          y.try_id,
          y.hostname,
          strftime('%Y-%m-%d %H:%M:%S', y.task_try_time_launched) AS launched,
          strftime('%Y-%m-%d %H:%M:%S', y.task_try_time_running) AS start,
          "#,
    hms_between!("y.task_try_time_launched", "y.task_try_time_running"),
    r#" AS waitTime,
          strftime('%Y-%m-%d %H:%M:%S', y.task_try_time_returned) AS ended,
          "#,
    hms_between!("y.task_try_time_running", "y.task_try_time_returned"),
    r#" AS runTime
"#
);

const EVENT_SOURCES: &str = r#"
        FROM task t
        JOIN runview rv ON rv.run_id = t.run_id
        JOIN taskview tv ON tv.run_id = t.run_id AND tv.task_id = t.task_id
        JOIN try y ON y.run_id = t.run_id AND y.task_id = t.task_id
        JOIN status s ON s.run_id = t.run_id AND s.task_id = t.task_id AND s.try_id = y.try_id
"#;

// Run, task, then event time: the order task histories are read in.
const HISTORY_ORDER: &str = "ORDER BY rv.runnum, tv.tasknum, s.timestamp ASC, s.rowid ASC";
const RECENT_ORDER: &str = "ORDER BY s.timestamp DESC, s.rowid DESC";

pub(crate) const HISTORY_COLUMNS: FilterColumns = FilterColumns {
    run_number: Some("rv.runnum"),
    task_number: Some("tv.tasknum"),
    task_id: Some("tv.task_id"),
    app_name: Some("tv.appname"),
    status: Some("s.task_status_name"),
};

fn event_template(order: &str) -> String {
    format!("SELECT {EVENT_COLUMNS} {EVENT_SOURCES} #filter# {order} #limit#")
}

impl MonitorStore {
    /// Every status event of the selected tasks, ordered by run, task and time.
    pub fn task_history(
        &self,
        filter: &TaskFilter,
        limit: Option<usize>,
    ) -> Result<Vec<StatusEventRow>, StoreError> {
        let template = event_template(HISTORY_ORDER);
        let query = QueryBuilder::new(&template)
            .filter(&HISTORY_COLUMNS, filter)?
            .limit(limit)?
            .build()?;
        tracing::debug!(filter = ?filter, "task history query");
        self.fetch(&query, StatusEventRow::from_row)
    }

    /// The `limit` most recent status events across all runs, newest first.
    pub fn recent_status(&self, limit: usize) -> Result<Vec<StatusEventRow>, StoreError> {
        let template = event_template(RECENT_ORDER);
        let query = QueryBuilder::new(&template)
            .limit(Some(limit))?
            .build()?;
        self.fetch(&query, StatusEventRow::from_row)
    }
}
