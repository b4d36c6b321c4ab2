#![forbid(unsafe_code)]

use crate::store::{MonitorStore, RunRow, StoreError};

const RUNS_SQL: &str = r#"
        SELECT
          rv.runnum,
          w.run_id,
          w.workflow_name,
          rv.began,
          rv.completed,
          rv.runElapsedTime,
          w.host,
          w.user,
          coalesce(w.tasks_completed_count, 0) AS completed_count,
          coalesce(w.tasks_failed_count, 0) AS failed_count,
          w.rundir
        FROM workflow w
        JOIN runview rv ON rv.run_id = w.run_id
        ORDER BY w.time_began ASC, w.run_id ASC
"#;

impl MonitorStore {
    /// Every run, oldest first.
    pub fn load_runs(&self) -> Result<Vec<RunRow>, StoreError> {
        let mut stmt = self.conn().prepare(RUNS_SQL)?;
        let runs = stmt
            .query_map([], RunRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(runs = runs.len(), "run table loaded");
        Ok(runs)
    }
}
