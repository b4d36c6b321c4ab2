#![forbid(unsafe_code)]

use super::{FilterColumns, QueryBuilder, TaskFilter};
use crate::store::{
    MonitorStore, NonCachedTaskRow, NonDispatchedTaskRow, StoreError, TaskPopulation,
    TaskSummaryRow,
};
use ws_core::StatusLabel;

const SUMMARY_COLUMNS: &str = "runnum, tasknum, task_id, appname, status, lastUpdate, fails, \
     failcost, try_id, hostname, launched, start, waitTime, ended, runTime";
const EXTENDED_COLUMNS: &str = "depends, failReason, stdout";

const SUMMARY_FILTERS: FilterColumns = FilterColumns {
    run_number: Some("runnum"),
    task_number: Some("tasknum"),
    task_id: Some("task_id"),
    app_name: Some("appname"),
    status: Some("status"),
};

// Non-cached and non-dispatched tasks carry no task number.
const UNNUMBERED_FILTERS: FilterColumns = FilterColumns {
    run_number: Some("runnum"),
    task_number: None,
    task_id: Some("task_id"),
    app_name: Some("appname"),
    status: Some("status"),
};

const NON_CACHED_TEMPLATE: &str = r#"
        SELECT runnum, task_id, appname, status, lastUpdate, invoked, returned
        FROM nctaskview
        #filter#
        ORDER BY runnum ASC, task_id ASC
"#;

const NON_DISPATCHED_TEMPLATE: &str = r#"
        SELECT runnum, task_id, appname, task_hashsum, status, lastUpdate, invoked
        FROM ndtaskview
        #filter#
        ORDER BY runnum ASC, task_id ASC
"#;

const POPULATION_SQL: &str = r#"
        SELECT
          (SELECT count(*) FROM taskview WHERE ?1 IS NULL OR runnum = ?1),
          (SELECT count(*) FROM ndtaskview WHERE ?1 IS NULL OR runnum = ?1),
          (SELECT count(*) FROM nctaskview WHERE ?1 IS NULL OR runnum = ?1),
          (SELECT count(*) FROM task t JOIN runview rv ON rv.run_id = t.run_id
            WHERE ?1 IS NULL OR rv.runnum = ?1)
"#;

impl MonitorStore {
    /// Per-task listing rows from the `summary` view, in run then task number order.
    pub fn task_summaries(
        &self,
        filter: &TaskFilter,
        extended: bool,
    ) -> Result<Vec<TaskSummaryRow>, StoreError> {
        let template = if extended {
            format!("SELECT {SUMMARY_COLUMNS}, {EXTENDED_COLUMNS} FROM summary #filter# ORDER BY runnum ASC, tasknum ASC")
        } else {
            format!("SELECT {SUMMARY_COLUMNS} FROM summary #filter# ORDER BY runnum ASC, tasknum ASC")
        };
        let query = QueryBuilder::new(&template)
            .filter(&SUMMARY_FILTERS, filter)?
            .build()?;
        self.fetch(&query, |row| TaskSummaryRow::from_row(row, extended))
    }

    /// `(app name, latest status)` for every cached task in scope.
    pub fn status_pairs(
        &self,
        run_number: Option<i64>,
    ) -> Result<Vec<(String, StatusLabel)>, StoreError> {
        let query = QueryBuilder::new("SELECT appname, status FROM taskview #filter# ORDER BY runnum ASC, tasknum ASC")
            .filter(&SUMMARY_FILTERS, &TaskFilter::for_run(run_number))?
            .build()?;
        self.fetch(&query, |row| {
            let app: String = row.get(0)?;
            let status: String = row.get(1)?;
            Ok((app, StatusLabel::from_raw(&status)))
        })
    }

    pub fn non_cached_tasks(
        &self,
        filter: &TaskFilter,
    ) -> Result<Vec<NonCachedTaskRow>, StoreError> {
        let query = QueryBuilder::new(NON_CACHED_TEMPLATE)
            .filter(&UNNUMBERED_FILTERS, filter)?
            .build()?;
        self.fetch(&query, NonCachedTaskRow::from_row)
    }

    pub fn non_dispatched_tasks(
        &self,
        filter: &TaskFilter,
    ) -> Result<Vec<NonDispatchedTaskRow>, StoreError> {
        let query = QueryBuilder::new(NON_DISPATCHED_TEMPLATE)
            .filter(&UNNUMBERED_FILTERS, filter)?
            .build()?;
        self.fetch(&query, NonDispatchedTaskRow::from_row)
    }

    /// Task counts per view plus the raw task count, for one run or all runs.
    pub fn task_population(&self, run_number: Option<i64>) -> Result<TaskPopulation, StoreError> {
        let population = self.conn().query_row(POPULATION_SQL, [run_number], |row| {
            Ok(TaskPopulation {
                cached: row.get(0)?,
                non_dispatched: row.get(1)?,
                non_cached: row.get(2)?,
                total: row.get(3)?,
            })
        })?;
        if population.unclassified() != 0 {
            tracing::warn!(
                ?run_number,
                unclassified = population.unclassified(),
                "tasks outside every task view"
            );
        }
        Ok(population)
    }
}
