#![forbid(unsafe_code)]

//! Status tallies and run-level summary rows.

use crate::table::{Cell, Table};
use crate::{Engine, ReportError};
use serde::Serialize;
use std::path::Path;
use ws_core::ids::runinfo_dir;
use ws_core::{StatusMatrix, StatusMatrixBuilder, TOTAL_LABEL};
use ws_storage::{RunRow, TaskPopulation};

pub const STATUS_MATRIX_TITLE: &str = "Task status by app";
pub const WORKFLOW_SUMMARY_TITLE: &str = "Workflow summary";

/// One run's identity and lifecycle, with task counts for the chosen scope.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WorkflowSummary {
    pub run: RunRow,
    /// `runinfo/NNN` directory index.
    pub runinfo: String,
    pub is_current: bool,
    /// Scope of [`population`](Self::population): one run, or all runs.
    pub scope: Option<i64>,
    pub population: TaskPopulation,
    pub store_path: String,
}

impl WorkflowSummary {
    pub const TITLES: [&'static str; 19] = [
        "runnum",
        "run_id",
        "workflow_name",
        "runinfo",
        "current",
        "began",
        "completed",
        "runElapsedTime",
        "user@host",
        "exec_dir",
        "store",
        "tasks_completed",
        "tasks_failed",
        "tasks_total",
        "cached",
        "non_dispatched",
        "non_cached",
        "unclassified",
        "scope",
    ];

    /// Successful plus failed tasks, as counted by the producer.
    pub fn total_completed(&self) -> i64 {
        self.run.completed_count + self.run.failed_count
    }

    pub fn user_host(&self) -> String {
        format!(
            "{}@{}",
            self.run.user.as_deref().unwrap_or("?"),
            self.run.host.as_deref().unwrap_or("?")
        )
    }

    /// The directory the workflow was launched from: the run directory sits
    /// at `<exec_dir>/runinfo/NNN`.
    pub fn exec_dir(&self) -> Option<String> {
        let rundir = Path::new(self.run.rundir.as_deref()?);
        rundir
            .parent()
            .and_then(Path::parent)
            .map(|dir| dir.display().to_string())
    }

    pub fn to_table(&self) -> Table {
        let mut table = Table::new(WORKFLOW_SUMMARY_TITLE, Self::TITLES);
        let scope = match self.scope {
            Some(run) => format!("run {run}"),
            None => "all runs".to_string(),
        };
        table.push_row(vec![
            Cell::from(self.run.runnum),
            Cell::text(self.run.run_id.as_str()),
            Cell::from(self.run.workflow_name.clone()),
            Cell::text(format!("runinfo/{}", self.runinfo)),
            Cell::from(self.is_current),
            Cell::lifecycle(self.run.began.as_deref()),
            Cell::lifecycle(self.run.completed.as_deref()),
            Cell::lifecycle(self.run.elapsed.as_deref()),
            Cell::text(self.user_host()),
            Cell::from(self.exec_dir()),
            Cell::text(self.store_path.as_str()),
            Cell::from(self.run.completed_count),
            Cell::from(self.run.failed_count),
            Cell::from(self.total_completed()),
            Cell::from(self.population.cached),
            Cell::from(self.population.non_dispatched),
            Cell::from(self.population.non_cached),
            Cell::from(self.population.unclassified()),
            Cell::text(scope),
        ]);
        if self.population.unclassified() != 0 {
            table.note(format!(
                "{} task(s) belong to none of the cached, non-dispatched or non-cached views",
                self.population.unclassified()
            ));
        }
        table
    }
}

impl Engine {
    /// App name x latest-status tally for one run, or for all runs.
    pub fn status_matrix(&self, run_number: Option<i64>) -> Result<StatusMatrix, ReportError> {
        self.runs().check_scope(run_number)?;
        let mut builder = StatusMatrixBuilder::new();
        for (app, status) in self.store().status_pairs(run_number)? {
            builder.record(&app, &status);
        }
        let matrix = builder.finish()?;
        {
            let anomalies = matrix.anomalies();
            if !anomalies.is_empty() {
                tracing::warn!(?run_number, ?anomalies, "status labels outside the known set");
            }
        }
        Ok(matrix)
    }

    /// Summary row for the selected run (`None` = current run). Task counts
    /// cover the selected run when a run number is given, all runs otherwise.
    pub fn workflow_summary(&self, run_number: Option<i64>) -> Result<WorkflowSummary, ReportError> {
        let run = self.runs().select(run_number)?.clone();
        let is_current = self
            .runs()
            .current()
            .is_some_and(|current| current.runnum == run.runnum);
        let population = self.store().task_population(run_number)?;
        Ok(WorkflowSummary {
            runinfo: runinfo_dir(run.runnum),
            is_current,
            scope: run_number,
            population,
            store_path: self.store_path().display().to_string(),
            run,
        })
    }
}

/// Matrix rows per app plus the grand-total row. Anomalous labels get their
/// own columns, marked with a trailing `!`.
pub fn status_matrix_table(matrix: &StatusMatrix) -> Table {
    let columns = matrix.columns();
    let mut titles = vec!["appname".to_string()];
    titles.extend(columns.iter().map(|label| {
        if label.is_anomalous() {
            format!("{label}!")
        } else {
            label.to_string()
        }
    }));
    titles.push(TOTAL_LABEL.to_string());

    let mut table = Table::new(STATUS_MATRIX_TITLE, titles);
    for (app, tally) in matrix.rows() {
        let mut row = vec![Cell::text(app)];
        row.extend(columns.iter().map(|label| Cell::from(tally.count(label))));
        row.push(Cell::from(tally.total()));
        table.push_row(row);
    }
    if !matrix.is_empty() {
        let totals = matrix.totals();
        let mut row = vec![Cell::text(TOTAL_LABEL)];
        row.extend(columns.iter().map(|label| Cell::from(totals.count(label))));
        row.push(Cell::from(totals.total()));
        table.push_row(row);
    }
    for label in matrix.anomalies() {
        table.note(format!("anomalous status label {label:?} counted under {label}!"));
    }
    table
}
