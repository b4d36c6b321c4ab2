#![forbid(unsafe_code)]

//! Named reports composed from the store queries and the aggregations.
//!
//! Every driver validates its run scope against the engine's run catalog
//! first, so an unknown run fails with `RunNotFound` before any query runs.

use crate::aggregate::status_matrix_table;
use crate::sequences::state_transitions_table;
use crate::table::{Cell, Report, Table};
use crate::{Engine, ReportError, ReportOptions};
use ws_storage::{
    AttemptStatsRow, BlockRow, GroupBy, NodeRow, NonCachedTaskRow, NonDispatchedTaskRow, RunRow,
    SchemaKind, StatusEventRow, TaskFilter, TaskSummaryRow,
};

/// Blocks listed by the short summary.
pub const SHORT_SUMMARY_BLOCKS: usize = 5;

pub const BATCH_SUMMARY_TITLE: &str = "Batch summary";
pub const TASK_LISTING_TITLE: &str = "Task summary";
pub const NON_CACHED_TITLE: &str = "Non-cached tasks";
pub const NON_DISPATCHED_TITLE: &str = "Non-dispatched cached tasks";
pub const TASK_HISTORY_TITLE: &str = "Task history";
pub const RUN_HISTORY_TITLE: &str = "Run history";
pub const RECENT_STATUS_TITLE: &str = "Recent status";
pub const APP_STATISTICS_TITLE: &str = "App statistics";
pub const TASK_DURATIONS_TITLE: &str = "Task durations";
pub const NODES_TITLE: &str = "Worker nodes";

const STATS_TITLES: [&str; 10] = [
    "runnum",
    "tasknum",
    "appname",
    "tries",
    "wait_min",
    "wait_samples",
    "run_min",
    "run_samples",
    "elapsed_min",
    "elapsed_samples",
];

impl Engine {
    /// Run summary, status matrix and the first few batch blocks.
    pub fn short_summary(&self, options: &ReportOptions) -> Result<Report, ReportError> {
        let sections = self.summary_sections(options, Some(SHORT_SUMMARY_BLOCKS))?;
        Ok(Report::new("Short summary", sections))
    }

    /// The short summary plus the per-task listing; `include_oddball` adds the
    /// non-cached and non-dispatched tasks.
    pub fn task_summary(&self, options: &ReportOptions) -> Result<Report, ReportError> {
        let mut sections = self.summary_sections(options, None)?;

        let rows = self
            .store()
            .task_summaries(&options.task_filter(), options.extended_columns)?;
        let selected = rows.len();
        let shown = options.row_limit().map_or(selected, |limit| limit.min(selected));
        let mut listing = task_listing_table(&rows[..shown], options.extended_columns);
        listing.note(format!("{selected} task(s) selected, {shown} listed"));
        sections.push(listing);

        if options.include_oddball {
            let filter = unnumbered_filter(options);
            sections.push(non_cached_table(&self.store().non_cached_tasks(&filter)?));
            sections.push(non_dispatched_table(
                &self.store().non_dispatched_tasks(&filter)?,
            ));
        }
        Ok(Report::new("Task summary", sections))
    }

    /// Every status event of the selected tasks, in time order, followed by the
    /// status matrix. A run selector also puts the workflow summary first.
    ///
    /// The selection must name an app, a task number, or a task id together
    /// with a run number; anything less fails before the store is queried.
    pub fn task_history(&self, options: &ReportOptions) -> Result<Report, ReportError> {
        let filter = options.task_filter();
        if !filter.identifies_task() {
            return Err(ReportError::AmbiguousSelector);
        }
        self.runs().check_scope(options.run_number)?;

        let mut sections = Vec::new();
        if options.run_number.is_some() {
            sections.push(self.workflow_summary(options.run_number)?.to_table());
        }

        let events = self.store().task_history(&filter, options.row_limit())?;
        let mut table = Table::new(TASK_HISTORY_TITLE, StatusEventRow::TITLES);
        for event in &events {
            table.push_row(status_event_cells(event));
        }
        if events.is_empty() {
            table.note("no status events match the selection");
        }
        sections.push(table);
        sections.push(status_matrix_table(
            &self.status_matrix(options.run_number)?,
        ));
        Ok(Report::new("Task history", sections))
    }

    pub fn run_history(&self) -> Result<Report, ReportError> {
        let mut table = Table::new(RUN_HISTORY_TITLE, RunRow::TITLES);
        for run in self.runs().runs() {
            table.push_row(run_cells(run));
        }
        if let Some((min, max)) = self.runs().range() {
            table.note(format!("runs {min}..={max}"));
        }
        Ok(Report::new("Run history", vec![table]))
    }

    /// The most recent status events across all runs, newest first.
    pub fn recent_status(&self, options: &ReportOptions) -> Result<Report, ReportError> {
        let events = self.store().recent_status(options.status_limit)?;
        let mut table = Table::new(RECENT_STATUS_TITLE, StatusEventRow::TITLES);
        for event in &events {
            table.push_row(status_event_cells(event));
        }
        Ok(Report::new("Recent status", vec![table]))
    }

    pub fn non_cached_summary(&self, options: &ReportOptions) -> Result<Report, ReportError> {
        self.runs().check_scope(options.run_number)?;
        let filter = unnumbered_filter(options);
        let sections = vec![
            non_cached_table(&self.store().non_cached_tasks(&filter)?),
            non_dispatched_table(&self.store().non_dispatched_tasks(&filter)?),
        ];
        Ok(Report::new("Non-cached task summary", sections))
    }

    /// Try counts and accumulated wait/run/elapsed minutes per app name.
    pub fn app_statistics(&self, options: &ReportOptions) -> Result<Report, ReportError> {
        self.runs().check_scope(options.run_number)?;
        let rows = self
            .store()
            .attempt_stats(GroupBy::AppName, &options.task_filter())?;
        let table = stats_table(APP_STATISTICS_TITLE, &rows);
        Ok(Report::new("App statistics", vec![table]))
    }

    /// Per-task duration samples, grouped by app name.
    pub fn task_durations(&self, options: &ReportOptions) -> Result<Report, ReportError> {
        self.runs().check_scope(options.run_number)?;
        let mut rows = self
            .store()
            .attempt_stats(GroupBy::Task, &options.task_filter())?;
        rows.sort_by(|a, b| {
            a.appname
                .cmp(&b.appname)
                .then(a.runnum.cmp(&b.runnum))
                .then(a.tasknum.cmp(&b.tasknum))
        });
        let table = stats_table(TASK_DURATIONS_TITLE, &rows);
        Ok(Report::new("Task durations", vec![table]))
    }

    /// Reconstructed status sequence of every attempt in one run
    /// (`None` = current run).
    pub fn state_transitions_report(&self, options: &ReportOptions) -> Result<Report, ReportError> {
        let run = self.runs().select(options.run_number)?.runnum;
        let sequences = self.state_transitions(Some(run))?;
        let table = state_transitions_table(run, &sequences);
        Ok(Report::new("State transitions", vec![table]))
    }

    /// Blocks and the worker nodes reporting from them.
    pub fn node_summary(&self, options: &ReportOptions) -> Result<Report, ReportError> {
        self.runs().check_scope(options.run_number)?;
        let blocks = self.store().blocks(options.run_number, options.row_limit())?;
        let nodes = self.store().nodes(options.run_number)?;

        let mut node_table = Table::new(NODES_TITLE, NodeRow::TITLES);
        for node in &nodes {
            node_table.push_row(node_cells(node));
        }
        let active = nodes.iter().filter(|node| node.active).count();
        node_table.note(format!("{} node(s), {active} active", nodes.len()));
        Ok(Report::new(
            "Node summary",
            vec![block_table(&blocks), node_table],
        ))
    }

    /// Names and `CREATE` statements of every table and view.
    pub fn schema_report(&self) -> Result<Report, ReportError> {
        let mut sections = Vec::new();
        for (kind, title) in [(SchemaKind::Table, "Tables"), (SchemaKind::View, "Views")] {
            let mut table = Table::new(title, ["name", "sql"]);
            for entry in self.store().schema(kind, None)? {
                table.push_row(vec![Cell::text(entry.name), Cell::from(entry.sql)]);
            }
            sections.push(table);
        }
        let missing = self.store().missing_tables()?;
        if !missing.is_empty()
            && let Some(tables) = sections.first_mut()
        {
            tables.note(format!("missing producer tables: {}", missing.join(", ")));
        }
        Ok(Report::new("Schema", sections))
    }

    fn summary_sections(
        &self,
        options: &ReportOptions,
        block_limit: Option<usize>,
    ) -> Result<Vec<Table>, ReportError> {
        let summary = self.workflow_summary(options.run_number)?;
        let matrix = self.status_matrix(options.run_number)?;
        let blocks = self.store().blocks(options.run_number, block_limit)?;

        Ok(vec![
            summary.to_table(),
            status_matrix_table(&matrix),
            block_table(&blocks),
        ])
    }
}

fn unnumbered_filter(options: &ReportOptions) -> TaskFilter {
    TaskFilter {
        task_number: None,
        ..options.task_filter()
    }
}

fn task_listing_table(rows: &[TaskSummaryRow], extended: bool) -> Table {
    let mut titles: Vec<&str> = TaskSummaryRow::TITLES.to_vec();
    if extended {
        titles.extend(TaskSummaryRow::EXTENDED_TITLES);
    }
    let mut table = Table::new(TASK_LISTING_TITLE, titles);
    for row in rows {
        let mut cells = vec![
            Cell::from(row.runnum),
            Cell::from(row.tasknum),
            Cell::from(row.task_id),
            Cell::text(row.appname.as_str()),
            Cell::from(&row.status),
            Cell::from(row.last_update.clone()),
            Cell::from(row.fails),
            Cell::from(row.failcost),
            Cell::from(row.try_id),
            Cell::from(row.hostname.clone()),
            Cell::lifecycle(row.launched.as_deref()),
            Cell::lifecycle(row.start.as_deref()),
            Cell::from(row.wait_time.clone()),
            Cell::lifecycle(row.ended.as_deref()),
            Cell::from(row.run_time.clone()),
        ];
        if let Some(ext) = row.extended.as_ref().filter(|_| extended) {
            cells.push(Cell::from(ext.depends.clone()));
            cells.push(Cell::from(ext.fail_reason.clone()));
            cells.push(Cell::from(ext.stdout.clone()));
        }
        table.push_row(cells);
    }
    table
}

fn non_cached_table(rows: &[NonCachedTaskRow]) -> Table {
    let mut table = Table::new(NON_CACHED_TITLE, NonCachedTaskRow::TITLES);
    for row in rows {
        table.push_row(vec![
            Cell::from(row.runnum),
            Cell::from(row.task_id),
            Cell::text(row.appname.as_str()),
            Cell::from(row.status.as_ref()),
            Cell::from(row.last_update.clone()),
            Cell::lifecycle(row.invoked.as_deref()),
            Cell::lifecycle(row.returned.as_deref()),
        ]);
    }
    table
}

fn non_dispatched_table(rows: &[NonDispatchedTaskRow]) -> Table {
    let mut table = Table::new(NON_DISPATCHED_TITLE, NonDispatchedTaskRow::TITLES);
    for row in rows {
        table.push_row(vec![
            Cell::from(row.runnum),
            Cell::from(row.task_id),
            Cell::text(row.appname.as_str()),
            Cell::text(row.task_hashsum.as_str()),
            Cell::from(row.status.as_ref()),
            Cell::from(row.last_update.clone()),
            Cell::lifecycle(row.invoked.as_deref()),
        ]);
    }
    table
}

fn status_event_cells(event: &StatusEventRow) -> Vec<Cell> {
    vec![
        Cell::from(event.runnum),
        Cell::from(event.tasknum),
        Cell::from(event.task_id),
        Cell::text(event.appname.as_str()),
        Cell::from(&event.status),
        Cell::from(event.timestamp.clone()),
        Cell::from(event.fails),
        Cell::from(event.failcost),
        Cell::from(event.try_id),
        Cell::from(event.hostname.clone()),
        Cell::lifecycle(event.launched.as_deref()),
        Cell::lifecycle(event.start.as_deref()),
        Cell::from(event.wait_time.clone()),
        Cell::lifecycle(event.ended.as_deref()),
        Cell::from(event.run_time.clone()),
    ]
}

fn run_cells(run: &RunRow) -> Vec<Cell> {
    vec![
        Cell::from(run.runnum),
        Cell::text(run.run_id.as_str()),
        Cell::from(run.workflow_name.clone()),
        Cell::lifecycle(run.began.as_deref()),
        Cell::lifecycle(run.completed.as_deref()),
        Cell::lifecycle(run.elapsed.as_deref()),
        Cell::from(run.host.clone()),
        Cell::from(run.user.clone()),
        Cell::from(run.completed_count),
        Cell::from(run.failed_count),
        Cell::from(run.rundir.clone()),
    ]
}

fn block_table(blocks: &[BlockRow]) -> Table {
    let mut table = Table::new(BATCH_SUMMARY_TITLE, BlockRow::TITLES);
    for block in blocks {
        table.push_row(vec![
            Cell::from(block.runnum),
            Cell::from(block.executor_label.clone()),
            Cell::from(block.block_id.clone()),
            Cell::from(block.job_id.clone()),
            Cell::from(block.status.clone()),
            Cell::from(block.first_seen.clone()),
            Cell::from(block.last_update.clone()),
            Cell::from(block.nodes),
        ]);
    }
    table
}

fn node_cells(node: &NodeRow) -> Vec<Cell> {
    vec![
        Cell::from(node.runnum),
        Cell::text(node.hostname.as_str()),
        Cell::from(node.block_id.clone()),
        Cell::from(node.cpu_count),
        Cell::from(node.total_memory),
        Cell::from(node.worker_count),
        Cell::from(node.active),
        Cell::from(node.last_heartbeat.clone()),
    ]
}

fn stats_table(title: &str, rows: &[AttemptStatsRow]) -> Table {
    let mut table = Table::new(title, STATS_TITLES);
    for row in rows {
        table.push_row(vec![
            Cell::from(row.runnum),
            Cell::from(row.tasknum),
            Cell::text(row.appname.as_str()),
            Cell::from(row.tries),
            Cell::from(row.wait.minutes),
            Cell::from(row.wait.samples),
            Cell::from(row.run.minutes),
            Cell::from(row.run.samples),
            Cell::from(row.elapsed.minutes),
            Cell::from(row.elapsed.samples),
        ]);
    }
    table
}
