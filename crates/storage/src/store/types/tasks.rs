#![forbid(unsafe_code)]

use rusqlite::Row;
use serde::Serialize;
use ws_core::StatusLabel;

/// One cached task with its latest status and latest attempt.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TaskSummaryRow {
    pub runnum: i64,
    pub tasknum: i64,
    pub task_id: i64,
    pub appname: String,
    pub status: StatusLabel,
    pub last_update: Option<String>,
    pub fails: Option<i64>,
    pub failcost: Option<f64>,
    pub try_id: Option<i64>,
    pub hostname: Option<String>,
    pub launched: Option<String>,
    pub start: Option<String>,
    pub wait_time: Option<String>,
    pub ended: Option<String>,
    pub run_time: Option<String>,
    pub extended: Option<TaskExtendedColumns>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TaskExtendedColumns {
    pub depends: Option<String>,
    pub fail_reason: Option<String>,
    pub stdout: Option<String>,
}

impl TaskSummaryRow {
    pub const TITLES: [&'static str; 15] = [
        "runnum",
        "tasknum",
        "task_id",
        "appname",
        "status",
        "lastUpdate",
        "fails",
        "failcost",
        "try_id",
        "hostname",
        "launched",
        "start",
        "waitTime",
        "ended",
        "runTime",
    ];
    pub const EXTENDED_TITLES: [&'static str; 3] = ["depends", "failReason", "stdout"];

    pub(crate) fn from_row(row: &Row<'_>, extended: bool) -> rusqlite::Result<Self> {
        let status: String = row.get(4)?;
        let extended = if extended {
            Some(TaskExtendedColumns {
                depends: row.get(15)?,
                fail_reason: row.get(16)?,
                stdout: row.get(17)?,
            })
        } else {
            None
        };
        Ok(Self {
            runnum: row.get(0)?,
            tasknum: row.get(1)?,
            task_id: row.get(2)?,
            appname: row.get(3)?,
            status: StatusLabel::from_raw(&status),
            last_update: row.get(5)?,
            fails: row.get(6)?,
            failcost: row.get(7)?,
            try_id: row.get(8)?,
            hostname: row.get(9)?,
            launched: row.get(10)?,
            start: row.get(11)?,
            wait_time: row.get(12)?,
            ended: row.get(13)?,
            run_time: row.get(14)?,
            extended,
        })
    }
}

/// A task without a content hash.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NonCachedTaskRow {
    pub runnum: i64,
    pub task_id: i64,
    pub appname: String,
    pub status: Option<StatusLabel>,
    pub last_update: Option<String>,
    pub invoked: Option<String>,
    pub returned: Option<String>,
}

impl NonCachedTaskRow {
    pub const TITLES: [&'static str; 7] = [
        "runnum",
        "task_id",
        "appname",
        "status",
        "lastUpdate",
        "invoked",
        "returned",
    ];

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let status: Option<String> = row.get(3)?;
        Ok(Self {
            runnum: row.get(0)?,
            task_id: row.get(1)?,
            appname: row.get(2)?,
            status: status.as_deref().map(StatusLabel::from_raw),
            last_update: row.get(4)?,
            invoked: row.get(5)?,
            returned: row.get(6)?,
        })
    }
}

/// A cached task that was never handed to an executor.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NonDispatchedTaskRow {
    pub runnum: i64,
    pub task_id: i64,
    pub appname: String,
    pub task_hashsum: String,
    pub status: Option<StatusLabel>,
    pub last_update: Option<String>,
    pub invoked: Option<String>,
}

impl NonDispatchedTaskRow {
    pub const TITLES: [&'static str; 7] = [
        "runnum",
        "task_id",
        "appname",
        "task_hashsum",
        "status",
        "lastUpdate",
        "invoked",
    ];

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let status: Option<String> = row.get(4)?;
        Ok(Self {
            runnum: row.get(0)?,
            task_id: row.get(1)?,
            appname: row.get(2)?,
            task_hashsum: row.get(3)?,
            status: status.as_deref().map(StatusLabel::from_raw),
            last_update: row.get(5)?,
            invoked: row.get(6)?,
        })
    }
}

/// Task counts per view, for one run or for all runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TaskPopulation {
    pub cached: i64,
    pub non_dispatched: i64,
    pub non_cached: i64,
    pub total: i64,
}

impl TaskPopulation {
    /// Tasks present in the store but in none of the three task views.
    pub fn unclassified(&self) -> i64 {
        self.total - self.cached - self.non_dispatched - self.non_cached
    }
}
