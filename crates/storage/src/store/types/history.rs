#![forbid(unsafe_code)]

use rusqlite::Row;
use serde::Serialize;
use ws_core::StatusLabel;

/// One status event joined with its task and attempt.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StatusEventRow {
    pub runnum: i64,
    pub tasknum: i64,
    pub task_id: i64,
    pub appname: String,
    pub status: StatusLabel,
    pub timestamp: Option<String>,
    pub fails: Option<i64>,
    pub failcost: Option<f64>,
    pub try_id: i64,
    pub hostname: Option<String>,
    pub launched: Option<String>,
    pub start: Option<String>,
    pub wait_time: Option<String>,
    pub ended: Option<String>,
    pub run_time: Option<String>,
}

impl StatusEventRow {
    pub const TITLES: [&'static str; 15] = [
        "runnum",
        "tasknum",
        "task_id",
        "appname",
        "status",
        "timestamp",
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

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let status: String = row.get(4)?;
        Ok(Self {
            runnum: row.get(0)?,
            tasknum: row.get(1)?,
            task_id: row.get(2)?,
            appname: row.get(3)?,
            status: StatusLabel::from_raw(&status),
            timestamp: row.get(5)?,
            fails: row.get(6)?,
            failcost: row.get(7)?,
            try_id: row.get(8)?,
            hostname: row.get(9)?,
            launched: row.get(10)?,
            start: row.get(11)?,
            wait_time: row.get(12)?,
            ended: row.get(13)?,
            run_time: row.get(14)?,
        })
    }
}
