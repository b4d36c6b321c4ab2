#![forbid(unsafe_code)]

use rusqlite::Row;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunRow {
    pub runnum: i64,
    pub run_id: String,
    pub workflow_name: Option<String>,
    pub began: Option<String>,
    pub completed: Option<String>,
    pub elapsed: Option<String>,
    pub host: Option<String>,
    pub user: Option<String>,
    pub completed_count: i64,
    pub failed_count: i64,
    pub rundir: Option<String>,
}

impl RunRow {
    pub const TITLES: [&'static str; 11] = [
        "runnum",
        "run_id",
        "workflow_name",
        "began",
        "completed",
        "runElapsedTime",
        "host",
        "user",
        "completed_count",
        "failed_count",
        "rundir",
    ];

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            runnum: row.get(0)?,
            run_id: row.get(1)?,
            workflow_name: row.get(2)?,
            began: row.get(3)?,
            completed: row.get(4)?,
            elapsed: row.get(5)?,
            host: row.get(6)?,
            user: row.get(7)?,
            completed_count: row.get(8)?,
            failed_count: row.get(9)?,
            rundir: row.get(10)?,
        })
    }

    pub fn is_open(&self) -> bool {
        self.completed.is_none()
    }
}
