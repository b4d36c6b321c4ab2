#![forbid(unsafe_code)]

use rusqlite::Row;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct BlockRow {
    pub runnum: i64,
    pub executor_label: Option<String>,
    pub block_id: Option<String>,
    pub job_id: Option<String>,
    pub status: Option<String>,
    pub first_seen: Option<String>,
    pub last_update: Option<String>,
    pub nodes: i64,
}

impl BlockRow {
    pub const TITLES: [&'static str; 8] = [
        "runnum",
        "executor_label",
        "block_id",
        "job_id",
        "status",
        "firstSeen",
        "lastUpdate",
        "nodes",
    ];

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            runnum: row.get(0)?,
            executor_label: row.get(1)?,
            block_id: row.get(2)?,
            job_id: row.get(3)?,
            status: row.get(4)?,
            first_seen: row.get(5)?,
            last_update: row.get(6)?,
            nodes: row.get(7)?,
        })
    }
}

/// Latest report from one worker node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NodeRow {
    pub runnum: i64,
    pub hostname: String,
    pub block_id: Option<String>,
    pub cpu_count: Option<i64>,
    pub total_memory: Option<i64>,
    pub worker_count: Option<i64>,
    pub active: bool,
    pub last_heartbeat: Option<String>,
}

impl NodeRow {
    pub const TITLES: [&'static str; 8] = [
        "runnum",
        "hostname",
        "block_id",
        "cpu_count",
        "total_memory",
        "worker_count",
        "active",
        "last_heartbeat",
    ];

    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let active: Option<i64> = row.get(6)?;
        Ok(Self {
            runnum: row.get(0)?,
            hostname: row.get(1)?,
            block_id: row.get(2)?,
            cpu_count: row.get(3)?,
            total_memory: row.get(4)?,
            worker_count: row.get(5)?,
            active: active.unwrap_or(0) != 0,
            last_heartbeat: row.get(7)?,
        })
    }
}
