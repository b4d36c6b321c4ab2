#![forbid(unsafe_code)]

//! Synthetic monitoring databases for tests.
//!
//! [`MonitorFixture`] creates the producer's tables in a fresh temp directory
//! and inserts rows through its own connection, the way the monitoring hub
//! would. Views are not created here; that is the view catalog's job.

use crate::StoreError;
use rusqlite::{Connection, params};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

const PRODUCER_SCHEMA: &str = r#"
CREATE TABLE workflow (
  run_id TEXT PRIMARY KEY NOT NULL,
  workflow_name TEXT,
  workflow_version TEXT,
  time_began TEXT NOT NULL,
  time_completed TEXT,
  host TEXT NOT NULL,
  user TEXT NOT NULL,
  rundir TEXT NOT NULL,
  tasks_failed_count INTEGER NOT NULL,
  tasks_completed_count INTEGER NOT NULL
);

CREATE TABLE task (
  task_id INTEGER NOT NULL,
  run_id TEXT NOT NULL,
  task_func_name TEXT NOT NULL,
  task_hashsum TEXT,
  task_depends TEXT,
  task_memoize INTEGER,
  task_stdout TEXT,
  task_stderr TEXT,
  task_time_invoked TEXT,
  task_time_returned TEXT,
  task_fail_count INTEGER NOT NULL,
  task_fail_cost REAL NOT NULL,
  PRIMARY KEY (task_id, run_id)
);

CREATE TABLE try (
  try_id INTEGER NOT NULL,
  task_id INTEGER NOT NULL,
  run_id TEXT NOT NULL,
  block_id TEXT,
  hostname TEXT,
  task_executor TEXT,
  task_try_time_launched TEXT,
  task_try_time_running TEXT,
  task_try_time_returned TEXT,
  task_fail_history TEXT,
  PRIMARY KEY (try_id, task_id, run_id)
);

CREATE TABLE status (
  task_id INTEGER NOT NULL,
  task_status_name TEXT NOT NULL,
  timestamp TEXT NOT NULL,
  run_id TEXT NOT NULL,
  try_id INTEGER NOT NULL
);

CREATE TABLE block (
  run_id TEXT NOT NULL,
  executor_label TEXT NOT NULL,
  block_id TEXT NOT NULL,
  job_id TEXT,
  timestamp TEXT NOT NULL,
  status TEXT
);

CREATE TABLE node (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  run_id TEXT NOT NULL,
  hostname TEXT NOT NULL,
  uid TEXT,
  block_id TEXT,
  cpu_count INTEGER,
  total_memory INTEGER,
  active INTEGER,
  worker_count INTEGER,
  python_v TEXT,
  timestamp TEXT NOT NULL,
  last_heartbeat TEXT
);

CREATE TABLE resource (
  try_id INTEGER NOT NULL,
  task_id INTEGER NOT NULL,
  run_id TEXT NOT NULL,
  timestamp TEXT NOT NULL,
  resource_monitoring_interval REAL,
  psutil_process_pid INTEGER,
  psutil_process_memory_percent REAL,
  psutil_process_cpu_percent REAL
);
"#;

static FIXTURE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Creates a fresh, uniquely named directory under the system temp dir.
pub fn temp_dir(test_name: &str) -> PathBuf {
    let base = std::env::temp_dir();
    let pid = std::process::id();
    let nonce = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let seq = FIXTURE_SEQ.fetch_add(1, Ordering::Relaxed);
    base.join(format!("ws_storage_{test_name}_{pid}_{nonce}_{seq}"))
}

/// Attempt lifecycle timestamps; any of them may be unset.
#[derive(Clone, Copy, Debug, Default)]
pub struct TryTimes<'a> {
    pub launched: Option<&'a str>,
    pub running: Option<&'a str>,
    pub returned: Option<&'a str>,
}

impl<'a> TryTimes<'a> {
    pub fn complete(launched: &'a str, running: &'a str, returned: &'a str) -> Self {
        Self {
            launched: Some(launched),
            running: Some(running),
            returned: Some(returned),
        }
    }
}

/// A monitoring database populated row by row.
#[derive(Debug)]
pub struct MonitorFixture {
    conn: Connection,
    path: PathBuf,
}

impl MonitorFixture {
    pub fn create(test_name: &str) -> Result<Self, StoreError> {
        let dir = temp_dir(test_name);
        std::fs::create_dir_all(&dir)?;
        let path = dir.join("monitoring.db");
        let conn = Connection::open(&path)?;
        conn.execute_batch(PRODUCER_SCHEMA)?;
        Ok(Self { conn, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Direct access for statements the helpers do not cover.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn add_run(
        &self,
        run_id: &str,
        began: &str,
        completed: Option<&str>,
    ) -> Result<&Self, StoreError> {
        let rundir = format!("/work/project/runinfo/{run_id}");
        self.conn.execute(
            "INSERT INTO workflow(run_id, workflow_name, workflow_version, time_began, \
             time_completed, host, user, rundir, tasks_failed_count, tasks_completed_count) \
             VALUES (?1, 'pipeline', '1.0', ?2, ?3, 'login01', 'alice', ?4, 0, 0)",
            params![run_id, began, completed, rundir],
        )?;
        Ok(self)
    }

    pub fn set_run_counts(
        &self,
        run_id: &str,
        completed: i64,
        failed: i64,
    ) -> Result<&Self, StoreError> {
        self.conn.execute(
            "UPDATE workflow SET tasks_completed_count = ?2, tasks_failed_count = ?3 \
             WHERE run_id = ?1",
            params![run_id, completed, failed],
        )?;
        Ok(self)
    }

    /// Inserts a task; `hashsum = None` makes it non-cached.
    pub fn add_task(
        &self,
        run_id: &str,
        task_id: i64,
        app: &str,
        hashsum: Option<&str>,
    ) -> Result<&Self, StoreError> {
        self.conn.execute(
            "INSERT INTO task(task_id, run_id, task_func_name, task_hashsum, task_depends, \
             task_memoize, task_stdout, task_time_invoked, task_fail_count, task_fail_cost) \
             VALUES (?1, ?2, ?3, ?4, '', ?5, ?6, '2024-01-01 00:00:00', 0, 0.0)",
            params![
                task_id,
                run_id,
                app,
                hashsum,
                hashsum.is_some(),
                format!("task_{task_id}.stdout")
            ],
        )?;
        Ok(self)
    }

    pub fn set_task_failures(
        &self,
        run_id: &str,
        task_id: i64,
        fails: i64,
        cost: f64,
    ) -> Result<&Self, StoreError> {
        self.conn.execute(
            "UPDATE task SET task_fail_count = ?3, task_fail_cost = ?4 \
             WHERE run_id = ?1 AND task_id = ?2",
            params![run_id, task_id, fails, cost],
        )?;
        Ok(self)
    }

    pub fn add_try(
        &self,
        run_id: &str,
        task_id: i64,
        try_id: i64,
        times: TryTimes<'_>,
    ) -> Result<&Self, StoreError> {
        self.conn.execute(
            "INSERT INTO try(try_id, task_id, run_id, block_id, hostname, task_executor, \
             task_try_time_launched, task_try_time_running, task_try_time_returned) \
             VALUES (?1, ?2, ?3, '0', 'node01', 'htex', ?4, ?5, ?6)",
            params![
                try_id,
                task_id,
                run_id,
                times.launched,
                times.running,
                times.returned
            ],
        )?;
        Ok(self)
    }

    pub fn add_status(
        &self,
        run_id: &str,
        task_id: i64,
        try_id: i64,
        status: &str,
        timestamp: &str,
    ) -> Result<&Self, StoreError> {
        self.conn.execute(
            "INSERT INTO status(task_id, task_status_name, timestamp, run_id, try_id) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![task_id, status, timestamp, run_id, try_id],
        )?;
        Ok(self)
    }

    pub fn add_block(
        &self,
        run_id: &str,
        block_id: &str,
        status: &str,
        timestamp: &str,
    ) -> Result<&Self, StoreError> {
        self.conn.execute(
            "INSERT INTO block(run_id, executor_label, block_id, job_id, timestamp, status) \
             VALUES (?1, 'htex', ?2, ?3, ?4, ?5)",
            params![run_id, block_id, format!("job.{block_id}"), timestamp, status],
        )?;
        Ok(self)
    }

    pub fn add_node(
        &self,
        run_id: &str,
        hostname: &str,
        block_id: &str,
        timestamp: &str,
    ) -> Result<&Self, StoreError> {
        self.conn.execute(
            "INSERT INTO node(run_id, hostname, uid, block_id, cpu_count, total_memory, active, \
             worker_count, python_v, timestamp, last_heartbeat) \
             VALUES (?1, ?2, ?2, ?3, 8, 16000000000, 1, 4, '3.11', ?4, ?4)",
            params![run_id, hostname, block_id, timestamp],
        )?;
        Ok(self)
    }
}

/// Two runs exercising every task view.
///
/// Run `run-a` (run 1, completed): task 1 `fetch`, one successful attempt.
/// Run `run-b` (run 2, still open):
/// - task 1 `fetch`: attempt 0 fails retryably, attempt 1 succeeds;
/// - task 2 `reduce`: attempt 0 launched, never running;
/// - task 3 `notify`: non-cached;
/// - task 4 `archive`: cached but never dispatched;
/// - task 5 `index`: cached and dispatched but without status events;
/// - block `0` with nodes `node01` (two heartbeats) and `node02`.
pub fn two_run_workflow(test_name: &str) -> Result<MonitorFixture, StoreError> {
    let fx = MonitorFixture::create(test_name)?;
    // Inserted newest first: run numbers must follow start time, not insertion.
    fx.add_run("run-b", "2024-01-02 00:00:00", None)?
        .add_run("run-a", "2024-01-01 10:00:00", Some("2024-01-01 10:30:00"))?
        .set_run_counts("run-a", 1, 0)?
        .set_run_counts("run-b", 1, 1)?;

    fx.add_task("run-a", 1, "fetch", Some("hash-a1"))?
        .add_try(
            "run-a",
            1,
            0,
            TryTimes::complete(
                "2024-01-01 10:01:00",
                "2024-01-01 10:02:00",
                "2024-01-01 10:05:00",
            ),
        )?
        .add_status("run-a", 1, 0, "pending", "2024-01-01 10:00:30")?
        .add_status("run-a", 1, 0, "launched", "2024-01-01 10:01:00")?
        .add_status("run-a", 1, 0, "running", "2024-01-01 10:02:00")?
        .add_status("run-a", 1, 0, "exec_done", "2024-01-01 10:05:00")?;

    fx.add_task("run-b", 1, "fetch", Some("hash-b1"))?
        .set_task_failures("run-b", 1, 1, 1.5)?
        .add_try(
            "run-b",
            1,
            0,
            TryTimes::complete(
                "2024-01-02 00:01:00",
                "2024-01-02 00:02:00",
                "2024-01-02 00:03:00",
            ),
        )?
        .add_try(
            "run-b",
            1,
            1,
            TryTimes::complete(
                "2024-01-02 00:04:00",
                "2024-01-02 00:05:00",
                "2024-01-02 00:07:00",
            ),
        )?
        .add_status("run-b", 1, 0, "pending", "2024-01-02 00:00:30")?
        .add_status("run-b", 1, 0, "launched", "2024-01-02 00:01:00")?
        .add_status("run-b", 1, 0, "running", "2024-01-02 00:02:00")?
        .add_status("run-b", 1, 0, "fail_retryable", "2024-01-02 00:03:00")?
        .add_status("run-b", 1, 1, "launched", "2024-01-02 00:04:00")?
        .add_status("run-b", 1, 1, "running", "2024-01-02 00:05:00")?
        .add_status("run-b", 1, 1, "exec_done", "2024-01-02 00:07:00")?;

    fx.add_task("run-b", 2, "reduce", Some("hash-b2"))?
        .add_try(
            "run-b",
            2,
            0,
            TryTimes {
                launched: Some("2024-01-02 00:06:00"),
                ..TryTimes::default()
            },
        )?
        .add_status("run-b", 2, 0, "pending", "2024-01-02 00:05:30")?
        .add_status("run-b", 2, 0, "launched", "2024-01-02 00:06:00")?;

    fx.add_task("run-b", 3, "notify", None)?
        .add_status("run-b", 3, 0, "pending", "2024-01-02 00:06:30")?;

    fx.add_task("run-b", 4, "archive", Some("hash-b4"))?
        .add_status("run-b", 4, 0, "pending", "2024-01-02 00:06:40")?;

    fx.add_task("run-b", 5, "index", Some("hash-b5"))?
        .add_try("run-b", 5, 0, TryTimes::default())?;

    fx.add_block("run-b", "0", "PENDING", "2024-01-02 00:00:10")?
        .add_block("run-b", "0", "RUNNING", "2024-01-02 00:00:40")?
        .add_node("run-b", "node01", "0", "2024-01-02 00:00:50")?
        .add_node("run-b", "node01", "0", "2024-01-02 00:06:00")?
        .add_node("run-b", "node02", "0", "2024-01-02 00:00:55")?;

    Ok(fx)
}
