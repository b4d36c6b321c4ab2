#![forbid(unsafe_code)]

// The three task views partition on (content hash present, attempt present):
//   taskview    hash, at least one attempt, at least one status event
//   ndtaskview  hash, no attempt
//   nctaskview  no hash
// A hashed, dispatched task without any status event lands in none of them.
// Task numbers restart at 1 in every run.

pub(super) const TASKVIEW: &str = r#"
        CREATE VIEW taskview AS
        SELECT
          row_number() OVER (PARTITION BY rv.runnum ORDER BY t.task_id) AS tasknum,
          rv.runnum AS runnum,
          t.run_id AS run_id,
          t.task_id AS task_id,
          t.task_hashsum AS task_hashsum,
          t.task_func_name AS appname,
          s.task_status_name AS status,
          strftime('%Y-%m-%d %H:%M:%S', s.timestamp) AS lastUpdate,
          (SELECT count(*) FROM try y WHERE y.run_id = t.run_id AND y.task_id = t.task_id)
            AS tries,
          t.task_fail_count AS fails,
          t.task_fail_cost AS failcost,
          t.task_depends AS depends,
          t.task_stdout AS stdout
        FROM task t
        JOIN runview rv ON rv.run_id = t.run_id
        JOIN status s ON s.rowid = (
          SELECT s2.rowid FROM status s2
          WHERE s2.run_id = t.run_id AND s2.task_id = t.task_id
          ORDER BY s2.timestamp DESC, s2.rowid DESC
          LIMIT 1
        )
        WHERE t.task_hashsum IS NOT NULL
          AND EXISTS (SELECT 1 FROM try y WHERE y.run_id = t.run_id AND y.task_id = t.task_id)
"#;

pub(super) const NCTASKVIEW: &str = r#"
        CREATE VIEW nctaskview AS
        SELECT
          rv.runnum AS runnum,
          t.run_id AS run_id,
          t.task_id AS task_id,
          t.task_func_name AS appname,
          s.task_status_name AS status,
          strftime('%Y-%m-%d %H:%M:%S', s.timestamp) AS lastUpdate,
          strftime('%Y-%m-%d %H:%M:%S', t.task_time_invoked) AS invoked,
          strftime('%Y-%m-%d %H:%M:%S', t.task_time_returned) AS returned
        FROM task t
        JOIN runview rv ON rv.run_id = t.run_id
        LEFT JOIN status s ON s.rowid = (
          SELECT s2.rowid FROM status s2
          WHERE s2.run_id = t.run_id AND s2.task_id = t.task_id
          ORDER BY s2.timestamp DESC, s2.rowid DESC
          LIMIT 1
        )
        WHERE t.task_hashsum IS NULL
"#;

pub(super) const NDTASKVIEW: &str = r#"
        CREATE VIEW ndtaskview AS
        SELECT
          rv.runnum AS runnum,
          t.run_id AS run_id,
          t.task_id AS task_id,
          t.task_func_name AS appname,
          t.task_hashsum AS task_hashsum,
          s.task_status_name AS status,
          strftime('%Y-%m-%d %H:%M:%S', s.timestamp) AS lastUpdate,
          strftime('%Y-%m-%d %H:%M:%S', t.task_time_invoked) AS invoked
        FROM task t
        JOIN runview rv ON rv.run_id = t.run_id
        LEFT JOIN status s ON s.rowid = (
          SELECT s2.rowid FROM status s2
          WHERE s2.run_id = t.run_id AND s2.task_id = t.task_id
          ORDER BY s2.timestamp DESC, s2.rowid DESC
          LIMIT 1
        )
        WHERE t.task_hashsum IS NOT NULL
          AND NOT EXISTS (SELECT 1 FROM try y WHERE y.run_id = t.run_id AND y.task_id = t.task_id)
"#;
