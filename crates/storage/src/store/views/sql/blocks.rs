#![forbid(unsafe_code)]

// One row per (run, executor, block); the block table itself holds one row per
// status change.
pub(super) const BLOCKVIEW: &str = r#"
        CREATE VIEW blockview AS
        SELECT
          rv.runnum AS runnum,
          b.run_id AS run_id,
          b.executor_label AS executor_label,
          b.block_id AS block_id,
          max(b.job_id) AS job_id,
          (SELECT b2.status FROM block b2
            WHERE b2.run_id = b.run_id
              AND b2.executor_label = b.executor_label
              AND b2.block_id = b.block_id
            ORDER BY b2.timestamp DESC, b2.rowid DESC
            LIMIT 1) AS status,
          strftime('%Y-%m-%d %H:%M:%S', min(b.timestamp)) AS firstSeen,
          strftime('%Y-%m-%d %H:%M:%S', max(b.timestamp)) AS lastUpdate,
          (SELECT count(DISTINCT n.hostname) FROM node n
            WHERE n.run_id = b.run_id AND n.block_id = b.block_id) AS nodes
        FROM block b
        JOIN runview rv ON rv.run_id = b.run_id
        GROUP BY b.run_id, b.executor_label, b.block_id
"#;
