#![forbid(unsafe_code)]

use super::QueryBuilder;
use crate::store::{BlockRow, MonitorStore, NodeRow, StoreError, Value};

const BLOCKS_TEMPLATE: &str = r#"
        SELECT runnum, executor_label, block_id, job_id, status, firstSeen, lastUpdate, nodes
        FROM blockview
        #filter#
        ORDER BY runnum ASC, firstSeen ASC, block_id ASC
        #limit#
"#;

// Latest heartbeat row per (run, host).
const NODES_SQL: &str = r#"
        SELECT
          rv.runnum,
          n.hostname,
          n.block_id,
          n.cpu_count,
          n.total_memory,
          n.worker_count,
          n.active,
          strftime('%Y-%m-%d %H:%M:%S', n.last_heartbeat) AS last_heartbeat
        FROM node n
        JOIN runview rv ON rv.run_id = n.run_id
        WHERE n.rowid = (
          SELECT n2.rowid FROM node n2
          WHERE n2.run_id = n.run_id AND n2.hostname = n.hostname
          ORDER BY n2.timestamp DESC, n2.rowid DESC
          LIMIT 1
        )
          AND (?1 IS NULL OR rv.runnum = ?1)
        ORDER BY rv.runnum ASC, n.block_id ASC, n.hostname ASC
"#;

impl MonitorStore {
    /// Blocks of one run, or of every run, in the order they were first seen.
    pub fn blocks(
        &self,
        run_number: Option<i64>,
        limit: Option<usize>,
    ) -> Result<Vec<BlockRow>, StoreError> {
        let mut builder = QueryBuilder::new(BLOCKS_TEMPLATE);
        if let Some(run) = run_number {
            builder = builder.predicate("runnum", Value::Integer(run));
        }
        let query = builder.limit(limit)?.build()?;
        self.fetch(&query, BlockRow::from_row)
    }

    pub fn nodes(&self, run_number: Option<i64>) -> Result<Vec<NodeRow>, StoreError> {
        let mut stmt = self.conn().prepare(NODES_SQL)?;
        let nodes = stmt
            .query_map([run_number], NodeRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        tracing::debug!(?run_number, nodes = nodes.len(), "node query");
        Ok(nodes)
    }
}
