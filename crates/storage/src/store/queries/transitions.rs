#![forbid(unsafe_code)]

use super::{FilterColumns, QueryBuilder, TaskFilter};
use crate::store::{MonitorStore, StoreError};
use ws_core::ids::AttemptKey;
use ws_core::{SequenceEvent, StatusLabel};

// Key order first, then event time: the order sequence reconstruction requires.
const TRANSITIONS_TEMPLATE: &str = r#"
        SELECT rv.runnum, s.task_id, s.try_id, s.task_status_name, s.timestamp
        FROM status s
        JOIN runview rv ON rv.run_id = s.run_id
        JOIN task t ON t.run_id = s.run_id AND t.task_id = s.task_id
        #filter#
        ORDER BY rv.runnum ASC, s.task_id ASC, s.try_id ASC, s.timestamp ASC, s.rowid ASC
"#;

const TRANSITION_FILTERS: FilterColumns = FilterColumns {
    run_number: Some("rv.runnum"),
    task_number: None,
    task_id: Some("s.task_id"),
    app_name: Some("t.task_func_name"),
    status: Some("s.task_status_name"),
};

impl MonitorStore {
    /// Status events keyed by attempt, sorted for sequence reconstruction.
    pub fn status_transitions(
        &self,
        filter: &TaskFilter,
    ) -> Result<Vec<SequenceEvent>, StoreError> {
        let query = QueryBuilder::new(TRANSITIONS_TEMPLATE)
            .filter(&TRANSITION_FILTERS, filter)?
            .build()?;
        self.fetch(&query, |row| {
            let status: String = row.get(3)?;
            let timestamp: Option<String> = row.get(4)?;
            Ok(SequenceEvent::new(
                AttemptKey::new(row.get(0)?, row.get(1)?, row.get(2)?),
                StatusLabel::from_raw(&status),
                timestamp.unwrap_or_default(),
            ))
        })
    }
}
