#![forbid(unsafe_code)]

use crate::table::{Cell, Table};
use crate::{Engine, ReportError};
use ws_core::{StateSequences, reconstruct};
use ws_storage::TaskFilter;

pub const STATE_TRANSITIONS_TITLE: &str = "State transitions";

impl Engine {
    /// Per-attempt status sequences of one run (`None` = current run).
    pub fn state_transitions(&self, run_number: Option<i64>) -> Result<StateSequences, ReportError> {
        let run = self.runs().select(run_number)?.runnum;
        let events = self.store().status_transitions(&TaskFilter::for_run(Some(run)))?;
        let sequences = reconstruct(events)?;
        let in_flight = sequences.in_flight().count();
        if in_flight > 0 {
            tracing::warn!(run, in_flight, "attempts without a terminal status");
        }
        tracing::debug!(run, attempts = sequences.distinct_keys, "state sequences rebuilt");
        Ok(sequences)
    }
}

pub fn state_transitions_table(run: i64, sequences: &StateSequences) -> Table {
    let mut table = Table::new(
        STATE_TRANSITIONS_TITLE,
        ["runnum", "task_id", "try_id", "transitions", "final", "in_flight"],
    );
    for group in &sequences.groups {
        let path: Vec<&str> = group.statuses.iter().map(|label| label.as_str()).collect();
        table.push_row(vec![
            Cell::from(group.key.run),
            Cell::from(group.key.task),
            Cell::from(group.key.attempt),
            Cell::text(path.join(" -> ")),
            Cell::from(group.last()),
            Cell::from(group.is_in_flight()),
        ]);
    }
    table.note(format!(
        "run {run}: {} distinct attempt(s), {} still in flight",
        sequences.distinct_keys,
        sequences.in_flight().count()
    ));
    table
}
