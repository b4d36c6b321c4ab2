#![forbid(unsafe_code)]

use crate::status::{StatusLabel, TaskStatus};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

pub const TOTAL_LABEL: &str = "TOTAL";

/// Count of tasks per status label, plus the row total.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StatusTally {
    counts: BTreeMap<StatusLabel, u64>,
    total: u64,
}

impl StatusTally {
    pub fn record(&mut self, label: &StatusLabel) {
        *self.counts.entry(label.clone()).or_insert(0) += 1;
        self.total += 1;
    }

    pub fn count(&self, label: &StatusLabel) -> u64 {
        self.counts.get(label).copied().unwrap_or(0)
    }

    pub fn count_of(&self, status: TaskStatus) -> u64 {
        self.count(&StatusLabel::Known(status))
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn labels(&self) -> impl Iterator<Item = &StatusLabel> {
        self.counts.keys()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TallyError {
    #[error("status tally mismatch for {label}: app rows sum to {rows}, total row holds {total}")]
    Mismatch { label: String, rows: u64, total: u64 },
}

#[derive(Debug, Default)]
pub struct StatusMatrixBuilder {
    rows: BTreeMap<String, StatusTally>,
    totals: StatusTally,
}

impl StatusMatrixBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, app_name: &str, status: &StatusLabel) {
        self.rows
            .entry(app_name.to_string())
            .or_default()
            .record(status);
        self.totals.record(status);
    }

    pub fn finish(self) -> Result<StatusMatrix, TallyError> {
        let matrix = StatusMatrix {
            rows: self.rows,
            totals: self.totals,
        };
        matrix.reconcile()?;
        Ok(matrix)
    }
}

/// App name x status label tally with a grand-total row.
///
/// Only tasks that were actually observed contribute; an app name never
/// appears with an all-zero row.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StatusMatrix {
    rows: BTreeMap<String, StatusTally>,
    totals: StatusTally,
}

impl StatusMatrix {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = (&str, &StatusTally)> {
        self.rows.iter().map(|(name, tally)| (name.as_str(), tally))
    }

    pub fn row(&self, app_name: &str) -> Option<&StatusTally> {
        self.rows.get(app_name)
    }

    pub fn totals(&self) -> &StatusTally {
        &self.totals
    }

    /// Labels outside the known enumeration, in sorted order.
    pub fn anomalies(&self) -> Vec<&str> {
        self.totals
            .labels()
            .filter(|label| label.is_anomalous())
            .map(StatusLabel::as_str)
            .collect()
    }

    /// Known labels first, in enumeration order, then any anomalous labels.
    pub fn columns(&self) -> Vec<StatusLabel> {
        let mut columns: Vec<StatusLabel> =
            TaskStatus::ALL.into_iter().map(StatusLabel::Known).collect();
        columns.extend(
            self.totals
                .labels()
                .filter(|label| label.is_anomalous())
                .cloned(),
        );
        columns
    }

    /// Checks that every column of the total row equals the sum of the app rows.
    pub fn reconcile(&self) -> Result<(), TallyError> {
        let labels: BTreeSet<&StatusLabel> = self
            .rows
            .values()
            .flat_map(StatusTally::labels)
            .chain(self.totals.labels())
            .collect();

        for label in labels {
            let rows: u64 = self.rows.values().map(|row| row.count(label)).sum();
            let total = self.totals.count(label);
            if rows != total {
                return Err(TallyError::Mismatch {
                    label: label.to_string(),
                    rows,
                    total,
                });
            }
        }

        let rows: u64 = self.rows.values().map(StatusTally::total).sum();
        if rows != self.totals.total() {
            return Err(TallyError::Mismatch {
                label: TOTAL_LABEL.to_string(),
                rows,
                total: self.totals.total(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(raw: &str) -> StatusLabel {
        StatusLabel::from_raw(raw)
    }

    #[test]
    fn totals_equal_sum_of_app_rows() {
        let mut builder = StatusMatrixBuilder::new();
        builder.record("fetch", &label("exec_done"));
        builder.record("fetch", &label("exec_done"));
        builder.record("fetch", &label("failed"));
        builder.record("reduce", &label("running"));
        builder.record("reduce", &label("exec_done"));
        let matrix = builder.finish().expect("consistent tally");

        assert_eq!(matrix.totals().count_of(TaskStatus::ExecDone), 3);
        assert_eq!(matrix.totals().total(), 5);
        for status in TaskStatus::ALL {
            let rows: u64 = matrix.rows().map(|(_, row)| row.count_of(status)).sum();
            assert_eq!(rows, matrix.totals().count_of(status));
        }
        assert_eq!(matrix.row("fetch").map(StatusTally::total), Some(3));
        assert!(matrix.anomalies().is_empty());
    }

    #[test]
    fn anomalous_labels_are_counted_and_flagged() {
        let mut builder = StatusMatrixBuilder::new();
        builder.record("fetch", &label("exec_done"));
        builder.record("fetch", &label("vanished"));
        let matrix = builder.finish().expect("consistent tally");

        assert_eq!(matrix.anomalies(), vec!["vanished"]);
        assert_eq!(matrix.totals().count(&label("vanished")), 1);
        let columns = matrix.columns();
        assert_eq!(columns.len(), TaskStatus::ALL.len() + 1);
        assert_eq!(columns.last(), Some(&label("vanished")));
    }

    #[test]
    fn empty_matrix_has_no_rows() {
        let matrix = StatusMatrixBuilder::new().finish().expect("empty tally");
        assert!(matrix.is_empty());
        assert_eq!(matrix.totals().total(), 0);
        assert_eq!(matrix.columns().len(), TaskStatus::ALL.len());
    }

    #[test]
    fn reconcile_detects_a_drifted_total_row() {
        let mut builder = StatusMatrixBuilder::new();
        builder.record("fetch", &label("pending"));
        let mut matrix = builder.finish().expect("consistent tally");
        matrix.totals.record(&label("pending"));

        assert_eq!(
            matrix.reconcile(),
            Err(TallyError::Mismatch {
                label: "pending".to_string(),
                rows: 1,
                total: 2,
            })
        );
    }
}
