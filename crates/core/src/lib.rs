#![forbid(unsafe_code)]

pub mod sequence;
pub mod status;
pub mod tally;

pub use sequence::{
    AttemptSequence, SequenceError, SequenceEvent, SequenceReconstructor, StateSequences, reconstruct,
};
pub use status::{StatusLabel, StatusPreset, TaskStatus, UnknownStatus};
pub use tally::{StatusMatrix, StatusMatrixBuilder, StatusTally, TOTAL_LABEL, TallyError};

pub mod ids {
    use serde::Serialize;

    /// Identifies one execution attempt: (run number, task id, try id).
    ///
    /// Field order is the grouping order, so the derived `Ord` matches the
    /// `ORDER BY runnum, task_id, try_id` used by the transition query.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
    pub struct AttemptKey {
        pub run: i64,
        pub task: i64,
        pub attempt: i64,
    }

    impl AttemptKey {
        pub fn new(run: i64, task: i64, attempt: i64) -> Self {
            Self { run, task, attempt }
        }
    }

    impl std::fmt::Display for AttemptKey {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "(run={}, task={}, try={})", self.run, self.task, self.attempt)
        }
    }

    /// Zero-padded `runinfo/NNN` directory index for a run number (run 1 -> `000`).
    pub fn runinfo_dir(run_number: i64) -> String {
        format!("{:03}", run_number.saturating_sub(1))
    }
}
