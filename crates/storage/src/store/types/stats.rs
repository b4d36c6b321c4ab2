#![forbid(unsafe_code)]

use rusqlite::Row;
use serde::Serialize;

/// Sum of one duration over the attempts that have both endpoints.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct DurationSum {
    /// `None` when no attempt in the group contributed.
    pub minutes: Option<f64>,
    pub samples: i64,
}

/// Try counts and accumulated durations (minutes) for one group of attempts.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AttemptStatsRow {
    /// Lowest run number in the group; the only one when grouped by task.
    pub runnum: i64,
    pub tasknum: i64,
    pub appname: String,
    pub tries: i64,
    pub wait: DurationSum,
    pub run: DurationSum,
    pub elapsed: DurationSum,
}

impl AttemptStatsRow {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            runnum: row.get(0)?,
            tasknum: row.get(1)?,
            appname: row.get(2)?,
            tries: row.get(3)?,
            wait: DurationSum {
                minutes: row.get(4)?,
                samples: row.get(5)?,
            },
            run: DurationSum {
                minutes: row.get(6)?,
                samples: row.get(7)?,
            },
            elapsed: DurationSum {
                minutes: row.get(8)?,
                samples: row.get(9)?,
            },
        })
    }
}
