#![forbid(unsafe_code)]

use ws_core::{SequenceError, TallyError};
use ws_storage::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("run {requested} not found; known runs are {}", format_range(.range))]
    RunNotFound {
        requested: i64,
        range: Option<(i64, i64)>,
    },
    #[error("task history needs an app name, a task number, or a task id with a run number")]
    AmbiguousSelector,
    #[error(transparent)]
    Sequence(#[from] SequenceError),
    #[error(transparent)]
    Tally(#[from] TallyError),
    #[error("invalid configuration {key}: {reason}")]
    Config { key: String, reason: String },
}

impl ReportError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Store(err) => err.code(),
            Self::RunNotFound { .. } => "RUN_NOT_FOUND",
            Self::AmbiguousSelector => "AMBIGUOUS_SELECTOR",
            Self::Sequence(_) => "SEQUENCE_ORDER",
            Self::Tally(_) => "TALLY_MISMATCH",
            Self::Config { .. } => "CONFIG",
        }
    }

    /// Fatal errors leave the engine unusable; the rest abort only the call
    /// that raised them.
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Store(StoreError::InvalidInput(_)) => false,
            Self::Store(_) | Self::Tally(_) | Self::Config { .. } => true,
            Self::RunNotFound { .. } | Self::AmbiguousSelector | Self::Sequence(_) => false,
        }
    }
}

fn format_range(range: &Option<(i64, i64)>) -> String {
    match range {
        Some((min, max)) => format!("{min}..={max}"),
        None => "none".to_string(),
    }
}
