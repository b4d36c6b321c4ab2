#![forbid(unsafe_code)]

use rusqlite::ErrorCode;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("monitoring store unavailable at {}: {reason}", .path.display())]
    Unavailable { path: PathBuf, reason: String },
    #[error("monitoring store busy: lock not released within the wait bound")]
    Busy,
    #[error("view definition #{index} failed: {source}")]
    ViewDefinition {
        index: usize,
        #[source]
        source: rusqlite::Error,
    },
    #[error("view definitions unreadable at {}: {source}", .path.display())]
    ViewSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("required views still missing after rebuild: {}", .missing.join(", "))]
    ViewsMissing { missing: Vec<String> },
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("sqlite: {0}")]
    Sql(rusqlite::Error),
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unavailable { .. } => "STORE_UNAVAILABLE",
            Self::Busy => "STORE_BUSY",
            Self::ViewDefinition { .. } => "VIEW_DEFINITION",
            Self::ViewSource { .. } => "VIEW_SOURCE",
            Self::ViewsMissing { .. } => "VIEWS_MISSING",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Io(_) => "IO",
            Self::Sql(_) => "SQL",
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        if is_lock_contention(&value) {
            return Self::Busy;
        }
        Self::Sql(value)
    }
}

pub(crate) fn is_lock_contention(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(code, _) => matches!(
            code.code,
            ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked
        ),
        _ => false,
    }
}
