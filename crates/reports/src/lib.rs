#![forbid(unsafe_code)]

//! Read-only reports over a workflow monitoring database.
//!
//! [`Engine::open`] connects to the store, makes sure the derived views exist
//! and snapshots the run catalog; the report drivers then compose store
//! queries, status tallies and reconstructed state sequences into [`Report`]s.

mod aggregate;
mod config;
mod drivers;
mod engine;
mod error;
mod sequences;
mod table;

pub use aggregate::{
    STATUS_MATRIX_TITLE, WORKFLOW_SUMMARY_TITLE, WorkflowSummary, status_matrix_table,
};
pub use config::{BUSY_TIMEOUT_ENV, DB_PATH_ENV, EngineConfig, ReportOptions, VIEWS_SQL_ENV};
pub use drivers::{
    APP_STATISTICS_TITLE, BATCH_SUMMARY_TITLE, NODES_TITLE, NON_CACHED_TITLE,
    NON_DISPATCHED_TITLE, RECENT_STATUS_TITLE, RUN_HISTORY_TITLE, SHORT_SUMMARY_BLOCKS,
    TASK_DURATIONS_TITLE, TASK_HISTORY_TITLE, TASK_LISTING_TITLE,
};
pub use engine::{Engine, RunCatalog};
pub use error::ReportError;
pub use sequences::{STATE_TRANSITIONS_TITLE, state_transitions_table};
pub use table::{Cell, PENDING, Report, Table};
