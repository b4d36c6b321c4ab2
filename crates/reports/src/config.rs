#![forbid(unsafe_code)]

use crate::ReportError;
use std::path::PathBuf;
use std::time::Duration;
use ws_storage::{DEFAULT_BUSY_TIMEOUT, StatusFilter, TaskFilter, ViewSource};

pub const DB_PATH_ENV: &str = "WSTAT_DB";
pub const BUSY_TIMEOUT_ENV: &str = "WSTAT_BUSY_TIMEOUT_MS";
pub const VIEWS_SQL_ENV: &str = "WSTAT_VIEWS_SQL";

const DEFAULT_DB_PATH: &str = "./monitoring.db";
const DEFAULT_STATUS_LIMIT: usize = 20;

/// Where the engine reads from and how it prepares the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
    pub store_path: PathBuf,
    pub busy_timeout: Duration,
    pub views: ViewSource,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            store_path: PathBuf::from(DEFAULT_DB_PATH),
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
            views: ViewSource::Builtin,
        }
    }
}

impl EngineConfig {
    pub fn new(store_path: impl Into<PathBuf>) -> Self {
        Self {
            store_path: store_path.into(),
            ..Self::default()
        }
    }

    /// Defaults overridden by `WSTAT_DB`, `WSTAT_BUSY_TIMEOUT_MS` and `WSTAT_VIEWS_SQL`.
    pub fn from_env() -> Result<Self, ReportError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ReportError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let value = |key: &str| lookup(key).filter(|raw| !raw.trim().is_empty());

        if let Some(path) = value(DB_PATH_ENV) {
            config.store_path = PathBuf::from(path.trim());
        }
        if let Some(raw) = value(BUSY_TIMEOUT_ENV) {
            let millis = raw.trim().parse::<u64>().map_err(|err| ReportError::Config {
                key: BUSY_TIMEOUT_ENV.to_string(),
                reason: format!("expected milliseconds, got {raw:?}: {err}"),
            })?;
            config.busy_timeout = Duration::from_millis(millis);
        }
        if let Some(path) = value(VIEWS_SQL_ENV) {
            config.views = ViewSource::File(PathBuf::from(path.trim()));
        }
        Ok(config)
    }

    pub fn with_busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.busy_timeout = busy_timeout;
        self
    }

    pub fn with_views(mut self, views: ViewSource) -> Self {
        self.views = views;
        self
    }
}

/// Options recognized by the report drivers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportOptions {
    /// `None` scopes to all runs, except where a report defaults to the current run.
    pub run_number: Option<i64>,
    pub task_number: Option<i64>,
    pub task_id: Option<i64>,
    pub task_name: Option<String>,
    /// An exact status label or a preset name (`notdone`, `runz`, `dead`, `oddball`).
    pub status: Option<String>,
    /// Row bound for listings; `Some(0)` means no bound, same as `None`.
    pub limit: Option<usize>,
    pub extended_columns: bool,
    pub include_oddball: bool,
    /// Row bound for the recent-activity report.
    pub status_limit: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            run_number: None,
            task_number: None,
            task_id: None,
            task_name: None,
            status: None,
            limit: None,
            extended_columns: false,
            include_oddball: false,
            status_limit: DEFAULT_STATUS_LIMIT,
        }
    }
}

impl ReportOptions {
    pub fn run(mut self, run_number: i64) -> Self {
        self.run_number = Some(run_number);
        self
    }

    pub fn task_number(mut self, task_number: i64) -> Self {
        self.task_number = Some(task_number);
        self
    }

    pub fn task_id(mut self, task_id: i64) -> Self {
        self.task_id = Some(task_id);
        self
    }

    pub fn task_name(mut self, name: impl Into<String>) -> Self {
        self.task_name = Some(name.into());
        self
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn extended(mut self) -> Self {
        self.extended_columns = true;
        self
    }

    pub fn with_oddball(mut self) -> Self {
        self.include_oddball = true;
        self
    }

    pub fn status_limit(mut self, limit: usize) -> Self {
        self.status_limit = limit;
        self
    }

    /// The effective row bound, with zero read as unbounded.
    pub fn row_limit(&self) -> Option<usize> {
        self.limit.filter(|&limit| limit != 0)
    }

    pub(crate) fn task_filter(&self) -> TaskFilter {
        TaskFilter {
            run_number: self.run_number,
            task_number: self.task_number,
            task_id: self.task_id,
            app_name: self.task_name.clone(),
            status: self.status.as_deref().map(StatusFilter::parse),
        }
    }
}
