#![forbid(unsafe_code)]

use crate::{EngineConfig, ReportError};
use std::path::Path;
use ws_storage::{MonitorStore, RunRow, ViewCatalog, ViewSync};

/// Runs loaded once at open, oldest first.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunCatalog {
    runs: Vec<RunRow>,
}

impl RunCatalog {
    pub fn new(runs: Vec<RunRow>) -> Self {
        Self { runs }
    }

    pub fn runs(&self) -> &[RunRow] {
        &self.runs
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// `(runmin, runmax)`, or `None` when the store holds no run.
    pub fn range(&self) -> Option<(i64, i64)> {
        let min = self.runs.iter().map(|run| run.runnum).min()?;
        let max = self.runs.iter().map(|run| run.runnum).max()?;
        Some((min, max))
    }

    /// The run with the highest run number.
    pub fn current(&self) -> Option<&RunRow> {
        self.runs.iter().max_by_key(|run| run.runnum)
    }

    /// Resolves a run selector: `None` picks the current run; an explicit
    /// number must lie within [`range`](Self::range).
    pub fn select(&self, run_number: Option<i64>) -> Result<&RunRow, ReportError> {
        let not_found = |requested| ReportError::RunNotFound {
            requested,
            range: self.range(),
        };
        match run_number {
            None => self.current().ok_or_else(|| not_found(0)),
            Some(requested) => {
                let (min, max) = self.range().ok_or_else(|| not_found(requested))?;
                if requested < min || requested > max {
                    return Err(not_found(requested));
                }
                self.runs
                    .iter()
                    .find(|run| run.runnum == requested)
                    .ok_or_else(|| not_found(requested))
            }
        }
    }

    /// Validates an optional scope without defaulting to the current run.
    pub(crate) fn check_scope(&self, run_number: Option<i64>) -> Result<(), ReportError> {
        match run_number {
            Some(requested) => self.select(Some(requested)).map(|_| ()),
            None => Ok(()),
        }
    }
}

/// One open monitoring store plus the run catalog read from it.
///
/// Views are ensured before the catalog is loaded, so every report call sees
/// the full view set. Report calls never mutate the engine.
#[derive(Debug)]
pub struct Engine {
    store: MonitorStore,
    views: ViewCatalog,
    runs: RunCatalog,
}

impl Engine {
    pub fn open(config: &EngineConfig) -> Result<Self, ReportError> {
        let mut store = MonitorStore::open(&config.store_path, config.busy_timeout)?;
        let views = ViewCatalog::new(config.views.clone());
        views.ensure(&mut store)?;
        let runs = RunCatalog::new(store.load_runs()?);
        tracing::info!(
            store = %config.store_path.display(),
            runs = runs.runs().len(),
            range = ?runs.range(),
            "report engine opened"
        );
        Ok(Self { store, views, runs })
    }

    /// Drops and recreates every required view, then reloads the run catalog.
    pub fn rebuild_views(&mut self) -> Result<ViewSync, ReportError> {
        let sync = self.views.rebuild(&mut self.store)?;
        self.runs = RunCatalog::new(self.store.load_runs()?);
        Ok(sync)
    }

    pub fn store(&self) -> &MonitorStore {
        &self.store
    }

    pub fn store_path(&self) -> &Path {
        self.store.path()
    }

    pub fn runs(&self) -> &RunCatalog {
        &self.runs
    }

    pub fn close(self) -> Result<(), ReportError> {
        self.store.close()?;
        Ok(())
    }
}
