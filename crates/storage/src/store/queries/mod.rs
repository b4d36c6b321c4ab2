#![forbid(unsafe_code)]

//! Query templates and their parameter binding.
//!
//! Templates carry three placeholders: `#filter#` (a `WHERE` clause),
//! `#groupby#` (a grouping column) and `#limit#` (a `LIMIT` clause). They are
//! only ever replaced with `?N` parameter markers, identifiers chosen from a
//! closed set, or fixed keywords; caller values always travel as bound
//! parameters.

mod blocks;
mod history;
mod runs;
mod stats;
mod tasks;
mod transitions;

pub use stats::GroupBy;

use super::{MonitorStore, RawRows, StoreError, Value, to_sqlite_i64};
use rusqlite::{Row, params_from_iter};
use ws_core::StatusPreset;

const FILTER_MARK: &str = "#filter#";
const GROUP_BY_MARK: &str = "#groupby#";
const LIMIT_MARK: &str = "#limit#";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StatusFilter {
    Label(String),
    Preset(StatusPreset),
}

impl StatusFilter {
    /// Preset names (`notdone`, `runz`, `dead`, `oddball`) win over raw labels.
    pub fn parse(value: &str) -> Self {
        match StatusPreset::parse(value) {
            Some(preset) => StatusFilter::Preset(preset),
            None => StatusFilter::Label(value.to_string()),
        }
    }

    fn labels(&self) -> Vec<String> {
        match self {
            StatusFilter::Label(label) => vec![label.clone()],
            StatusFilter::Preset(preset) => preset
                .members()
                .iter()
                .map(|status| status.as_str().to_string())
                .collect(),
        }
    }
}

/// Row filters shared by the task-oriented queries.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub run_number: Option<i64>,
    pub task_number: Option<i64>,
    pub task_id: Option<i64>,
    pub app_name: Option<String>,
    pub status: Option<StatusFilter>,
}

impl TaskFilter {
    pub fn for_run(run_number: Option<i64>) -> Self {
        Self {
            run_number,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// An app name, a task number, or a task id together with a run number.
    pub fn identifies_task(&self) -> bool {
        self.app_name.is_some()
            || self.task_number.is_some()
            || (self.task_id.is_some() && self.run_number.is_some())
    }
}

/// Qualified column names a query shape exposes for each filter field.
#[derive(Clone, Copy, Debug)]
pub(crate) struct FilterColumns {
    pub(crate) run_number: Option<&'static str>,
    pub(crate) task_number: Option<&'static str>,
    pub(crate) task_id: Option<&'static str>,
    pub(crate) app_name: Option<&'static str>,
    pub(crate) status: Option<&'static str>,
}

/// A query ready to execute: SQL text plus positional parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct BoundQuery {
    sql: String,
    params: Vec<Value>,
}

impl BoundQuery {
    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }
}

#[derive(Debug)]
pub(crate) struct QueryBuilder<'a> {
    template: &'a str,
    predicates: Vec<String>,
    params: Vec<Value>,
    group_by: Option<GroupBy>,
    limit: Option<String>,
}

impl<'a> QueryBuilder<'a> {
    pub(crate) fn new(template: &'a str) -> Self {
        Self {
            template,
            predicates: Vec::new(),
            params: Vec::new(),
            group_by: None,
            limit: None,
        }
    }

    pub(crate) fn filter(
        mut self,
        columns: &FilterColumns,
        filter: &TaskFilter,
    ) -> Result<Self, StoreError> {
        if let Some(run) = filter.run_number {
            let column = require(columns.run_number, "query has no run number column")?;
            self = self.predicate(column, Value::Integer(run));
        }
        if let Some(tasknum) = filter.task_number {
            let column = require(columns.task_number, "query has no task number column")?;
            self = self.predicate(column, Value::Integer(tasknum));
        }
        if let Some(task_id) = filter.task_id {
            let column = require(columns.task_id, "query has no task id column")?;
            self = self.predicate(column, Value::Integer(task_id));
        }
        if let Some(app_name) = filter.app_name.as_deref() {
            let column = require(columns.app_name, "query has no app name column")?;
            self = self.predicate(column, Value::Text(app_name.to_string()));
        }
        if let Some(status) = filter.status.as_ref() {
            let column = require(columns.status, "query has no status column")?;
            let markers: Vec<String> = status
                .labels()
                .into_iter()
                .map(|label| self.bind(Value::Text(label)))
                .collect();
            self.predicates
                .push(format!("{column} IN ({})", markers.join(", ")));
        }
        Ok(self)
    }

    pub(crate) fn predicate(mut self, column: &'static str, value: Value) -> Self {
        let marker = self.bind(value);
        self.predicates.push(format!("{column} = {marker}"));
        self
    }

    pub(crate) fn group_by(mut self, group_by: GroupBy) -> Self {
        self.group_by = Some(group_by);
        self
    }

    pub(crate) fn limit(mut self, limit: Option<usize>) -> Result<Self, StoreError> {
        if let Some(limit) = limit {
            let marker = self.bind(Value::Integer(to_sqlite_i64(limit)?));
            self.limit = Some(format!("LIMIT {marker}"));
        }
        Ok(self)
    }

    pub(crate) fn build(self) -> Result<BoundQuery, StoreError> {
        let filter = if self.predicates.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.predicates.join(" AND "))
        };

        let mut sql = self.template.replace(FILTER_MARK, &filter);
        if sql.contains(GROUP_BY_MARK) {
            let group_by = self
                .group_by
                .ok_or(StoreError::InvalidInput("query requires a grouping column"))?;
            sql = sql.replace(GROUP_BY_MARK, group_by.column());
        }
        sql = sql.replace(LIMIT_MARK, self.limit.as_deref().unwrap_or(""));

        Ok(BoundQuery {
            sql,
            params: self.params,
        })
    }

    fn bind(&mut self, value: Value) -> String {
        self.params.push(value);
        format!("?{}", self.params.len())
    }
}

fn require(column: Option<&'static str>, message: &'static str) -> Result<&'static str, StoreError> {
    column.ok_or(StoreError::InvalidInput(message))
}

impl MonitorStore {
    /// Executes a bound query, projecting each row through `map`.
    pub(crate) fn fetch<T, F>(&self, query: &BoundQuery, mut map: F) -> Result<Vec<T>, StoreError>
    where
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        let mut stmt = self.conn().prepare(query.sql())?;
        let mut rows = stmt.query(params_from_iter(query.params().iter()))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(map(row)?);
        }
        tracing::debug!(
            params = query.params().len(),
            rows = out.len(),
            "bound query executed"
        );
        Ok(out)
    }

    /// Executes a bound query without a typed projection.
    pub fn fetch_raw(&self, query: &BoundQuery) -> Result<RawRows, StoreError> {
        self.query_raw(query.sql(), query.params())
    }
}
