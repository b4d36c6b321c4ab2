#![forbid(unsafe_code)]

//! Tabular report model handed to presentation layers.

use serde::Serialize;
use serde_json::Value;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use ws_core::StatusLabel;
use ws_storage::Value as SqlValue;

/// Placeholder shown for lifecycle fields that are not set yet.
pub const PENDING: &str = "*pending*";

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl Cell {
    pub fn text(value: impl Into<String>) -> Self {
        Cell::Text(value.into())
    }

    /// Unset timestamps render as [`PENDING`].
    pub fn lifecycle(value: Option<&str>) -> Self {
        Cell::Text(value.unwrap_or(PENDING).to_string())
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Cell::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Cell::Text(value) => Some(value),
            _ => None,
        }
    }
}

impl std::fmt::Display for Cell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Cell::Null => Ok(()),
            Cell::Integer(value) => write!(f, "{value}"),
            Cell::Real(value) => write!(f, "{value:.2}"),
            Cell::Text(value) => f.write_str(value),
        }
    }
}

impl From<i64> for Cell {
    fn from(value: i64) -> Self {
        Cell::Integer(value)
    }
}

impl From<u64> for Cell {
    fn from(value: u64) -> Self {
        i64::try_from(value).map_or(Cell::Real(value as f64), Cell::Integer)
    }
}

impl From<usize> for Cell {
    fn from(value: usize) -> Self {
        Cell::from(value as u64)
    }
}

impl From<f64> for Cell {
    fn from(value: f64) -> Self {
        Cell::Real(value)
    }
}

impl From<bool> for Cell {
    fn from(value: bool) -> Self {
        Cell::Integer(i64::from(value))
    }
}

impl From<&str> for Cell {
    fn from(value: &str) -> Self {
        Cell::Text(value.to_string())
    }
}

impl From<String> for Cell {
    fn from(value: String) -> Self {
        Cell::Text(value)
    }
}

impl From<&StatusLabel> for Cell {
    fn from(value: &StatusLabel) -> Self {
        Cell::Text(value.as_str().to_string())
    }
}

impl<T> From<Option<T>> for Cell
where
    Cell: From<T>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(Cell::Null, Cell::from)
    }
}

impl From<SqlValue> for Cell {
    fn from(value: SqlValue) -> Self {
        match value {
            SqlValue::Null => Cell::Null,
            SqlValue::Integer(value) => Cell::Integer(value),
            SqlValue::Real(value) => Cell::Real(value),
            SqlValue::Text(value) => Cell::Text(value),
            SqlValue::Blob(bytes) => Cell::Text(format!("<{} bytes>", bytes.len())),
        }
    }
}

/// A titled block of rows; every row has one cell per title.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Table {
    pub title: String,
    pub titles: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
    pub notes: Vec<String>,
}

impl Table {
    pub fn new<I, S>(title: impl Into<String>, titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            title: title.into(),
            titles: titles.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
            notes: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<Cell>) {
        debug_assert_eq!(row.len(), self.titles.len(), "row width differs from titles");
        self.rows.push(row);
    }

    pub fn note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column(&self, title: &str) -> Option<usize> {
        self.titles.iter().position(|candidate| candidate == title)
    }

    /// Cell at `row` under `title`.
    pub fn cell(&self, row: usize, title: &str) -> Option<&Cell> {
        let column = self.column(title)?;
        self.rows.get(row)?.get(column)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Report {
    pub title: String,
    /// RFC 3339, UTC.
    pub generated_at: String,
    pub sections: Vec<Table>,
}

impl Report {
    pub fn new(title: impl Into<String>, sections: Vec<Table>) -> Self {
        Self {
            title: title.into(),
            generated_at: now_rfc3339(),
            sections,
        }
    }

    pub fn section(&self, title: &str) -> Option<&Table> {
        self.sections.iter().find(|table| table.title == title)
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

pub(crate) fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_lifecycle_fields_render_as_pending() {
        assert_eq!(Cell::lifecycle(None), Cell::text(PENDING));
        assert_eq!(Cell::lifecycle(Some("2024-01-01 00:00:00")).to_string(), "2024-01-01 00:00:00");
        assert_eq!(Cell::from(None::<i64>), Cell::Null);
    }

    #[test]
    fn report_serializes_cells_untagged() {
        let mut table = Table::new("runs", ["runnum", "state"]);
        table.push_row(vec![Cell::from(1i64), Cell::from("open")]);
        let report = Report::new("demo", vec![table]);

        let json = report.to_json();
        assert_eq!(json["sections"][0]["rows"][0][0], serde_json::json!(1));
        assert_eq!(json["sections"][0]["rows"][0][1], serde_json::json!("open"));
        assert!(json["generated_at"].as_str().is_some_and(|ts| ts.ends_with('Z')));
    }

    #[test]
    fn cells_are_addressed_by_title() {
        let mut table = Table::new("t", ["a", "b"]);
        table.push_row(vec![Cell::from(1i64), Cell::from(2i64)]);
        assert_eq!(table.cell(0, "b").and_then(Cell::as_i64), Some(2));
        assert_eq!(table.cell(0, "c"), None);
        assert_eq!(table.cell(1, "a"), None);
    }
}
