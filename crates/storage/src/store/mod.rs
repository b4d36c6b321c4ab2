#![forbid(unsafe_code)]

/// SQL for the whole seconds from `$from` to `$to`, NULL if either is NULL.
macro_rules! seconds_between {
    ($from:literal, $to:literal) => {
        concat!(
            "CAST(round((julianday(", $to, ") - julianday(", $from, ")) * 86400) AS INTEGER)"
        )
    };
}

/// SQL rendering the span from `$from` to `$to` as `HH:MM:SS`. Hours keep
/// counting past 24, so multi-day spans do not wrap.
macro_rules! hms_between {
    ($from:literal, $to:literal) => {
        concat!(
            "CASE WHEN ", seconds_between!($from, $to), " IS NULL THEN NULL ",
            "ELSE printf('%02d:%02d:%02d', ",
            seconds_between!($from, $to), " / 3600, (",
            seconds_between!($from, $to), " % 3600) / 60, ",
            seconds_between!($from, $to), " % 60) END"
        )
    };
}

mod error;
mod queries;
mod types;
mod views;

#[cfg(test)]
mod tests;

pub use error::StoreError;
pub use queries::*;
pub use rusqlite::types::Value;
pub use types::*;
pub use views::*;

use rusqlite::{Connection, OpenFlags, params_from_iter};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Tables the workflow framework's monitoring hub writes.
pub const REQUIRED_TABLES: [&str; 7] = [
    "workflow", "task", "try", "node", "block", "status", "resource",
];

pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchemaKind {
    Table,
    View,
}

impl SchemaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SchemaKind::Table => "table",
            SchemaKind::View => "view",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchemaEntry {
    pub kind: SchemaKind,
    pub name: String,
    pub sql: Option<String>,
}

/// Result of an ad-hoc read: column titles plus untyped rows.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawRows {
    pub titles: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// Connection to a monitoring database written by the workflow framework.
///
/// The store never creates the database file and never writes data rows; the
/// only schema it touches are the derived views managed by [`ViewCatalog`].
/// The connection is closed when the store is dropped.
#[derive(Debug)]
pub struct MonitorStore {
    conn: Connection,
    path: PathBuf,
}

impl MonitorStore {
    pub fn open(path: impl AsRef<Path>, busy_timeout: Duration) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let unavailable = |reason: String| StoreError::Unavailable {
            path: path.clone(),
            reason,
        };

        let meta = std::fs::metadata(&path).map_err(|err| unavailable(err.to_string()))?;
        if !meta.is_file() {
            return Err(unavailable("not a regular file".to_string()));
        }
        std::fs::File::open(&path).map_err(|err| unavailable(err.to_string()))?;

        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(&path, flags)
            .map_err(|err| unavailable(err.to_string()))?;
        conn.busy_timeout(busy_timeout)?;

        // Touch the schema so a locked or non-database file fails here rather
        // than in the first report.
        let probe = conn.query_row("SELECT count(*) FROM sqlite_master", [], |row| {
            row.get::<_, i64>(0)
        });
        match probe {
            Ok(_) => {}
            Err(err) if error::is_lock_contention(&err) => return Err(StoreError::Busy),
            Err(err) => return Err(unavailable(err.to_string())),
        }

        tracing::debug!(path = %path.display(), ?busy_timeout, "monitoring store opened");
        Ok(Self { conn, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn tables(&self) -> Result<Vec<String>, StoreError> {
        self.object_names(SchemaKind::Table)
    }

    pub fn views(&self) -> Result<Vec<String>, StoreError> {
        self.object_names(SchemaKind::View)
    }

    pub fn missing_tables(&self) -> Result<Vec<&'static str>, StoreError> {
        let tables = self.tables()?;
        Ok(REQUIRED_TABLES
            .into_iter()
            .filter(|required| !tables.iter().any(|name| name == required))
            .collect())
    }

    /// `CREATE` statements for one object, or for every object of `kind`.
    pub fn schema(
        &self,
        kind: SchemaKind,
        name: Option<&str>,
    ) -> Result<Vec<SchemaEntry>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT name, sql FROM sqlite_master \
             WHERE type=?1 AND name NOT LIKE 'sqlite_%' AND (?2 IS NULL OR name=?2) \
             ORDER BY name",
        )?;
        let mut rows = stmt.query(rusqlite::params![kind.as_str(), name])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            out.push(SchemaEntry {
                kind,
                name: row.get(0)?,
                sql: row.get(1)?,
            });
        }
        Ok(out)
    }

    /// Runs an arbitrary read query with bound parameters.
    pub fn query_raw(&self, sql: &str, params: &[Value]) -> Result<RawRows, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let titles: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = titles.len();
        let mut rows = stmt.query(params_from_iter(params.iter()))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(width);
            for idx in 0..width {
                values.push(row.get::<_, Value>(idx)?);
            }
            out.push(values);
        }
        tracing::debug!(rows = out.len(), "raw query");
        Ok(RawRows { titles, rows: out })
    }

    /// Executes schema-definition statements (no result rows).
    pub fn execute_schema(&self, sql: &str) -> Result<(), StoreError> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    /// Closes the connection, surfacing any error the implicit drop would swallow.
    pub fn close(self) -> Result<(), StoreError> {
        self.conn.close().map_err(|(_, err)| StoreError::from(err))
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    pub(crate) fn conn_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    fn object_names(&self, kind: SchemaKind) -> Result<Vec<String>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master \
             WHERE type=?1 AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )?;
        let names = stmt
            .query_map([kind.as_str()], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }
}

pub(crate) fn to_sqlite_i64(value: usize) -> Result<i64, StoreError> {
    i64::try_from(value).map_err(|_| StoreError::InvalidInput("numeric overflow"))
}
