#![forbid(unsafe_code)]

mod sql;

use super::{MonitorStore, StoreError};
use std::path::PathBuf;

/// Views every report depends on, in definition order.
pub const REQUIRED_VIEWS: [&str; 7] = [
    "runview",
    "taskview",
    "nctaskview",
    "ndtaskview",
    "lasttryview",
    "summary",
    "blockview",
];

/// Where view definitions come from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ViewSource {
    #[default]
    Builtin,
    /// A SQL script; see [`split_sql_script`] for the accepted format.
    File(PathBuf),
    Statements(Vec<String>),
}

impl ViewSource {
    pub fn statements(&self) -> Result<Vec<String>, StoreError> {
        match self {
            ViewSource::Builtin => Ok(sql::builtin_definitions()),
            ViewSource::File(path) => {
                let script =
                    std::fs::read_to_string(path).map_err(|source| StoreError::ViewSource {
                        path: path.clone(),
                        source,
                    })?;
                Ok(split_sql_script(&script))
            }
            ViewSource::Statements(statements) => Ok(statements.clone()),
        }
    }
}

/// Splits a script into statements: strips `/* */` and `--` comments, splits on
/// `;`, drops empty fragments. `--` inside a quoted literal is kept, but
/// statements must not carry `;` inside literals.
pub fn split_sql_script(script: &str) -> Vec<String> {
    let mut stripped = String::with_capacity(script.len());
    let mut rest = script;
    while let Some(start) = rest.find("/*") {
        stripped.push_str(&rest[..start]);
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            None => {
                rest = "";
                break;
            }
        }
    }
    stripped.push_str(rest);

    let without_line_comments: String = stripped
        .lines()
        .map(|line| match line_comment_start(line) {
            Some(idx) => &line[..idx],
            None => line,
        })
        .collect::<Vec<_>>()
        .join("\n");

    without_line_comments
        .split(';')
        .map(str::trim)
        .filter(|statement| !statement.is_empty())
        .map(str::to_string)
        .collect()
}

// Byte offset of the first `--` outside single quotes. A doubled `''` escape
// toggles twice and leaves the state unchanged.
fn line_comment_start(line: &str) -> Option<usize> {
    let mut in_literal = false;
    let bytes = line.as_bytes();
    for (idx, &byte) in bytes.iter().enumerate() {
        match byte {
            b'\'' => in_literal = !in_literal,
            b'-' if !in_literal && bytes.get(idx + 1) == Some(&b'-') => return Some(idx),
            _ => {}
        }
    }
    None
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ViewSync {
    /// All required views were already present; nothing was touched.
    Present,
    Rebuilt {
        dropped: Vec<String>,
        created: usize,
    },
}

#[derive(Clone, Debug, Default)]
pub struct ViewCatalog {
    source: ViewSource,
}

impl ViewCatalog {
    pub fn new(source: ViewSource) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &ViewSource {
        &self.source
    }

    pub fn missing(&self, store: &MonitorStore) -> Result<Vec<String>, StoreError> {
        let views = store.views()?;
        Ok(REQUIRED_VIEWS
            .into_iter()
            .filter(|required| !views.iter().any(|name| name == required))
            .map(str::to_string)
            .collect())
    }

    /// Creates the required views unless all of them already exist.
    pub fn ensure(&self, store: &mut MonitorStore) -> Result<ViewSync, StoreError> {
        let missing = self.missing(store)?;
        if missing.is_empty() {
            return Ok(ViewSync::Present);
        }
        tracing::info!(missing = ?missing, "required views absent; rebuilding view catalog");
        self.rebuild(store)
    }

    /// Drops every present required view and re-runs all definitions.
    ///
    /// Drop and recreate share one transaction: a failing definition rolls the
    /// catalog back to its previous state.
    pub fn rebuild(&self, store: &mut MonitorStore) -> Result<ViewSync, StoreError> {
        let statements = self.source.statements()?;
        let present = store.views()?;
        let dropped: Vec<String> = present
            .into_iter()
            .filter(|name| REQUIRED_VIEWS.contains(&name.as_str()))
            .collect();

        let tx = store.conn_mut().transaction()?;
        for name in &dropped {
            tx.execute_batch(&format!("DROP VIEW IF EXISTS \"{name}\""))?;
        }
        for (index, statement) in statements.iter().enumerate() {
            tx.execute_batch(statement)
                .map_err(|source| StoreError::ViewDefinition { index, source })?;
        }
        tx.commit()?;

        let missing = self.missing(store)?;
        if !missing.is_empty() {
            return Err(StoreError::ViewsMissing { missing });
        }

        tracing::info!(
            dropped = ?dropped,
            created = statements.len(),
            "view catalog rebuilt"
        );
        Ok(ViewSync::Rebuilt {
            dropped,
            created: statements.len(),
        })
    }
}
