use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn open_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)
        .with_context(|| format!("failed to open db: {}", db_path.display()))?;
    conn.execute("PRAGMA foreign_keys = ON", [])
        .context("failed to enable foreign key enforcement")?;
    Ok(conn)
}

/// Double-quoted SQL identifier.
pub fn quote(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableColumn {
    pub name: String,
    pub decl_type: String,
}

impl TableColumn {
    pub fn is_temporal(&self) -> bool {
        let decl_type = self.decl_type.to_ascii_uppercase();
        decl_type.contains("DATE") || decl_type.contains("TIME")
    }

    pub fn is_boolean(&self) -> bool {
        self.decl_type.eq_ignore_ascii_case("BOOLEAN")
            || self.decl_type.eq_ignore_ascii_case("BOOL")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLayout {
    pub table: String,
    pub columns: Vec<TableColumn>,
}

impl TableLayout {
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|column| column.name == name)
    }
}

/// Reads the declared columns of `table`, in table order.
pub fn table_layout(conn: &Connection, table: &str) -> Result<TableLayout> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({})", quote(table)))
        .with_context(|| format!("failed to prepare table info query for {table}"))?;
    let columns = stmt
        .query_map([], |row| {
            Ok(TableColumn {
                name: row.get(1)?,
                decl_type: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
            })
        })
        .with_context(|| format!("failed to query table info for {table}"))?
        .collect::<rusqlite::Result<Vec<_>>>()
        .with_context(|| format!("failed to collect table info for {table}"))?;

    if columns.is_empty() {
        anyhow::bail!("table not found: {table}")
    }

    Ok(TableLayout {
        table: table.to_string(),
        columns,
    })
}
