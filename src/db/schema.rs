//! Topic graph schema: install it on a fresh store, or check a host-owned one.

use rusqlite::Connection;

use crate::error::{DmrestError, Result};

/// Value of `PRAGMA user_version` once the tables are installed.
pub const SCHEMA_VERSION: i32 = 1;

const TOPIC_GRAPH_SQL: &str = include_str!("topic_graph.sql");

/// Tables and the columns the read path selects from them.
pub const GRAPH_TABLES: [(&str, &[&str]); 4] = [
    ("topic_types", &["id", "uri", "value", "data_type_uri"]),
    (
        "assoc_defs",
        &["id", "parent_type_uri", "child_type_uri", "cardinality_uri", "assoc_type_uri", "position"],
    ),
    ("topics", &["id", "type_uri", "uri", "value", "value_kind"]),
    ("child_topics", &["parent_id", "child_id", "child_type_uri", "position"]),
];

/// What a store lacks for the read path.
#[derive(Debug, Default, PartialEq)]
pub struct SchemaReport {
    pub version: i32,
    pub missing_tables: Vec<String>,
    /// `table.column` for columns of existing tables
    pub missing_columns: Vec<String>,
}

impl SchemaReport {
    pub fn is_ready(&self) -> bool {
        self.missing_tables.is_empty() && self.missing_columns.is_empty()
    }

    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if !self.missing_tables.is_empty() {
            parts.push(format!("missing tables: {}", self.missing_tables.join(", ")));
        }
        if !self.missing_columns.is_empty() {
            parts.push(format!("missing columns: {}", self.missing_columns.join(", ")));
        }
        if parts.is_empty() {
            format!("topic graph schema ready (version {})", self.version)
        } else {
            parts.join("; ")
        }
    }
}

fn table_columns(conn: &Connection, table: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM pragma_table_info(?1)")?;
    let columns = stmt
        .query_map([table], |row| row.get::<_, String>(0))?
        .collect::<std::result::Result<Vec<_>, rusqlite::Error>>()?;
    Ok(columns)
}

/// Read-only check of the graph tables and their columns.
pub fn inspect(conn: &Connection) -> Result<SchemaReport> {
    let mut report = SchemaReport {
        version: conn.query_row("PRAGMA user_version", [], |row| row.get(0))?,
        ..SchemaReport::default()
    };

    for (table, required) in GRAPH_TABLES {
        let columns = table_columns(conn, table)?;
        if columns.is_empty() {
            report.missing_tables.push(table.to_string());
            continue;
        }
        for column in required {
            if !columns.iter().any(|c| c == column) {
                report.missing_columns.push(format!("{}.{}", table, column));
            }
        }
    }

    Ok(report)
}

/// Fails unless every graph table and column is present.
pub fn require(conn: &Connection) -> Result<SchemaReport> {
    let report = inspect(conn)?;
    if !report.is_ready() {
        return Err(DmrestError::Config(format!(
            "topic graph schema incomplete ({}); run `dmrest init` or point db_path at the host store",
            report.describe()
        )));
    }
    Ok(report)
}

/// Create the graph tables on a store at a lower schema version.
pub fn install(conn: &mut Connection) -> Result<()> {
    let version: i32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    if version >= SCHEMA_VERSION {
        log::debug!("Topic graph schema already at version {}", version);
        return Ok(());
    }

    // Persistent for the file, so set only when this service owns it
    let journal_mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    log::debug!("Journal mode: {}", journal_mode);

    let tx = conn.transaction()?;
    tx.execute_batch(TOPIC_GRAPH_SQL).map_err(|e| {
        DmrestError::Database(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
            Some(format!("Failed to install topic graph schema: {}", e)),
        ))
    })?;
    tx.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    tx.commit()?;

    log::info!("Topic graph schema installed (version {})", SCHEMA_VERSION);
    Ok(())
}
