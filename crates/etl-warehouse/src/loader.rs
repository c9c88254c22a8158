//! SQLite table writing with full-replace semantics.

use std::path::Path;

use etl_core::error::{EtlError, Result};
use etl_core::table::Table;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::info;

/// The outcome of one table write, reported per table so a run that dies
/// mid-load can be diagnosed from what did and did not land.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    pub table: String,
    pub rows: usize,
}

/// The warehouse: a single SQLite connection used sequentially.
///
/// Writes are transactional per table only; there is no atomicity across
/// the full table set, so a crash mid-run leaves the warehouse partially
/// updated (the returned [`LoadReport`]s say how far it got).
pub struct Warehouse {
    conn: Connection,
}

impl Warehouse {
    /// Open (or create) the warehouse file at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(storage)?;
        Ok(Self { conn })
    }

    /// Open an in-memory warehouse.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(storage)?;
        Ok(Self { conn })
    }

    /// Replace the named table with the given contents.
    ///
    /// Drops any existing table, recreates it from the `Table`'s declared
    /// column types and inserts every row inside one transaction. Missing
    /// cells are bound as NULL.
    pub fn replace_table(&mut self, name: &str, table: &Table) -> Result<LoadReport> {
        if table.columns.is_empty() {
            return Err(EtlError::Storage(format!(
                "refusing to create table {} with no columns",
                name
            )));
        }

        let tx = self.conn.transaction().map_err(storage)?;

        tx.execute(&format!("DROP TABLE IF EXISTS {}", quote_ident(name)), [])
            .map_err(storage)?;

        let column_defs: Vec<String> = table
            .columns
            .iter()
            .map(|c| format!("{} {}", quote_ident(&c.name), c.ty.sql_name()))
            .collect();
        tx.execute(
            &format!(
                "CREATE TABLE {} ({})",
                quote_ident(name),
                column_defs.join(", ")
            ),
            [],
        )
        .map_err(storage)?;

        {
            let placeholders = vec!["?"; table.columns.len()].join(", ");
            let column_names: Vec<String> = table
                .columns
                .iter()
                .map(|c| quote_ident(&c.name))
                .collect();
            let mut stmt = tx
                .prepare(&format!(
                    "INSERT INTO {} ({}) VALUES ({})",
                    quote_ident(name),
                    column_names.join(", "),
                    placeholders
                ))
                .map_err(storage)?;

            for row in &table.rows {
                stmt.execute(rusqlite::params_from_iter(row.iter()))
                    .map_err(storage)?;
            }
        }

        tx.commit().map_err(storage)?;

        info!("loaded {}: {} rows", name, table.row_count());
        Ok(LoadReport {
            table: name.to_string(),
            rows: table.row_count(),
        })
    }

    /// Names of all user tables currently in the warehouse, sorted.
    pub fn table_names(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .map_err(storage)?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .map_err(storage)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(storage)?;
        Ok(names)
    }

    /// Row count of the named table.
    pub fn row_count(&self, name: &str) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row(
                &format!("SELECT count(*) FROM {}", quote_ident(name)),
                [],
                |row| row.get(0),
            )
            .map_err(storage)?;
        Ok(count as usize)
    }
}

fn storage(e: rusqlite::Error) -> EtlError {
    EtlError::Storage(e.to_string())
}

/// Double-quote an identifier, escaping embedded quotes.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use etl_core::table::{Column, Table};

    fn two_column_table(rows: Vec<(&str, Option<&str>)>) -> Table {
        let mut t = Table::new(vec![Column::text("id"), Column::text("value")]);
        for (id, value) in rows {
            t.push_row(vec![Some(id.to_string()), value.map(str::to_string)]);
        }
        t
    }

    fn query_all(w: &Warehouse, sql: &str) -> Vec<(String, Option<String>)> {
        let mut stmt = w.conn.prepare(sql).unwrap();
        let rows = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        rows
    }

    // ── basic writes ──────────────────────────────────────────────────────

    #[test]
    fn test_replace_table_writes_rows() {
        let mut w = Warehouse::open_in_memory().unwrap();
        let report = w
            .replace_table(
                "t",
                &two_column_table(vec![("1", Some("a")), ("2", Some("b"))]),
            )
            .unwrap();
        assert_eq!(report, LoadReport { table: "t".to_string(), rows: 2 });
        assert_eq!(w.row_count("t").unwrap(), 2);
    }

    #[test]
    fn test_missing_cells_become_null() {
        let mut w = Warehouse::open_in_memory().unwrap();
        w.replace_table("t", &two_column_table(vec![("1", None)]))
            .unwrap();
        let rows = query_all(&w, "SELECT id, value FROM t");
        assert_eq!(rows, vec![("1".to_string(), None)]);
    }

    #[test]
    fn test_declared_column_types_in_schema() {
        let mut w = Warehouse::open_in_memory().unwrap();
        let mut t = Table::new(vec![
            Column::text("customer_id"),
            Column::date("effective_start"),
            Column::integer("is_current"),
        ]);
        t.push_row(vec![
            Some("C001".to_string()),
            Some("2024-01-01".to_string()),
            Some("1".to_string()),
        ]);
        w.replace_table("dim", &t).unwrap();

        let sql: String = w
            .conn
            .query_row(
                "SELECT sql FROM sqlite_master WHERE name = 'dim'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert!(sql.contains("\"effective_start\" DATE"));
        assert!(sql.contains("\"is_current\" INTEGER"));
    }

    // ── full-replace semantics ────────────────────────────────────────────

    #[test]
    fn test_second_run_leaves_no_residue() {
        let mut w = Warehouse::open_in_memory().unwrap();
        w.replace_table(
            "t",
            &two_column_table(vec![("1", Some("old")), ("2", Some("old"))]),
        )
        .unwrap();
        w.replace_table("t", &two_column_table(vec![("9", Some("new"))]))
            .unwrap();

        let rows = query_all(&w, "SELECT id, value FROM t");
        assert_eq!(rows, vec![("9".to_string(), Some("new".to_string()))]);
    }

    #[test]
    fn test_replace_can_change_schema() {
        let mut w = Warehouse::open_in_memory().unwrap();
        w.replace_table("t", &two_column_table(vec![("1", Some("a"))]))
            .unwrap();

        let mut narrower = Table::new(vec![Column::text("only")]);
        narrower.push_row(vec![Some("x".to_string())]);
        w.replace_table("t", &narrower).unwrap();

        let names = w.table_names().unwrap();
        assert_eq!(names, vec!["t"]);
        assert_eq!(w.row_count("t").unwrap(), 1);
    }

    // ── edge cases ────────────────────────────────────────────────────────

    #[test]
    fn test_empty_table_creates_schema_with_no_rows() {
        let mut w = Warehouse::open_in_memory().unwrap();
        let report = w.replace_table("t", &two_column_table(vec![])).unwrap();
        assert_eq!(report.rows, 0);
        assert_eq!(w.row_count("t").unwrap(), 0);
    }

    #[test]
    fn test_zero_column_table_is_rejected() {
        let mut w = Warehouse::open_in_memory().unwrap();
        let err = w.replace_table("t", &Table::default()).unwrap_err();
        assert!(matches!(err, EtlError::Storage(_)));
    }

    #[test]
    fn test_identifier_quoting() {
        assert_eq!(quote_ident("plain"), "\"plain\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");

        // A reserved word as a table name must still work.
        let mut w = Warehouse::open_in_memory().unwrap();
        w.replace_table("order", &two_column_table(vec![("1", Some("a"))]))
            .unwrap();
        assert_eq!(w.row_count("order").unwrap(), 1);
    }

    #[test]
    fn test_open_creates_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("warehouse.db");
        {
            let mut w = Warehouse::open(&path).unwrap();
            w.replace_table("t", &two_column_table(vec![("1", Some("a"))]))
                .unwrap();
        }
        assert!(path.exists());

        // Reopen and read back.
        let w = Warehouse::open(&path).unwrap();
        assert_eq!(w.row_count("t").unwrap(), 1);
    }
}
