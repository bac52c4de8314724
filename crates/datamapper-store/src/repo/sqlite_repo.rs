//! SQLite repository implementation
//!
//! Executes selects, counts and single-row writes built by the mapper. All
//! values cross the boundary as `Value` via the row codec.

#![allow(clippy::result_large_err)]

use crate::codec::{read_row, to_sql_value};
use crate::errors::{from_rusqlite, Result};
use crate::query::{quote_identifier, Select};
use datamapper_core::{RawRow, Value};
use rusqlite::{params_from_iter, Connection};

/// Statement executor for mapper-built queries
pub struct SqliteRepo;

impl SqliteRepo {
    /// Fetch every row matched by the select
    pub fn fetch_all(conn: &Connection, select: &Select) -> Result<Vec<RawRow>> {
        let (sql, params) = select.to_sql();
        tracing::debug!(sql = %sql, params = params.len(), "Fetching rows");

        let mut stmt = conn.prepare(&sql).map_err(from_rusqlite)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let mut rows = stmt
            .query(params_from_iter(params.iter().map(to_sql_value)))
            .map_err(from_rusqlite)?;

        let mut out = Vec::new();
        while let Some(row) = rows.next().map_err(from_rusqlite)? {
            out.push(read_row(row, &columns)?);
        }
        Ok(out)
    }

    /// Fetch the first row matched by the select, if any
    pub fn fetch_one(conn: &Connection, select: &Select) -> Result<Option<RawRow>> {
        let rows = Self::fetch_all(conn, &select.clone().limit(1))?;
        Ok(rows.into_iter().next())
    }

    /// Count the rows matched by the select's filters
    pub fn count(conn: &Connection, select: &Select) -> Result<usize> {
        let (sql, params) = select.count_sql();
        tracing::debug!(sql = %sql, "Counting rows");

        let count: i64 = conn
            .query_row(
                &sql,
                params_from_iter(params.iter().map(to_sql_value)),
                |r| r.get(0),
            )
            .map_err(from_rusqlite)?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Insert one row and return its identity
    ///
    /// Null columns are left out so column defaults apply; a null primary
    /// key is assigned by SQLite and the new rowid is returned.
    pub fn insert(conn: &Connection, table: &str, primary_key: &str, row: &RawRow) -> Result<Value> {
        let written: Vec<(&String, &Value)> = row.iter().filter(|(_, value)| !value.is_null()).collect();

        let sql = if written.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES", quote_identifier(table))
        } else {
            let columns: Vec<String> = written.iter().map(|(c, _)| quote_identifier(c)).collect();
            let placeholders: Vec<String> = (1..=written.len()).map(|i| format!("?{}", i)).collect();
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                quote_identifier(table),
                columns.join(", "),
                placeholders.join(", ")
            )
        };
        tracing::debug!(sql = %sql, "Inserting row");

        conn.execute(&sql, params_from_iter(written.iter().map(|(_, v)| to_sql_value(v))))
            .map_err(from_rusqlite)?;

        Ok(match row.get(primary_key) {
            Some(id) if !id.is_null() => id.clone(),
            _ => Value::Integer(conn.last_insert_rowid()),
        })
    }

    /// Update the row with the given identity; returns the affected row count
    pub fn update(
        conn: &Connection,
        table: &str,
        primary_key: &str,
        id: &Value,
        row: &RawRow,
    ) -> Result<usize> {
        let written: Vec<(&String, &Value)> = row
            .iter()
            .filter(|(column, _)| column.as_str() != primary_key)
            .collect();

        let assignments: Vec<String> = if written.is_empty() {
            // Nothing to change; still touch the row so a missing identity is detected
            vec![format!("{0} = {0}", quote_identifier(primary_key))]
        } else {
            written
                .iter()
                .enumerate()
                .map(|(i, (c, _))| format!("{} = ?{}", quote_identifier(c), i + 1))
                .collect()
        };
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ?{}",
            quote_identifier(table),
            assignments.join(", "),
            quote_identifier(primary_key),
            written.len() + 1
        );
        tracing::debug!(sql = %sql, "Updating row");

        let params = written
            .iter()
            .map(|(_, v)| to_sql_value(v))
            .chain(std::iter::once(to_sql_value(id)));
        conn.execute(&sql, params_from_iter(params))
            .map_err(from_rusqlite)
    }

    /// Delete the row with the given identity; returns the affected row count
    pub fn delete(conn: &Connection, table: &str, primary_key: &str, id: &Value) -> Result<usize> {
        let sql = format!(
            "DELETE FROM {} WHERE {} = ?1",
            quote_identifier(table),
            quote_identifier(primary_key)
        );
        tracing::debug!(sql = %sql, "Deleting row");

        conn.execute(&sql, params_from_iter(std::iter::once(to_sql_value(id))))
            .map_err(from_rusqlite)
    }
}
