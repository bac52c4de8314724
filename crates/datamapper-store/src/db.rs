//! Database connection management
//!
//! Provides the injected `Session` handle and savepoint scoping for writes

#![allow(clippy::result_large_err)]

use crate::errors::{from_rusqlite, Result};
use rusqlite::Connection;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

/// Connection settings applied when a session is opened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    pub foreign_keys: bool,
    /// `PRAGMA journal_mode` value; `None` keeps SQLite's default
    pub journal_mode: Option<String>,
    pub busy_timeout: Option<Duration>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            foreign_keys: true,
            journal_mode: Some("WAL".to_string()),
            busy_timeout: Some(Duration::from_secs(5)),
        }
    }
}

/// Shared handle to an open connection
///
/// Mappers borrow the connection per call and never open or close it. Cloning
/// a session shares the same connection.
#[derive(Debug, Clone)]
pub struct Session {
    conn: Rc<Connection>,
}

impl Session {
    /// Open a file-backed session
    pub fn open<P: AsRef<Path>>(path: P, options: &SessionOptions) -> Result<Self> {
        let conn = open(path)?;
        configure(&conn, options)?;
        Ok(Self::from_connection(conn))
    }

    /// Open an in-memory session (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = open_in_memory()?;
        configure(
            &conn,
            &SessionOptions {
                journal_mode: None,
                ..SessionOptions::default()
            },
        )?;
        Ok(Self::from_connection(conn))
    }

    /// Adopt a connection opened elsewhere, as is
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Rc::new(conn),
        }
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// True if both handles share one connection
    pub fn same_connection(&self, other: &Session) -> bool {
        Rc::ptr_eq(&self.conn, &other.conn)
    }
}

/// Open a SQLite database at the given path
pub fn open<P: AsRef<Path>>(path: P) -> Result<Connection> {
    Connection::open(path).map_err(from_rusqlite)
}

/// Open an in-memory SQLite database (for testing)
pub fn open_in_memory() -> Result<Connection> {
    Connection::open_in_memory().map_err(from_rusqlite)
}

/// Configure a connection with the given settings
pub fn configure(conn: &Connection, options: &SessionOptions) -> Result<()> {
    conn.pragma_update(None, "foreign_keys", options.foreign_keys)
        .map_err(from_rusqlite)?;

    if let Some(mode) = &options.journal_mode {
        let applied: String = conn
            .pragma_update_and_check(None, "journal_mode", mode, |row| row.get(0))
            .map_err(from_rusqlite)?;
        tracing::debug!(journal_mode = %applied, "Configured journal mode");
    }

    if let Some(timeout) = options.busy_timeout {
        conn.busy_timeout(timeout).map_err(from_rusqlite)?;
    }

    Ok(())
}

/// Scope guard over a named SQLite savepoint
///
/// Dropping the guard without `commit` rolls the savepoint back. Works on a
/// shared `&Connection`, unlike `rusqlite::Savepoint`.
pub struct Savepoint<'c> {
    conn: &'c Connection,
    name: &'static str,
    finished: bool,
}

impl<'c> Savepoint<'c> {
    /// `name` must be a plain identifier
    pub fn begin(conn: &'c Connection, name: &'static str) -> Result<Self> {
        conn.execute_batch(&format!("SAVEPOINT {}", name))
            .map_err(from_rusqlite)?;
        Ok(Self {
            conn,
            name,
            finished: false,
        })
    }

    pub fn commit(mut self) -> Result<()> {
        self.finished = true;
        self.conn
            .execute_batch(&format!("RELEASE {}", self.name))
            .map_err(from_rusqlite)
    }

    pub fn rollback(mut self) -> Result<()> {
        self.finished = true;
        self.undo()
    }

    fn undo(&self) -> Result<()> {
        self.conn
            .execute_batch(&format!(
                "ROLLBACK TO {name}; RELEASE {name}",
                name = self.name
            ))
            .map_err(from_rusqlite)
    }
}

impl Drop for Savepoint<'_> {
    fn drop(&mut self) {
        if !self.finished {
            if let Err(e) = self.undo() {
                tracing::debug!(savepoint = self.name, error = %e, "Savepoint rollback failed");
            }
        }
    }
}
