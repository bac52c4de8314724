//! Deferred row source for lazy collections
//!
//! Holds the unexecuted select and resolves the stored row count once, via
//! the derived count query. Rows are fetched in bounded windows; which
//! windows to fetch is decided by the owning `Collection`.

#![allow(clippy::result_large_err)]

use crate::db::Session;
use crate::errors::Result;
use crate::query::Select;
use crate::repo::SqliteRepo;
use datamapper_core::RawRow;

/// Store round trips made by a lazy collection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowStats {
    pub count_queries: usize,
    /// `(offset, length)` of every window fetched, in order
    pub windows: Vec<(usize, usize)>,
}

impl WindowStats {
    pub fn round_trips(&self) -> usize {
        self.count_queries + self.windows.len()
    }

    /// True if some fetched window covered `position`
    pub fn covered(&self, position: usize) -> bool {
        self.windows
            .iter()
            .any(|(offset, length)| (*offset..offset + length).contains(&position))
    }
}

pub struct LazySource {
    select: Select,
    session: Session,
    stored_count: Option<usize>,
    stats: WindowStats,
}

impl LazySource {
    pub fn new(select: Select, session: Session) -> Self {
        Self {
            select,
            session,
            stored_count: None,
            stats: WindowStats::default(),
        }
    }

    pub fn select(&self) -> &Select {
        &self.select
    }

    pub fn stats(&self) -> &WindowStats {
        &self.stats
    }

    pub fn is_count_resolved(&self) -> bool {
        self.stored_count.is_some()
    }

    /// Rows matched in the store; queried on first call, cached after
    pub fn stored_count(&mut self) -> Result<usize> {
        if let Some(count) = self.stored_count {
            return Ok(count);
        }
        let count = SqliteRepo::count(self.session.conn(), &self.select)?;
        self.stats.count_queries += 1;
        self.stored_count = Some(count);
        tracing::debug!(table = self.select.table(), rows = count, "Resolved collection size");
        Ok(count)
    }

    /// Fetch rows `[offset, offset + length)` in one round trip
    pub fn fetch(&mut self, offset: usize, length: usize) -> Result<Vec<RawRow>> {
        tracing::debug!(
            table = self.select.table(),
            offset,
            length,
            "Fetching collection window"
        );
        let rows = SqliteRepo::fetch_all(self.session.conn(), &self.select.window(offset, length))?;
        self.stats.windows.push((offset, length));
        Ok(rows)
    }
}
