//! Lazily materialized sequences of domain objects
//!
//! A `Collection` keeps two parallel arenas indexed by position: raw rows
//! as fetched, and the objects built from them. An object is built at most
//! once per position. Objects appended with `add` have no raw row.
//!
//! Eager collections receive every raw row up front. Lazy collections start
//! with no rows and fill the raw arena window by window: before a range of
//! positions is read, one bounded fetch covers it unless every position in
//! it is already cached. Cached rows are never evicted or re-fetched.

#![allow(clippy::result_large_err)]

use crate::errors::{wrong_domain_type, Result};
use crate::lazy_collection::{LazySource, WindowStats};
use crate::mapper::Mapper;
use crate::query::Select;
use datamapper_core::errors::{ExError, ExErrorKind};
use datamapper_core::{DomainObject, RawRow};
use std::any::Any;

enum Source {
    Eager { stored: usize },
    Lazy(LazySource),
}

pub struct Collection<'m, M: Mapper> {
    mapper: &'m M,
    source: Source,
    rows: Vec<Option<RawRow>>,
    objects: Vec<Option<M::Object>>,
    appended: usize,
    position: usize,
    prefetch: usize,
}

impl<'m, M: Mapper> Collection<'m, M> {
    /// Eager collection over an already fetched row batch
    pub fn from_rows(mapper: &'m M, rows: Vec<RawRow>) -> Self {
        let stored = rows.len();
        Self {
            mapper,
            source: Source::Eager { stored },
            rows: rows.into_iter().map(Some).collect(),
            objects: Vec::new(),
            appended: 0,
            position: 0,
            prefetch: 1,
        }
    }

    /// Lazy collection over an unexecuted select
    pub fn lazy(mapper: &'m M, source: LazySource, prefetch: usize) -> Self {
        Self {
            mapper,
            source: Source::Lazy(source),
            rows: Vec::new(),
            objects: Vec::new(),
            appended: 0,
            position: 0,
            prefetch: prefetch.max(1),
        }
    }

    pub fn is_lazy(&self) -> bool {
        matches!(self.source, Source::Lazy(_))
    }

    /// The deferred select of a lazy collection
    pub fn select(&self) -> Option<&Select> {
        match &self.source {
            Source::Lazy(lazy) => Some(lazy.select()),
            Source::Eager { .. } => None,
        }
    }

    /// Round trips made so far; `None` for eager collections
    pub fn window_stats(&self) -> Option<&WindowStats> {
        match &self.source {
            Source::Lazy(lazy) => Some(lazy.stats()),
            Source::Eager { .. } => None,
        }
    }

    /// Number of elements: stored rows plus appended objects
    ///
    /// A lazy collection resolves its stored row count with one count query
    /// on first use.
    pub fn count(&mut self) -> Result<usize> {
        Ok(self.stored_count()? + self.appended)
    }

    /// Object at `position`, building it from its raw row on first access
    pub fn row(&mut self, position: usize) -> Result<Option<&M::Object>> {
        self.materialize(position)?;
        Ok(self.cached(position))
    }

    /// `count` consecutive entries starting at `offset`, for paging
    ///
    /// Positions past the end of the collection yield `None`.
    /// Fails with a validation error if `offset + count` overflows.
    pub fn get_items(&mut self, offset: usize, count: usize) -> Result<Vec<Option<&M::Object>>> {
        let end = offset
            .checked_add(count)
            .ok_or_else(|| invalid_range(offset, count))?;
        let mut items: Vec<Option<&M::Object>> = Vec::new();
        items
            .try_reserve_exact(count)
            .map_err(|_| invalid_range(offset, count))?;

        self.ensure_window(offset, count)?;
        // Past the last element every entry is None; skip materializing them
        let filled = end.min(self.count()?.max(offset));
        for position in offset..filled {
            self.materialize(position)?;
        }
        items.extend((offset..filled).map(|p| self.cached(p)));
        items.resize(count, None);
        Ok(items)
    }

    /// Append an object of the mapper's domain type
    ///
    /// Fails without changing the collection if the object is of another
    /// domain type.
    pub fn add<E: DomainObject>(&mut self, object: E) -> Result<()> {
        let actual = object.type_name();
        let boxed: Box<dyn Any> = Box::new(object);
        let object = boxed
            .downcast::<M::Object>()
            .map_err(|_| {
                wrong_domain_type(<M::Object as DomainObject>::schema().type_name(), actual)
            })?;
        let position = self.count()?;
        self.slot(position);
        self.objects[position] = Some(*object);
        self.appended += 1;
        Ok(())
    }

    // ========== Cursor ==========

    pub fn rewind(&mut self) {
        self.position = 0;
    }

    /// Object under the cursor; `None` past the end
    pub fn current(&mut self) -> Result<Option<&M::Object>> {
        self.row(self.position)
    }

    pub fn key(&self) -> usize {
        self.position
    }

    pub fn next(&mut self) {
        self.position += 1;
    }

    pub fn valid(&mut self) -> Result<bool> {
        Ok(self.position < self.count()?)
    }

    /// Iterate from the first position, yielding owned copies
    pub fn iter(&mut self) -> Iter<'_, 'm, M> {
        Iter {
            collection: self,
            position: 0,
            failed: false,
        }
    }

    // ========== Internals ==========

    fn stored_count(&mut self) -> Result<usize> {
        match &mut self.source {
            Source::Eager { stored } => Ok(*stored),
            Source::Lazy(lazy) => lazy.stored_count(),
        }
    }

    fn cached(&self, position: usize) -> Option<&M::Object> {
        self.objects.get(position).and_then(Option::as_ref)
    }

    fn materialize(&mut self, position: usize) -> Result<()> {
        if self.cached(position).is_some() {
            return Ok(());
        }
        if self.rows.get(position).map_or(true, Option::is_none) {
            self.ensure_window(position, self.prefetch)?;
        }
        let Some(raw) = self.rows.get(position).and_then(Option::as_ref) else {
            return Ok(());
        };

        tracing::debug!(position, "Materializing collection element");
        let object = self.mapper.create_object(raw)?;
        self.slot(position);
        self.objects[position] = Some(object);
        Ok(())
    }

    /// Make sure raw rows cover `[offset, offset + length)`, clamped to the
    /// stored rows, with at most one fetch
    fn ensure_window(&mut self, offset: usize, length: usize) -> Result<()> {
        let Source::Lazy(lazy) = &mut self.source else {
            return Ok(());
        };
        let stored = lazy.stored_count()?;
        if offset >= stored || length == 0 {
            return Ok(());
        }
        let length = length.min(stored - offset);
        let end = offset + length;

        let cached = (offset..end).all(|p| self.rows.get(p).is_some_and(Option::is_some));
        if cached {
            return Ok(());
        }

        let fetched = lazy.fetch(offset, length)?;
        if self.rows.len() < end {
            self.rows.resize_with(end, || None);
        }
        for (row, slot) in fetched.into_iter().zip(&mut self.rows[offset..end]) {
            if slot.is_none() {
                *slot = Some(row);
            }
        }
        Ok(())
    }

    fn slot(&mut self, position: usize) {
        if self.objects.len() <= position {
            self.objects.resize_with(position + 1, || None);
        }
    }
}

fn invalid_range(offset: usize, count: usize) -> ExError {
    ExError::new(ExErrorKind::Validation)
        .with_op("get_items")
        .with_message(format!("Range of {} items from {} cannot be represented", count, offset))
}

/// Iterator over a collection, see `Collection::iter`
pub struct Iter<'c, 'm, M: Mapper> {
    collection: &'c mut Collection<'m, M>,
    position: usize,
    failed: bool,
}

impl<M: Mapper> Iterator for Iter<'_, '_, M> {
    type Item = Result<M::Object>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        loop {
            let count = match self.collection.count() {
                Ok(count) => count,
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            };
            if self.position >= count {
                return None;
            }
            let position = self.position;
            self.position += 1;
            match self.collection.row(position) {
                Ok(Some(object)) => return Some(Ok(object.clone())),
                // Row vanished between count and fetch
                Ok(None) => continue,
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
