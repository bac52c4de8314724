//! Mapper: translation between domain objects and table rows
//!
//! ## Logging Ownership
//!
//! Mapper operations own lifecycle logging:
//! - `log_op_start!` at entry
//! - `log_op_end!` on success
//! - `log_op_error!` on failure
//!
//! Collections, the repository and the codec use only `tracing::debug!()`.

#![allow(clippy::result_large_err)]

use crate::active::{ActiveObject, Binding};
use crate::collection::Collection;
use crate::config::MapperConfig;
use crate::db::{Savepoint, Session};
use crate::errors::{refresh_failed, row_not_found, wrong_domain_type, Result};
use crate::lazy_collection::LazySource;
use crate::query::{Criteria, Direction, Filter, Select};
use crate::repo::SqliteRepo;
use datamapper_core::{log_op_end, log_op_error, log_op_start};
use datamapper_core::{DomainObject, PropertyMap, RawRow, Value};
use std::any::Any;
use std::time::Instant;

/// Options for `Mapper::find_by` / `Mapper::find_all`
#[derive(Debug, Clone)]
pub struct FindOptions {
    /// Defer the query and fetch rows in windows on demand
    pub lazy: bool,
    /// Read through this session instead of the mapper's own
    pub session: Option<Session>,
    /// Explicit ordering; the primary key (ascending) breaks ties
    pub order_by: Vec<(String, Direction)>,
    /// Minimum window length for single-position reads on a lazy collection
    pub prefetch: usize,
}

impl Default for FindOptions {
    fn default() -> Self {
        Self {
            lazy: false,
            session: None,
            order_by: Vec::new(),
            prefetch: 1,
        }
    }
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lazy(mut self, lazy: bool) -> Self {
        self.lazy = lazy;
        self
    }

    pub fn session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.order_by.push((column.into(), direction));
        self
    }

    pub fn prefetch(mut self, prefetch: usize) -> Self {
        self.prefetch = prefetch;
        self
    }
}

/// Maps one domain type onto one table
///
/// Implementors supply the session handle and a static `MapperConfig`;
/// every operation has a default implementation.
///
/// Deletion is disabled by default: `delete` type-checks and then calls
/// `delete_object`, which does nothing unless overridden (typically with
/// `delete_row`).
pub trait Mapper: Sized + 'static {
    type Object: ActiveObject<Mapper = Self>;

    /// Construct the mapper around an injected session
    fn from_session(session: Session) -> Self;

    fn session(&self) -> &Session;

    /// Static table and column configuration, built once
    fn config() -> &'static MapperConfig;

    /// Name of the domain type this mapper handles
    fn domain_object_class(&self) -> Result<&'static str> {
        let schema = <Self::Object as DomainObject>::schema();
        schema.ensure_valid()?;
        Ok(schema.type_name())
    }

    /// Fetch one object by identity; `None` if no row matches
    fn get(&self, id: impl Into<Value>) -> Result<Option<Self::Object>> {
        let id = id.into();
        log_op_start!("mapper_get", mapper = Self::config().name(), id = %id.display());
        let start = Instant::now();

        let result = get_impl(self, id).map_err(|e| {
            log_op_error!(
                "mapper_get",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            e
        })?;

        log_op_end!(
            "mapper_get",
            duration_ms = start.elapsed().as_millis() as u64,
            found = result.is_some()
        );
        Ok(result)
    }

    /// Find objects matching every criterion (column name -> value or value list)
    fn find_by(&self, criteria: &Criteria, options: FindOptions) -> Result<Collection<'_, Self>> {
        log_op_start!(
            "mapper_find_by",
            mapper = Self::config().name(),
            criteria = criteria.len(),
            lazy = options.lazy
        );
        let start = Instant::now();

        let collection = find_by_impl(self, criteria, options).map_err(|e| {
            log_op_error!(
                "mapper_find_by",
                e.clone(),
                duration_ms = start.elapsed().as_millis() as u64
            );
            e
        })?;

        log_op_end!(
            "mapper_find_by",
            duration_ms = start.elapsed().as_millis() as u64,
            lazy = collection.is_lazy()
        );
        Ok(collection)
    }

    fn find_all(&self, options: FindOptions) -> Result<Collection<'_, Self>> {
        self.find_by(&Criteria::new(), options)
    }

    /// Insert or update the object, then refresh it from its stored row
    ///
    /// Objects without an identity are inserted; the others are updated and
    /// must already have a row. The write and the re-read share one
    /// savepoint: if the re-read fails, the write is rolled back, the object
    /// is left as it was, and the error has kind `RefreshFailed`.
    fn save<'o, E: DomainObject>(&self, object: &'o mut E) -> Result<&'o mut Self::Object> {
        log_op_start!("mapper_save", mapper = Self::config().name());
        let start = Instant::now();

        let result = downcast_mut::<Self::Object, E>(object)
            .and_then(|object| save_impl(self, object).map(|()| object));
        match result {
            Ok(object) => {
                log_op_end!(
                    "mapper_save",
                    duration_ms = start.elapsed().as_millis() as u64,
                    id = %object.id().unwrap_or_default().display()
                );
                Ok(object)
            }
            Err(e) => {
                log_op_error!(
                    "mapper_save",
                    e.clone(),
                    duration_ms = start.elapsed().as_millis() as u64
                );
                Err(e)
            }
        }
    }

    /// Type-check the object, then hand it to `delete_object`
    fn delete<E: DomainObject>(&self, object: &E) -> Result<()> {
        log_op_start!("mapper_delete", mapper = Self::config().name());
        let start = Instant::now();

        let result = downcast_ref::<Self::Object, E>(object).and_then(|o| self.delete_object(o));
        match result {
            Ok(()) => {
                log_op_end!(
                    "mapper_delete",
                    duration_ms = start.elapsed().as_millis() as u64
                );
                Ok(())
            }
            Err(e) => {
                log_op_error!(
                    "mapper_delete",
                    e.clone(),
                    duration_ms = start.elapsed().as_millis() as u64
                );
                Err(e)
            }
        }
    }

    /// Deletion hook; does nothing unless a mapper opts in
    fn delete_object(&self, object: &Self::Object) -> Result<()> {
        tracing::debug!(
            mapper = Self::config().name(),
            id = %object.id().unwrap_or_default().display(),
            "Delete not enabled for this mapper; ignoring"
        );
        Ok(())
    }

    /// Delete the object's row by identity; returns the affected row count
    ///
    /// Objects without an identity have no row and delete nothing.
    fn delete_row(&self, object: &Self::Object) -> Result<usize> {
        let Some(id) = object.id() else {
            return Ok(0);
        };
        let config = Self::config();
        SqliteRepo::delete(
            self.session().conn(),
            config.table()?,
            config.primary_key()?,
            &id,
        )
    }

    /// Build a bound domain object from a raw row
    fn create_object(&self, row: &RawRow) -> Result<Self::Object> {
        let mut object = Self::Object::from_map(&self.map_row(row))?;
        *object.binding_mut() = Binding::new(self.session().clone());
        Ok(object)
    }

    /// Column names -> property names; dropped columns are skipped
    fn map_row(&self, row: &RawRow) -> PropertyMap {
        let config = Self::config();
        row.iter()
            .filter_map(|(column, value)| {
                config
                    .property_for(column)
                    .map(|property| (property.to_string(), value.clone()))
            })
            .collect()
    }

    /// Property names -> column names; properties without a column are skipped
    fn map_object(&self, object: &Self::Object) -> RawRow {
        let config = Self::config();
        object
            .to_map()
            .into_iter()
            .filter_map(|(property, value)| {
                config
                    .column_for(&property)
                    .map(|column| (column.to_string(), value))
            })
            .collect()
    }

    /// Unexecuted select over the mapper's table
    fn base_select(&self) -> Result<Select> {
        Ok(Select::from_table(Self::config().table()?))
    }
}

fn get_impl<M: Mapper>(mapper: &M, id: Value) -> Result<Option<M::Object>> {
    let config = M::config();
    let select = mapper
        .base_select()?
        .filter(Filter::Eq(config.primary_key()?.to_string(), id));

    SqliteRepo::fetch_one(mapper.session().conn(), &select)?
        .map(|row| mapper.create_object(&row))
        .transpose()
}

fn find_by_impl<'m, M: Mapper>(
    mapper: &'m M,
    criteria: &Criteria,
    options: FindOptions,
) -> Result<Collection<'m, M>> {
    let mut select = criteria
        .iter()
        .fold(mapper.base_select()?, |select, (column, criterion)| {
            select.filter(criterion.clone().into_filter(column.as_str()))
        });

    for (column, direction) in &options.order_by {
        select = select.order_by(column.as_str(), *direction);
    }
    // Stable positions across windows need a total order
    let primary_key = M::config().primary_key()?;
    if !options.order_by.iter().any(|(column, _)| column == primary_key) {
        select = select.order_by(primary_key, Direction::Asc);
    }

    let session = options
        .session
        .unwrap_or_else(|| mapper.session().clone());

    if options.lazy {
        Ok(Collection::lazy(
            mapper,
            LazySource::new(select, session),
            options.prefetch,
        ))
    } else {
        let rows = SqliteRepo::fetch_all(session.conn(), &select)?;
        Ok(Collection::from_rows(mapper, rows))
    }
}

fn save_impl<M: Mapper>(mapper: &M, object: &mut M::Object) -> Result<()> {
    let config = M::config();
    let table = config.table()?;
    let primary_key = config.primary_key()?;
    let row = mapper.map_object(object);
    let conn = mapper.session().conn();

    let savepoint = Savepoint::begin(conn, "datamapper_save")?;

    let id = match object.id() {
        Some(id) => {
            if SqliteRepo::update(conn, table, primary_key, &id, &row)? == 0 {
                return Err(row_not_found(table, primary_key, &id).with_op("mapper_save"));
            }
            id
        }
        None => SqliteRepo::insert(conn, table, primary_key, &row)?,
    };

    // Re-read to pick up store-assigned values (identity, defaults, triggers)
    let refreshed = refresh(mapper, object, table, primary_key, &id)
        .map_err(|e| refresh_failed(table, &id, e))?;

    savepoint.commit()?;
    *object = refreshed;
    Ok(())
}

fn refresh<M: Mapper>(
    mapper: &M,
    object: &M::Object,
    table: &str,
    primary_key: &str,
    id: &Value,
) -> Result<M::Object> {
    let select = Select::from_table(table).filter(Filter::Eq(primary_key.to_string(), id.clone()));
    let row = SqliteRepo::fetch_one(mapper.session().conn(), &select)?
        .ok_or_else(|| row_not_found(table, primary_key, id))?;

    let mut staged = object.clone();
    staged.populate(&mapper.map_row(&row))?;
    Ok(staged)
}

pub(crate) fn downcast_mut<T: DomainObject, E: DomainObject>(object: &mut E) -> Result<&mut T> {
    let actual = object.type_name();
    (object as &mut dyn Any)
        .downcast_mut::<T>()
        .ok_or_else(|| wrong_domain_type(T::schema().type_name(), actual))
}

pub(crate) fn downcast_ref<T: DomainObject, E: DomainObject>(object: &E) -> Result<&T> {
    let actual = object.type_name();
    (object as &dyn Any)
        .downcast_ref::<T>()
        .ok_or_else(|| wrong_domain_type(T::schema().type_name(), actual))
}
