//! Lazy properties
//!
//! A lazy property is hydrated only when first read and persisted only if it
//! was read before save. Each lazy property registers a small handler table
//! (`load`, `store`, `persist`) in the type's `Schema`; the record keeps a
//! `LazyState` listing which lazy properties have been read.

use super::domain_object::DomainObject;
use super::schema::{Getter, Setter};
use crate::errors::Result;
use crate::value::Value;
use std::collections::BTreeSet;

/// Hydrates a lazy property, typically from the store
pub type Loader<T> = fn(&mut T) -> Result<Value>;

/// Writes a loaded lazy property back to the store
pub type Saver<T> = fn(&T) -> Result<()>;

/// Handler table for one lazy property
pub struct LazyHandlers<T> {
    pub(crate) load: Option<Loader<T>>,
    pub(crate) peek: Option<Getter<T>>,
    pub(crate) store: Option<Setter<T>>,
    pub(crate) persist: Option<Saver<T>>,
}

impl<T> LazyHandlers<T> {
    pub fn new() -> Self {
        Self {
            load: None,
            peek: None,
            store: None,
            persist: None,
        }
    }

    /// Getter hook, invoked by `LazyDomainObject::read`
    pub fn load(mut self, load: Loader<T>) -> Self {
        self.load = Some(load);
        self
    }

    /// Side-effect-free accessor for the in-memory value, used by
    /// `DomainObject::get`; never hydrates
    pub fn peek(mut self, peek: Getter<T>) -> Self {
        self.peek = Some(peek);
        self
    }

    /// Setter hook, invoked by `DomainObject::set`
    pub fn store(mut self, store: Setter<T>) -> Self {
        self.store = Some(store);
        self
    }

    /// Saver hook, invoked after the eager save for loaded properties only
    pub fn persist(mut self, persist: Saver<T>) -> Self {
        self.persist = Some(persist);
        self
    }
}

impl<T> Default for LazyHandlers<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Names of the lazy properties read so far on one instance
///
/// "Loaded" means the getter ran, not that it produced a value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LazyState {
    loaded: BTreeSet<&'static str>,
}

impl LazyState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_loaded(&self, name: &str) -> bool {
        self.loaded.contains(name)
    }

    pub fn set_loaded(&mut self, name: &'static str, loaded: bool) {
        if loaded {
            self.loaded.insert(name);
        } else {
            self.loaded.remove(name);
        }
    }

    /// Loaded names in sorted order
    pub fn loaded(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.loaded.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.loaded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }
}

/// Lazy-aware access on top of `DomainObject`
///
/// Implemented for every domain object; types that declare no lazy
/// properties behave exactly like plain domain objects.
pub trait LazyDomainObject: DomainObject {
    /// Read a property, hydrating it first if it is lazy
    ///
    /// The property is marked loaded before its getter runs, even if the
    /// getter returns `Value::Null` or fails. A lazy property without a
    /// getter reads as `Value::Null` and is not marked.
    fn read(&mut self, name: &str) -> Result<Value> {
        let schema = Self::schema();
        schema.ensure_valid()?;

        let Some(lazy) = schema.lazy_property(name) else {
            return Ok(self.get(name));
        };
        let Some(load) = lazy.handlers.load else {
            return Ok(Value::Null);
        };

        schema.load_state_mut(self)?.set_loaded(lazy.name, true);
        tracing::debug!(
            type_name = schema.type_name(),
            property = lazy.name,
            "Hydrating lazy property"
        );
        load(self).map_err(|e| e.with_property(lazy.name))
    }

    fn is_loaded(&self, name: &str) -> bool {
        Self::schema()
            .load_state(self)
            .is_some_and(|state| state.is_loaded(name))
    }

    /// Lazy properties read so far, in sorted order
    fn loaded_properties(&self) -> Vec<&'static str> {
        Self::schema()
            .load_state(self)
            .map(|state| state.loaded().collect())
            .unwrap_or_default()
    }

    /// Forget that a lazy property was read, so save no longer persists it
    fn mark_unloaded(&mut self, name: &str) -> Result<()> {
        let schema = Self::schema();
        if let Some(lazy) = schema.lazy_property(name) {
            schema.load_state_mut(self)?.set_loaded(lazy.name, false);
        }
        Ok(())
    }

    /// Invoke the saver of every loaded lazy property that has one
    ///
    /// Returns how many savers ran. Properties never read are skipped, so
    /// saving never forces a fetch of an untouched field.
    fn persist_loaded(&self) -> Result<usize> {
        let schema = Self::schema();
        let mut persisted = 0;
        for lazy in schema.lazy_properties() {
            if !self.is_loaded(lazy.name) {
                continue;
            }
            if let Some(persist) = lazy.handlers.persist {
                persist(self).map_err(|e| e.with_property(lazy.name))?;
                persisted += 1;
            }
        }
        Ok(persisted)
    }
}

impl<T: DomainObject> LazyDomainObject for T {}
