//! Object-level persistence
//!
//! A domain object that can save and delete itself carries a `Binding`: the
//! session it was loaded through, and the mapper built from that session the
//! first time the object needs one. Lazy property loaders may read through a
//! separate session (e.g. a read replica) set with `with_lazy_session`.

#![allow(clippy::result_large_err)]

use crate::db::Session;
use crate::errors::{unbound, Result};
use crate::mapper::Mapper;
use datamapper_core::{DomainObject, LazyDomainObject};
use std::cell::OnceCell;
use std::fmt;
use std::rc::Rc;

/// Session plus lazily resolved mapper, stored on each domain object
///
/// Clones share the resolved mapper. The default binding is unbound.
pub struct Binding<M> {
    session: Option<Session>,
    lazy_session: Option<Session>,
    mapper: OnceCell<Rc<M>>,
}

impl<M: Mapper> Binding<M> {
    pub fn new(session: Session) -> Self {
        Self {
            session: Some(session),
            lazy_session: None,
            mapper: OnceCell::new(),
        }
    }

    /// Route lazy property loads through `session` instead of the bound one
    pub fn with_lazy_session(mut self, session: Session) -> Self {
        self.lazy_session = Some(session);
        self
    }

    pub fn is_bound(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Result<&Session> {
        self.session
            .as_ref()
            .ok_or_else(|| unbound(M::config().name()))
    }

    /// Session for lazy property loaders; the bound session unless overridden
    pub fn lazy_session(&self) -> Result<&Session> {
        match &self.lazy_session {
            Some(session) => Ok(session),
            None => self.session(),
        }
    }

    /// Mapper for this object, constructed once from the session
    pub fn mapper(&self) -> Result<Rc<M>> {
        let session = self.session()?;
        Ok(self
            .mapper
            .get_or_init(|| Rc::new(M::from_session(session.clone())))
            .clone())
    }

    pub fn is_resolved(&self) -> bool {
        self.mapper.get().is_some()
    }
}

impl<M> Default for Binding<M> {
    fn default() -> Self {
        Self {
            session: None,
            lazy_session: None,
            mapper: OnceCell::new(),
        }
    }
}

impl<M> Clone for Binding<M> {
    fn clone(&self) -> Self {
        let mapper = OnceCell::new();
        if let Some(resolved) = self.mapper.get() {
            let _ = mapper.set(resolved.clone());
        }
        Self {
            session: self.session.clone(),
            lazy_session: self.lazy_session.clone(),
            mapper,
        }
    }
}

impl<M> fmt::Debug for Binding<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("bound", &self.session.is_some())
            .field("lazy_session", &self.lazy_session.is_some())
            .field("resolved", &self.mapper.get().is_some())
            .finish()
    }
}

/// A domain object that persists itself through its mapper
pub trait ActiveObject: DomainObject {
    type Mapper: Mapper;

    fn binding(&self) -> &Binding<Self::Mapper>;

    fn binding_mut(&mut self) -> &mut Binding<Self::Mapper>;

    /// Attach the object to a session so it can be saved
    fn bind(&mut self, session: Session) -> &mut Self {
        *self.binding_mut() = Binding::new(session);
        self
    }

    /// Load lazy properties through `session` from now on
    fn use_lazy_session(&mut self, session: Session) -> &mut Self {
        let binding = std::mem::take(self.binding_mut());
        *self.binding_mut() = binding.with_lazy_session(session);
        self
    }

    /// Save eager properties through the mapper, then persist every lazy
    /// property that was read
    fn save(&mut self) -> Result<&mut Self> {
        let mapper = self.binding().mapper()?;
        mapper.save(self)?;
        let persisted = self.persist_loaded()?;
        tracing::debug!(
            type_name = self.type_name(),
            lazy_persisted = persisted,
            "Saved object"
        );
        Ok(self)
    }

    /// Delete through the mapper; a no-op unless the mapper enables deletion
    fn delete(&self) -> Result<()> {
        self.binding().mapper()?.delete(self)
    }
}
