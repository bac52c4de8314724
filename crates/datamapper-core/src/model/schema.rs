//! Property registry for a domain type
//!
//! A `Schema` is built once per domain type and maps each declared property
//! name to a pair of field accessors. Name validation happens against this
//! registry, so a domain type is a plain struct with typed fields rather than
//! a dynamic bag of values.

use super::lazy::{LazyHandlers, LazyState};
use crate::errors::{DataMapperError, ExError, Result};
use crate::value::Value;

/// Reads one property out of the record
pub type Getter<T> = fn(&T) -> Value;

/// Writes one property into the record, converting the value to the field type
pub type Setter<T> = fn(&mut T, Value) -> Result<()>;

pub(crate) struct Property<T> {
    pub(crate) name: &'static str,
    pub(crate) get: Getter<T>,
    pub(crate) set: Setter<T>,
}

pub(crate) struct LazyProperty<T> {
    pub(crate) name: &'static str,
    pub(crate) handlers: LazyHandlers<T>,
}

struct LoadTracker<T> {
    get: fn(&T) -> &LazyState,
    get_mut: fn(&mut T) -> &mut LazyState,
}

/// Registry of the properties declared by a domain type
pub struct Schema<T> {
    type_name: &'static str,
    identity: Option<&'static str>,
    properties: Vec<Property<T>>,
    lazy: Vec<LazyProperty<T>>,
    tracker: Option<LoadTracker<T>>,
    defect: Option<String>,
}

impl<T> Schema<T> {
    /// Start building a schema for the named domain type
    pub fn builder(type_name: &'static str) -> SchemaBuilder<T> {
        SchemaBuilder {
            schema: Schema {
                type_name,
                identity: None,
                properties: Vec::new(),
                lazy: Vec::new(),
                tracker: None,
                defect: None,
            },
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Name of the property holding the object's identity
    pub fn identity(&self) -> Option<&'static str> {
        self.identity
    }

    /// Eager property names, in declaration order
    pub fn property_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.properties.iter().map(|p| p.name)
    }

    /// Lazy property names, in declaration order
    pub fn lazy_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.lazy.iter().map(|p| p.name)
    }

    pub fn is_lazy(&self, name: &str) -> bool {
        self.lazy_property(name).is_some()
    }

    /// True if `name` is declared, eagerly or lazily
    pub fn is_declared(&self, name: &str) -> bool {
        self.property(name).is_some() || self.is_lazy(name)
    }

    /// Fails with a configuration error if the declarations are inconsistent
    pub fn ensure_valid(&self) -> Result<()> {
        match &self.defect {
            Some(reason) => Err(DataMapperError::InvalidConfiguration {
                subject: self.type_name.to_string(),
                reason: reason.clone(),
            }
            .into()),
            None => Ok(()),
        }
    }

    pub(crate) fn property(&self, name: &str) -> Option<&Property<T>> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub(crate) fn lazy_property(&self, name: &str) -> Option<&LazyProperty<T>> {
        self.lazy.iter().find(|p| p.name == name)
    }

    pub(crate) fn lazy_properties(&self) -> &[LazyProperty<T>] {
        &self.lazy
    }

    pub(crate) fn load_state<'a>(&self, object: &'a T) -> Option<&'a LazyState> {
        self.tracker.as_ref().map(|t| (t.get)(object))
    }

    pub(crate) fn load_state_mut<'a>(&self, object: &'a mut T) -> Result<&'a mut LazyState> {
        match &self.tracker {
            Some(t) => Ok((t.get_mut)(object)),
            None => Err(self.missing("load tracker")),
        }
    }

    pub(crate) fn undeclared(&self, name: &str) -> ExError {
        DataMapperError::UndeclaredProperty {
            type_name: self.type_name.to_string(),
            property: name.to_string(),
        }
        .into()
    }

    fn missing(&self, setting: &'static str) -> ExError {
        DataMapperError::MissingConfiguration {
            subject: self.type_name.to_string(),
            setting,
        }
        .into()
    }
}

/// Builder for `Schema`
///
/// Inconsistent declarations do not panic; they are recorded and reported as
/// a configuration error the first time the schema is used.
pub struct SchemaBuilder<T> {
    schema: Schema<T>,
}

impl<T> SchemaBuilder<T> {
    /// Declare the identity property (also an ordinary eager property)
    pub fn identity(mut self, name: &'static str, get: Getter<T>, set: Setter<T>) -> Self {
        if self.schema.identity.is_some() {
            self.flag(format!("identity declared twice (second: {})", name));
        }
        self.schema.identity = Some(name);
        self.property(name, get, set)
    }

    /// Declare an eager property
    pub fn property(mut self, name: &'static str, get: Getter<T>, set: Setter<T>) -> Self {
        if self.schema.is_declared(name) {
            self.flag(format!("property {} declared twice", name));
        }
        self.schema.properties.push(Property { name, get, set });
        self
    }

    /// Declare a lazy property with its handler table
    pub fn lazy(mut self, name: &'static str, handlers: LazyHandlers<T>) -> Self {
        if self.schema.is_declared(name) {
            self.flag(format!("lazy property {} overlaps a declared property", name));
        }
        self.schema.lazy.push(LazyProperty { name, handlers });
        self
    }

    /// Register where the record keeps its set of loaded lazy properties
    pub fn track_loaded(
        mut self,
        get: fn(&T) -> &LazyState,
        get_mut: fn(&mut T) -> &mut LazyState,
    ) -> Self {
        self.schema.tracker = Some(LoadTracker { get, get_mut });
        self
    }

    pub fn build(mut self) -> Schema<T> {
        if self.schema.identity.is_none() {
            self.flag("identity not defined".to_string());
        }
        if !self.schema.lazy.is_empty() && self.schema.tracker.is_none() {
            self.flag("lazy properties declared without a load tracker".to_string());
        }
        self.schema
    }

    // Keep the first defect; later ones are usually consequences of it.
    fn flag(&mut self, reason: String) {
        if self.schema.defect.is_none() {
            self.schema.defect = Some(reason);
        }
    }
}
