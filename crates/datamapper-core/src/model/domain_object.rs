use super::schema::Schema;
use crate::errors::{DataMapperError, Result};
use crate::value::{PropertyMap, Value};

/// A mutable record with a fixed, named set of properties
///
/// Implementors are plain structs; the property names and field accessors
/// are declared once in `schema()`. Every name-based operation validates
/// against that registry.
///
/// ```
/// use datamapper_core::{DomainObject, Schema, Value};
/// use std::sync::OnceLock;
///
/// #[derive(Debug, Clone, Default)]
/// struct Tag {
///     id: Option<i64>,
///     label: String,
/// }
///
/// impl DomainObject for Tag {
///     fn schema() -> &'static Schema<Self> {
///         static SCHEMA: OnceLock<Schema<Tag>> = OnceLock::new();
///         SCHEMA.get_or_init(|| {
///             Schema::<Tag>::builder("Tag")
///                 .identity("id", |t| t.id.into(), |t, v| {
///                     t.id = v.extract()?;
///                     Ok(())
///                 })
///                 .property("label", |t| t.label.as_str().into(), |t, v| {
///                     t.label = v.extract()?;
///                     Ok(())
///                 })
///                 .build()
///         })
///     }
/// }
///
/// let mut tag = Tag::default();
/// tag.set("label", Value::from("rust")).unwrap();
/// assert_eq!(tag.get("label"), Value::from("rust"));
/// assert!(tag.set("colour", Value::from("red")).is_err());
/// assert_eq!(tag.get("colour"), Value::Null);
/// ```
pub trait DomainObject: Clone + Default + 'static {
    /// Property registry for this type, built once
    fn schema() -> &'static Schema<Self>;

    fn type_name(&self) -> &'static str {
        Self::schema().type_name()
    }

    /// Read a property's in-memory value
    ///
    /// Lazy names go through their `peek` accessor and are never hydrated;
    /// use `LazyDomainObject::read` to load them. Undeclared names, and lazy
    /// names without a `peek`, yield `Value::Null` rather than an error.
    fn get(&self, name: &str) -> Value {
        let schema = Self::schema();
        if let Some(lazy) = schema.lazy_property(name) {
            return lazy.handlers.peek.map(|peek| peek(self)).unwrap_or_default();
        }
        schema
            .property(name)
            .map(|p| (p.get)(self))
            .unwrap_or_default()
    }

    /// Write a declared property
    ///
    /// Lazy names are routed to the property's store hook; undeclared names
    /// fail with a validation error.
    fn set(&mut self, name: &str, value: Value) -> Result<()> {
        let schema = Self::schema();
        schema.ensure_valid()?;

        if let Some(lazy) = schema.lazy_property(name) {
            return match lazy.handlers.store {
                Some(store) => store(self, value).map_err(|e| e.with_property(lazy.name)),
                None => Err(DataMapperError::NoLazySetter {
                    type_name: schema.type_name().to_string(),
                    property: name.to_string(),
                }
                .into()),
            };
        }

        match schema.property(name) {
            Some(p) => (p.set)(self, value).map_err(|e| e.with_property(p.name)),
            None => Err(schema.undeclared(name)),
        }
    }

    /// Set every property in `data`
    ///
    /// All-or-nothing: if any key is undeclared or any value fails to
    /// convert, the object is left unchanged.
    fn populate(&mut self, data: &PropertyMap) -> Result<&mut Self> {
        let schema = Self::schema();
        schema.ensure_valid()?;

        if let Some(unknown) = data.keys().find(|k| !schema.is_declared(k)) {
            return Err(schema.undeclared(unknown).with_op("populate"));
        }

        let mut staged = self.clone();
        for (name, value) in data {
            staged
                .set(name, value.clone())
                .map_err(|e| e.with_op("populate"))?;
        }
        *self = staged;
        Ok(self)
    }

    /// Construct a fresh object from a property mapping
    fn from_map(data: &PropertyMap) -> Result<Self> {
        let mut object = Self::default();
        object.populate(data)?;
        Ok(object)
    }

    /// All eager properties; feeding this to `populate` reproduces the state
    fn to_map(&self) -> PropertyMap {
        Self::schema()
            .property_names()
            .map(|name| (name.to_string(), self.get(name)))
            .collect()
    }

    fn to_json(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self.to_map())?)
    }

    /// Identity value, or `None` for objects never saved
    fn id(&self) -> Option<Value> {
        Self::schema()
            .identity()
            .map(|name| self.get(name))
            .filter(|v| !v.is_null())
    }

    /// True if the eager property holds a non-null value, or the lazy
    /// property has been loaded (whatever it returned)
    fn is_set(&self, name: &str) -> bool {
        let schema = Self::schema();
        if schema.is_lazy(name) {
            return schema
                .load_state(self)
                .is_some_and(|state| state.is_loaded(name));
        }
        !self.get(name).is_null()
    }

    /// Reset an eager property to null; unknown names are ignored
    fn unset(&mut self, name: &str) -> Result<()> {
        if Self::schema().property(name).is_some() {
            self.set(name, Value::Null)?;
        }
        Ok(())
    }
}
