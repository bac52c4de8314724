//! datamapper Core - store-independent object model
//!
//! This crate provides the in-memory half of the data mapper:
//! - Structured error facility (`ExError`, `ExErrorKind`, `DataMapperError`)
//! - Structured logging facility with boundary macros and test capture
//! - Scalar `Value` type and the property/row mappings built from it
//! - Property registries (`Schema`) replacing name-string reflection
//! - `DomainObject` with validated get/set/populate and lazy-property tracking
//!
//! Persistence (sessions, mappers, collections) lives in `datamapper-store`.

pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod value;

// Re-export commonly used types
pub use errors::{DataMapperError, ExError, ExErrorKind, Result};
pub use model::{
    DomainObject, LazyDomainObject, LazyHandlers, LazyState, Schema, SchemaBuilder,
};
pub use value::{FromValue, PropertyMap, RawRow, Value};
