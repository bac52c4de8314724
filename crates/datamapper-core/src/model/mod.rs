//! Object model: property registries, domain objects, lazy properties

pub mod domain_object;
pub mod lazy;
pub mod schema;

pub use domain_object::DomainObject;
pub use lazy::{LazyDomainObject, LazyHandlers, LazyState, Loader, Saver};
pub use schema::{Getter, Schema, SchemaBuilder, Setter};
