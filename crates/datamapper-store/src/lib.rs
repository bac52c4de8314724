//! datamapper Store - SQLite-backed mappers and collections
//!
//! Provides:
//! - `Session`: injected connection handle, plus savepoint scoping for writes
//! - Query descriptors (`Select`, `Filter`, `Criteria`) rendered to SQL
//! - `Mapper` with static `MapperConfig` (table, primary key, column mapping)
//! - `Collection`: eager or windowed-lazy sequences of domain objects
//! - `ActiveObject` + `Binding` for object-level `save` / `delete`

pub mod active;
pub mod codec;
pub mod collection;
pub mod config;
pub mod db;
pub mod errors;
pub mod lazy_collection;
pub mod mapper;
pub mod query;
pub mod repo;

// Re-export key types
pub use active::{ActiveObject, Binding};
pub use collection::Collection;
pub use config::{ColumnTarget, MapperConfig};
pub use db::{Session, SessionOptions};
pub use errors::Result;
pub use lazy_collection::WindowStats;
pub use mapper::{FindOptions, Mapper};
pub use query::{criteria, Criteria, Criterion, Direction, Filter, Select};
