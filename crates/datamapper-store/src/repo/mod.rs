//! Repository layer: statement execution against a connection

pub mod sqlite_repo;

pub use sqlite_repo::SqliteRepo;
