//! Error handling for datamapper-store
//!
//! Wraps datamapper-core ExError with store-specific helpers

use datamapper_core::errors::{DataMapperError, ExError, ExErrorKind};
use datamapper_core::Value;

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create a database error from rusqlite::Error
pub fn from_rusqlite(err: rusqlite::Error) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("sqlite")
        .with_message(err.to_string())
}

/// Create a missing-row error for an identity lookup that had to succeed
pub fn row_not_found(table: &str, primary_key: &str, id: &Value) -> ExError {
    DataMapperError::RowNotFound {
        table: table.to_string(),
        primary_key: primary_key.to_string(),
        id: id.display(),
    }
    .into()
}

/// Wrap the failure of the post-write re-read
pub fn refresh_failed(table: &str, id: &Value, cause: ExError) -> ExError {
    ExError::new(ExErrorKind::RefreshFailed)
        .with_op("mapper_save")
        .with_entity(table)
        .with_message(format!(
            "Row {} was written but could not be re-read; write rolled back",
            id.display()
        ))
        .with_source(cause)
}

/// Create an error for an object handed to a mapper of another domain type
pub fn wrong_domain_type(expected: &str, actual: &str) -> ExError {
    DataMapperError::WrongDomainType {
        expected: expected.to_string(),
        actual: actual.to_string(),
    }
    .into()
}

/// Create an error for an object with no session to persist through
pub fn unbound(type_name: &str) -> ExError {
    DataMapperError::MissingConfiguration {
        subject: type_name.to_string(),
        setting: "session",
    }
    .into()
}
