use thiserror::Error;

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code that can be used for programmatic
/// error handling and testing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    /// Mapper or schema is missing required static configuration
    Configuration,
    /// Undeclared property, wrong domain type, or value of the wrong shape
    Validation,
    /// A row addressed by identity does not exist
    NotFound,
    /// The underlying store rejected or failed an operation
    Persistence,
    /// The write succeeded but the row could not be re-read; the write was rolled back
    RefreshFailed,
    Serialization,
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::Configuration => "ERR_CONFIGURATION",
            ExErrorKind::Validation => "ERR_VALIDATION",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::Persistence => "ERR_PERSISTENCE",
            ExErrorKind::RefreshFailed => "ERR_REFRESH_FAILED",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries a classification kind for programmatic handling and optional
/// context (operation, entity, property) for debugging.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity: Option<String>,
    property: Option<String>,
    message: String,
    source: Option<Box<ExError>>,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity: None,
            property: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity context (a table or domain type name)
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    /// Add property context
    pub fn with_property(mut self, property: impl Into<String>) -> Self {
        self.property = Some(property.into());
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: ExError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Get the error kind
    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn entity(&self) -> Option<&str> {
        self.entity.as_deref()
    }

    pub fn property(&self) -> Option<&str> {
        self.property.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the source error, if any
    pub fn source_error(&self) -> Option<&ExError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity) = &self.entity {
            write!(f, " (entity: {})", entity)?;
        }
        if let Some(property) = &self.property {
            write!(f, " (property: {})", property)?;
        }
        if let Some(source) = &self.source {
            write!(f, " caused by {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|s| s as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Error taxonomy for object model and mapper operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataMapperError {
    /// Property name is not declared by the domain type
    #[error("Invalid property \"{property}\" for {type_name}")]
    UndeclaredProperty { type_name: String, property: String },

    /// Object passed to a mapper or collection is of another domain type
    #[error("Expected instance of \"{expected}\", got \"{actual}\"")]
    WrongDomainType { expected: String, actual: String },

    /// Value cannot be converted into the property's field type
    #[error("Expected {expected} value, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    /// Lazy property has no setter hook registered
    #[error("No setter exists for lazy property \"{property}\" of {type_name}")]
    NoLazySetter { type_name: String, property: String },

    /// Required static configuration is absent
    #[error("{setting} not defined for {subject}")]
    MissingConfiguration {
        subject: String,
        setting: &'static str,
    },

    /// Static configuration is present but inconsistent
    #[error("Invalid configuration for {subject}: {reason}")]
    InvalidConfiguration { subject: String, reason: String },

    /// No row exists for the given identity
    #[error("No row in {table} with {primary_key} = {id}")]
    RowNotFound {
        table: String,
        primary_key: String,
        id: String,
    },

    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl From<DataMapperError> for ExError {
    fn from(err: DataMapperError) -> Self {
        let message = err.to_string();
        match err {
            DataMapperError::UndeclaredProperty {
                type_name,
                property,
            } => ExError::new(ExErrorKind::Validation)
                .with_entity(type_name)
                .with_property(property)
                .with_message(message),

            DataMapperError::WrongDomainType { expected, .. } => {
                ExError::new(ExErrorKind::Validation)
                    .with_entity(expected)
                    .with_message(message)
            }

            DataMapperError::TypeMismatch { .. } => {
                ExError::new(ExErrorKind::Validation).with_message(message)
            }

            DataMapperError::NoLazySetter {
                type_name,
                property,
            } => ExError::new(ExErrorKind::Validation)
                .with_entity(type_name)
                .with_property(property)
                .with_message(message),

            DataMapperError::MissingConfiguration { subject, .. }
            | DataMapperError::InvalidConfiguration { subject, .. } => {
                ExError::new(ExErrorKind::Configuration)
                    .with_entity(subject)
                    .with_message(message)
            }

            DataMapperError::RowNotFound { table, .. } => ExError::new(ExErrorKind::NotFound)
                .with_entity(table)
                .with_message(message),

            DataMapperError::Serialization { .. } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }
        }
    }
}

impl From<serde_json::Error> for DataMapperError {
    fn from(err: serde_json::Error) -> Self {
        DataMapperError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for ExError {
    fn from(err: serde_json::Error) -> Self {
        DataMapperError::from(err).into()
    }
}
