use datamapper_core::errors::{DataMapperError, ExError, ExErrorKind};

#[test]
fn test_undeclared_property_is_validation() {
    let err = DataMapperError::UndeclaredProperty {
        type_name: "Author".to_string(),
        property: "nickname".to_string(),
    };

    let ex_err: ExError = err.into();

    assert_eq!(ex_err.kind(), ExErrorKind::Validation);
    assert_eq!(ex_err.code(), "ERR_VALIDATION");
    assert_eq!(ex_err.entity(), Some("Author"));
    assert_eq!(ex_err.property(), Some("nickname"));
    assert!(ex_err.message().contains("Invalid property"));
}

#[test]
fn test_wrong_domain_type_is_validation() {
    let err = DataMapperError::WrongDomainType {
        expected: "Author".to_string(),
        actual: "Book".to_string(),
    };

    let ex_err: ExError = err.into();

    assert_eq!(ex_err.kind(), ExErrorKind::Validation);
    assert!(ex_err.message().contains("Author"));
    assert!(ex_err.message().contains("Book"));
}

#[test]
fn test_missing_configuration_is_configuration() {
    let err = DataMapperError::MissingConfiguration {
        subject: "AuthorMapper".to_string(),
        setting: "table",
    };

    let ex_err: ExError = err.into();

    assert_eq!(ex_err.kind(), ExErrorKind::Configuration);
    assert_eq!(ex_err.code(), "ERR_CONFIGURATION");
    assert_eq!(ex_err.message(), "table not defined for AuthorMapper");
}

#[test]
fn test_row_not_found_distinct_from_refresh_failed() {
    let err = DataMapperError::RowNotFound {
        table: "authors".to_string(),
        primary_key: "id".to_string(),
        id: "42".to_string(),
    };

    let ex_err: ExError = err.into();

    assert_eq!(ex_err.kind(), ExErrorKind::NotFound);
    assert_ne!(ex_err.kind(), ExErrorKind::RefreshFailed);
    assert_eq!(ex_err.entity(), Some("authors"));
}

#[test]
fn test_serde_json_error_is_serialization() {
    let parse_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();

    let ex_err: ExError = parse_err.into();

    assert_eq!(ex_err.kind(), ExErrorKind::Serialization);
    assert_eq!(ex_err.code(), "ERR_SERIALIZATION");
}

#[test]
fn test_error_kind_code_mapping() {
    let kinds = vec![
        (ExErrorKind::Configuration, "ERR_CONFIGURATION"),
        (ExErrorKind::Validation, "ERR_VALIDATION"),
        (ExErrorKind::NotFound, "ERR_NOT_FOUND"),
        (ExErrorKind::Persistence, "ERR_PERSISTENCE"),
        (ExErrorKind::RefreshFailed, "ERR_REFRESH_FAILED"),
        (ExErrorKind::Serialization, "ERR_SERIALIZATION"),
        (ExErrorKind::Internal, "ERR_INTERNAL"),
    ];

    for (kind, expected_code) in kinds {
        assert_eq!(kind.code(), expected_code);
    }
}
