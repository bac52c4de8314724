// Boundary logging emitted by mapper operations

mod common;

use common::{seed_authors, setup_session, AuthorMapper, Book};
use datamapper_core::logging_facility::test_capture::init_test_capture;
use datamapper_core_types::schema::{EVENT_END, EVENT_END_ERROR, EVENT_START, FIELD_ERR_CODE};
use datamapper_store::{FindOptions, Mapper};

#[test]
fn test_mapper_operations_log_boundaries() {
    // Given: Test capture and a mapper over seeded rows
    let capture = init_test_capture();
    let session = setup_session();
    seed_authors(&session, 3);
    let mapper = AuthorMapper::from_session(session);

    // When: Get, find and a failing save run
    mapper.get(2).unwrap();
    let mut collection = mapper.find_all(FindOptions::default().lazy(true)).unwrap();
    collection.get_items(0, 2).unwrap();
    let mut book = Book::default();
    mapper.save(&mut book).unwrap_err();

    // Then: Each operation has its own start/end pair
    capture.assert_event_exists("mapper_get", EVENT_START);
    capture.assert_event_exists("mapper_get", EVENT_END);
    capture.assert_event_exists("mapper_find_by", EVENT_START);
    capture.assert_event_exists("mapper_find_by", EVENT_END);
    capture.assert_event_exists("mapper_save", EVENT_START);

    let errors: Vec<_> = capture
        .events_for("mapper_save")
        .into_iter()
        .filter(|e| e.event.as_deref() == Some(EVENT_END_ERROR))
        .collect();
    assert!(!errors.is_empty());
    assert_eq!(errors[0].field(FIELD_ERR_CODE), Some("ERR_VALIDATION"));

    // And: Collection windows never emit boundary events
    assert_eq!(
        capture.count_events(|e| e.event.is_some() && e.op.is_none()),
        0
    );
}
