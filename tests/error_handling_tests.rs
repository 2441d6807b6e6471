//! Error handling and context tests

use tuplecursor_core::error::Error;
use tuplecursor_core::schema::{ColumnSpec, DataType, ScalarType, Schema};
use tuplecursor_core::value::Datum;
use tuplecursor_io::MemorySource;
use tuplecursor_reader::EventReader;

#[test]
fn test_error_with_context() {
    let base_error = Error::DuplicateName("met".to_string());
    let contextual_error = base_error.with_context("while registering derived variables");

    match &contextual_error {
        Error::Context { context, .. } => {
            assert_eq!(context, "while registering derived variables");
        }
        _ => panic!("Expected Context variant"),
    }
    // suggestions see through the context wrapper
    assert!(contextual_error
        .suggestions()
        .iter()
        .any(|s| s.contains("shadow")));
}

#[test]
fn test_error_messages() {
    let e = Error::type_mismatch("met", "f64", "f32");
    assert_eq!(
        e.to_string(),
        "Variable not found: \"met\" with type \"f64\", but is found with type \"f32\""
    );
    let e = Error::OutOfRange { row: 5, rows: 3 };
    assert!(e.to_string().contains("out of range"));
}

#[test]
fn test_lookup_error_suggestions() {
    let not_found = Error::not_found("jets", "Vec<f32>");
    assert!(not_found.is_lookup_failure());
    assert!(not_found.suggestions().iter().any(|s| s.contains("prefix")));

    let mismatch = Error::type_mismatch("met", "f64", "f32");
    assert!(mismatch.suggestions().iter().any(|s| s.contains("f32")));
    assert!(!Error::UsagePastInit("x".into()).is_lookup_failure());
}

#[test]
fn test_source_failure_carries_row_context() {
    let schema = Schema::new(vec![ColumnSpec::new("n", DataType::Scalar(ScalarType::UInt8))]);
    let source = MemorySource::from_rows("narrow", schema, vec![vec![Datum::Int(300)]]).unwrap();
    let mut tr = EventReader::with_active_columns(source, ["n"]).unwrap();

    let err = tr.next_event().unwrap_err();
    match err {
        Error::Context { context, .. } => assert!(context.contains("event 0 of narrow")),
        other => panic!("Expected Context variant, got {:?}", other),
    }
    // a failed load leaves the cursor where it was
    assert_eq!(tr.rows_processed(), 0);
    assert_eq!(tr.current_row(), None);
}

#[test]
fn test_config_error_from_json() {
    let parsed: Result<tuplecursor_core::config::ReaderConfig, _> = serde_json::from_str("{\"rethrow\": 3}");
    let err: Error = parsed.unwrap_err().into();
    assert!(matches!(err, Error::Config(_)));
}
