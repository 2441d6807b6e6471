//! Advance, seek and the first-event window.

use std::cell::Cell;
use std::rc::Rc;

use tuplecursor_core::error::Error;
use tuplecursor_core::schema::{ColumnSpec, DataType, ScalarType, Schema};
use tuplecursor_core::value::Datum;
use tuplecursor_io::MemorySource;
use tuplecursor_reader::{CursorState, EventReader};

fn numbered(rows: i64) -> MemorySource {
    let schema = Schema::new(vec![ColumnSpec::new("n", DataType::Scalar(ScalarType::Int64))]);
    MemorySource::from_rows("numbered", schema, (0..rows).map(|i| vec![Datum::Int(i)])).unwrap()
}

#[test]
fn test_cursor_states() {
    let mut tr = EventReader::new(numbered(1));
    assert_eq!(tr.state(), CursorState::Ready);
    assert_eq!(tr.event_number(), 0);
    assert_eq!(tr.current_row(), None);
    assert!(tr.is_first_event());

    assert!(tr.next_event().unwrap());
    assert_eq!(tr.current_row(), Some(0));
    assert_eq!(tr.event_number(), 1);

    assert!(!tr.next_event().unwrap());
    assert_eq!(tr.state(), CursorState::Exhausted);
}

#[test]
fn test_seek_out_of_range() {
    let mut tr = EventReader::new(numbered(3));
    assert!(matches!(tr.go_to_event(-1), Err(Error::OutOfRange { row: -1, rows: 3 })));
    assert!(matches!(tr.go_to_event(3), Err(Error::OutOfRange { row: 3, .. })));
    assert_eq!(tr.rows_processed(), 0);
}

#[test]
fn test_seek_zero_is_first_event() {
    let mut tr = EventReader::new(numbered(3));
    assert!(tr.go_to_event(0).unwrap());
    assert!(tr.is_first_event());
    assert_eq!(*tr.get_var::<i64>("n").unwrap(), 0);
}

#[test]
fn test_seek_then_advance_continues() {
    let mut tr = EventReader::new(numbered(5));
    assert!(tr.go_to_event(3).unwrap());
    assert_eq!(*tr.get_var::<i64>("n").unwrap(), 3);
    assert!(tr.next_event().unwrap());
    assert_eq!(*tr.get_var::<i64>("n").unwrap(), 4);
    assert!(!tr.next_event().unwrap());
}

#[test]
fn test_empty_source() {
    let mut tr = EventReader::new(numbered(0));
    assert!(!tr.next_event().unwrap());
    assert!(tr.go_to_event(0).is_err());
}

#[test]
fn test_registration_closed_after_second_advance() {
    let mut tr = EventReader::new(numbered(3));
    tr.register_function(|_: &mut EventReader<MemorySource>| ()).unwrap();
    tr.next_event().unwrap();
    // still the first event: registration is allowed
    tr.register_function(|_: &mut EventReader<MemorySource>| ()).unwrap();
    tr.next_event().unwrap();

    let err = tr
        .register_function(|_: &mut EventReader<MemorySource>| ())
        .unwrap_err();
    assert!(matches!(err, Error::UsagePastInit(_)));
    assert_eq!(tr.function_count(), 2);
}

#[test]
fn test_disable_update_freezes_derived() {
    let mut tr = EventReader::new(numbered(3));
    let runs = Rc::new(Cell::new(0));
    let counter = runs.clone();
    tr.register_function(move |tr: &mut EventReader<MemorySource>| {
        counter.set(counter.get() + 1);
        let n = *tr.get_var::<i64>("n")?;
        tr.register_derived_var("twice", n * 2)
    })
    .unwrap();

    tr.next_event().unwrap();
    tr.next_event().unwrap();
    assert_eq!(*tr.get_var::<i64>("twice").unwrap(), 2);

    tr.disable_update();
    tr.next_event().unwrap();
    assert_eq!(*tr.get_var::<i64>("n").unwrap(), 2);
    assert_eq!(*tr.get_var::<i64>("twice").unwrap(), 2);
    assert_eq!(runs.get(), 2);
}
