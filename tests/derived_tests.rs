//! Derived variables, payload ownership and the rethrow policy.

use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;

use tuplecursor_core::error::{Error, Result};
use tuplecursor_core::schema::{ColumnSpec, DataType, ScalarType, Schema};
use tuplecursor_core::value::Datum;
use tuplecursor_io::MemorySource;
use tuplecursor_reader::{EventReader, UpdateKey};

fn hits(rows: usize) -> MemorySource {
    let schema = Schema::new(vec![
        ColumnSpec::new("nhits", DataType::Scalar(ScalarType::UInt32)),
        ColumnSpec::new("energy", DataType::Vector(ScalarType::Float32)),
    ]);
    let data = (0..rows).map(|i| {
        let energies: Vec<f32> = (0..i).map(|j| j as f32 + 0.5).collect();
        vec![Datum::from(i as u32), Datum::from(energies)]
    });
    MemorySource::from_rows("hits", schema, data).unwrap()
}

/// Counts its own drops.
struct Tracked(Rc<Cell<usize>>);

impl Drop for Tracked {
    fn drop(&mut self) {
        self.0.set(self.0.get() + 1);
    }
}

#[test]
fn test_derived_scalar_follows_latest_event() {
    let mut tr = EventReader::new(hits(4));
    tr.register_function(|tr: &mut EventReader<MemorySource>| {
        let total: f32 = tr.get_vec::<f32>("energy")?.iter().sum();
        tr.register_derived_var("sum_e", total)
    })
    .unwrap();

    let mut sums = Vec::new();
    while tr.next_event().unwrap() {
        sums.push(*tr.get_var::<f32>("sum_e").unwrap());
    }
    assert_eq!(sums, vec![0.0, 0.5, 2.0, 4.5]);
    assert!(tr.tuple_specs("sum_e").contains(&"origin: derived".to_string()));
}

#[test]
fn test_derived_vector_frees_previous_payload() {
    let drops = Rc::new(Cell::new(0));
    let mut tr = EventReader::new(hits(3));
    let counter = drops.clone();
    tr.register_function(move |tr: &mut EventReader<MemorySource>| {
        let n = *tr.get_var::<u32>("nhits")? as usize;
        let payload: Vec<Tracked> = (0..n + 1).map(|_| Tracked(counter.clone())).collect();
        tr.register_derived_vec("tracked", Some(payload))
    })
    .unwrap();

    tr.next_event().unwrap(); // 1 element held
    assert_eq!(drops.get(), 0);
    tr.next_event().unwrap(); // 2 held, first 1 freed
    assert_eq!(drops.get(), 1);
    tr.next_event().unwrap(); // 3 held, previous 2 freed
    assert_eq!(drops.get(), 3);

    drop(tr);
    assert_eq!(drops.get(), 6);
}

#[test]
fn test_null_payload_clears_column() {
    let mut tr = EventReader::new(hits(2));
    tr.register_function(|tr: &mut EventReader<MemorySource>| {
        let payload = if tr.event_number() == 1 {
            Some(vec![1u16, 2, 3])
        } else {
            None
        };
        tr.register_derived_vec("maybe", payload)?;
        let mut m = BTreeMap::new();
        m.insert("k".to_string(), 1i8);
        tr.register_derived_vec("lookup", if tr.event_number() == 1 { Some(m) } else { None })
    })
    .unwrap();

    tr.next_event().unwrap();
    assert_eq!(tr.get_vec::<u16>("maybe").unwrap(), &[1, 2, 3]);
    tr.next_event().unwrap();
    assert!(tr.get_vec::<u16>("maybe").unwrap().is_empty());
    assert!(tr.get_map::<String, i8>("lookup").unwrap().is_empty());
}

#[test]
fn test_derived_cannot_shadow_source_column() {
    let mut tr = EventReader::new(hits(1));
    assert!(matches!(
        tr.register_derived_var("nhits", 3u32),
        Err(Error::DuplicateName(name)) if name == "nhits"
    ));
    assert!(matches!(
        tr.register_derived_vec("energy", Some(vec![1.0f32])),
        Err(Error::DuplicateName(_))
    ));
    tr.register_derived_var("flag", true).unwrap();
    assert!(matches!(
        tr.register_derived_vec("flag", Some(vec![true])),
        Err(Error::DuplicateName(_))
    ));
}

#[test]
fn test_rethrow_off_swallows_registration_errors() {
    let mut tr = EventReader::new(hits(3));
    tr.set_rethrow(false);
    assert!(!tr.rethrow());
    assert!(tr.register_derived_var("nhits", 1u32).is_ok());
    assert_eq!(tr.column_type("nhits").unwrap(), "u32");

    tr.register_function(|tr: &mut EventReader<MemorySource>| tr.get_var::<f64>("nhits").map(|_| ()))
        .unwrap();
    assert!(tr.next_event().unwrap());
    assert!(tr.next_event().unwrap());
    assert!(tr.register_function(|_: &mut EventReader<MemorySource>| ()).is_ok());
    assert_eq!(tr.function_count(), 1);
    // typed accessors report regardless of the policy
    assert!(tr.get_var::<f64>("nhits").is_err());
}

#[test]
fn test_privileged_update() {
    let mut tr = EventReader::new(hits(3));
    tr.register_privileged_function(|tr: &mut EventReader<MemorySource>, key: &UpdateKey| -> Result<()> {
        let n = *tr.get_var::<u32>("nhits")?;
        tr.update_var(key, "nhits", n * 100)?;
        if tr.is_first_event() {
            tr.update_var(key, "calibrated", true)?;
        }
        Ok(())
    })
    .unwrap();

    tr.next_event().unwrap();
    tr.next_event().unwrap();
    assert_eq!(*tr.get_var::<u32>("nhits").unwrap(), 100);
    assert!(*tr.get_var::<bool>("calibrated").unwrap());
    assert!(matches!(
        tr.register_privileged_function(|_: &mut EventReader<MemorySource>, _: &UpdateKey| ()),
        Err(Error::UsagePastInit(_))
    ));
}

#[test]
fn test_privileged_update_rejects_new_names_later() {
    let mut tr = EventReader::new(hits(2));
    tr.register_privileged_function(|tr: &mut EventReader<MemorySource>, key: &UpdateKey| -> Result<()> {
        if tr.event_number() == 2 {
            tr.update_var(key, "late", 1i32)?;
        }
        Ok(())
    })
    .unwrap();
    assert!(tr.next_event().unwrap());
    assert!(matches!(tr.next_event(), Err(Error::NotFound { .. })));
}

#[test]
fn test_privileged_update_checks_type() {
    let mut tr = EventReader::new(hits(1));
    tr.register_privileged_function(|tr: &mut EventReader<MemorySource>, key: &UpdateKey| {
        tr.update_var(key, "nhits", 1.0f64)
    })
    .unwrap();
    assert!(matches!(tr.next_event(), Err(Error::TypeMismatch { .. })));
}
