//! Lazy attachment of source columns.
//!
//! Columns the source declares are *known* from construction on, but storage
//! is only allocated, activated and bound the first time something asks for
//! them. A column attached mid-event is loaded for the current row at once.

use tuplecursor_core::error::Result;
use tuplecursor_core::handle::ColumnHandle;
use tuplecursor_core::source::EventSource;

use crate::reader::EventReader;

impl<S: EventSource + 'static> EventReader<S> {
    /// Attach storage for a source column. `Ok(false)` when the source has no
    /// column of that name; attaching twice is a no-op.
    pub(crate) fn attach_source_column(&mut self, name: &str) -> Result<bool> {
        if self.store.is_attached(name) {
            return Ok(true);
        }
        let Some(spec) = self.source.find_column(name) else {
            return Ok(false);
        };
        let handle = ColumnHandle::allocate(&spec.data_type)
            .map_err(|e| e.with_context(format!("attaching column '{}'", name)))?;
        // the store only takes the handle once the source will fill it
        self.source.set_active(name)?;
        self.source.bind(name)?;
        self.store.insert(name, handle);
        if let Some(row) = self.cursor.current_row() {
            self.source.load_column(name, row, &mut self.store)?;
        }
        tracing::debug!(
            column = name,
            ty = %spec.data_type,
            file = %self.source.file_name(),
            "attached column"
        );
        Ok(true)
    }

    /// Attach `name` if it is known but not yet attached.
    pub(crate) fn ensure_attached(&mut self, name: &str) -> Result<()> {
        if self.store.has(name) && !self.store.is_attached(name) {
            self.attach_source_column(name)?;
        }
        Ok(())
    }

    /// Attach column `name` (after alias and prefix resolution) now rather
    /// than on first typed access.
    pub fn activate(&mut self, name: &str) -> Result<bool> {
        let resolved = self.resolve_name(name);
        self.attach_source_column(&resolved)
    }

    /// Number of columns with allocated storage, source or derived.
    pub fn attached_count(&self) -> usize {
        self.store.attached_count()
    }

    pub fn is_attached(&self, name: &str) -> bool {
        self.store.is_attached(&self.resolve_name(name))
    }
}

#[cfg(test)]
mod tests {
    use tuplecursor_core::error::{Error, Result};
    use tuplecursor_core::schema::{ColumnSpec, DataType, ScalarType, Schema};
    use tuplecursor_core::source::{ColumnSink, EventSource};
    use tuplecursor_core::value::Datum;
    use tuplecursor_io::MemorySource;

    use crate::EventReader;

    fn source() -> MemorySource {
        let schema = Schema::new(vec![
            ColumnSpec::new("a", DataType::Scalar(ScalarType::Int32)),
            ColumnSpec::new("b", DataType::Vector(ScalarType::Float64)),
        ]);
        MemorySource::from_rows(
            "mem",
            schema,
            vec![
                vec![Datum::Int(1), Datum::from(vec![0.5])],
                vec![Datum::Int(2), Datum::from(vec![1.5, 2.5])],
            ],
        )
        .unwrap()
    }

    #[test]
    fn columns_attach_on_first_use() {
        let mut tr = EventReader::new(source());
        assert!(tr.has_var("a"));
        assert!(!tr.is_attached("a"));
        assert_eq!(tr.attached_count(), 0);

        assert!(tr.next_event().unwrap());
        assert_eq!(tr.source().cells_loaded(), 0);
        assert_eq!(*tr.get_var::<i32>("a").unwrap(), 1);
        assert!(tr.is_attached("a"));
        assert!(!tr.is_attached("b"));
        assert!(tr.source().is_active("a") && tr.source().is_bound("a"));

        assert!(tr.next_event().unwrap());
        assert_eq!(*tr.get_var::<i32>("a").unwrap(), 2);
        // one cell for the mid-event attach, one for the second row
        assert_eq!(tr.source().cells_loaded(), 2);
    }

    #[test]
    fn active_set_attaches_up_front() {
        let tr = EventReader::with_active_columns(source(), ["b", "nope"]).unwrap();
        assert!(tr.is_attached("b"));
        assert!(!tr.is_attached("a"));
        assert!(!tr.has_var("nope"));
    }

    /// Refuses to bind column `b`.
    struct NoBindB(MemorySource);

    impl EventSource for NoBindB {
        fn columns(&self) -> Vec<ColumnSpec> {
            self.0.columns()
        }
        fn set_active(&mut self, name: &str) -> Result<()> {
            self.0.set_active(name)
        }
        fn bind(&mut self, name: &str) -> Result<()> {
            if name == "b" {
                return Err(Error::Source("b cannot be bound".into()));
            }
            self.0.bind(name)
        }
        fn load_row(&mut self, row: usize, sink: &mut dyn ColumnSink) -> Result<bool> {
            self.0.load_row(row, sink)
        }
        fn load_column(&mut self, name: &str, row: usize, sink: &mut dyn ColumnSink) -> Result<bool> {
            self.0.load_column(name, row, sink)
        }
        fn row_count(&self) -> usize {
            self.0.row_count()
        }
        fn file_name(&self) -> String {
            self.0.file_name()
        }
    }

    #[test]
    fn failed_bind_leaves_column_unattached() {
        let mut tr = EventReader::new(NoBindB(source()));
        assert!(tr.next_event().unwrap());
        assert!(tr.get_vec::<f64>("b").is_err());
        assert!(!tr.is_attached("b"));
        assert_eq!(tr.attached_count(), 0);
        // still known, and every later access reports the failure again
        assert!(tr.has_var("b"));
        assert!(matches!(tr.get_vec::<f64>("b"), Err(Error::Source(_))));
        assert_eq!(*tr.get_var::<i32>("a").unwrap(), 1);
    }
}
