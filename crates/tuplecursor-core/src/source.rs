//! The narrow seam to the storage engine that actually streams row data.
//!
//! The reader never reads files itself. It asks an [`EventSource`] what
//! columns exist, tells it which ones are in use, and asks it to deliver a
//! row into the cells it has bound through a [`ColumnSink`].

use std::any::Any;

use crate::error::Result;
use crate::schema::ColumnSpec;

/// Where a source delivers values: one attached cell per bound column name.
pub trait ColumnSink {
    fn cell_mut(&mut self, name: &str) -> Option<&mut (dyn Any + 'static)>;
}

/// Interface every event source implements.
///
/// Invariants:
/// - `columns()` is stable for the lifetime of the source.
/// - `load_row` fills only columns that are both active and bound.
/// - Rows are addressed `0..row_count()`; loading outside that range
///   returns `Ok(false)` and leaves the cells untouched.
pub trait EventSource {
    /// Every column the source can deliver.
    fn columns(&self) -> Vec<ColumnSpec>;

    fn find_column(&self, name: &str) -> Option<ColumnSpec> {
        self.columns().into_iter().find(|c| c.name == name)
    }

    /// Enable reading of a column.
    fn set_active(&mut self, name: &str) -> Result<()>;

    /// Record that the sink holds a cell for `name`.
    fn bind(&mut self, name: &str) -> Result<()>;

    /// Load `row` into every active, bound column.
    fn load_row(&mut self, row: usize, sink: &mut dyn ColumnSink) -> Result<bool>;

    /// Load `row` into one column only.
    fn load_column(&mut self, name: &str, row: usize, sink: &mut dyn ColumnSink) -> Result<bool>;

    fn row_count(&self) -> usize;

    /// Identifier of the file currently being read, for diagnostics.
    fn file_name(&self) -> String;
}

impl<S: EventSource + ?Sized> EventSource for Box<S> {
    fn columns(&self) -> Vec<ColumnSpec> {
        (**self).columns()
    }

    fn find_column(&self, name: &str) -> Option<ColumnSpec> {
        (**self).find_column(name)
    }

    fn set_active(&mut self, name: &str) -> Result<()> {
        (**self).set_active(name)
    }

    fn bind(&mut self, name: &str) -> Result<()> {
        (**self).bind(name)
    }

    fn load_row(&mut self, row: usize, sink: &mut dyn ColumnSink) -> Result<bool> {
        (**self).load_row(row, sink)
    }

    fn load_column(&mut self, name: &str, row: usize, sink: &mut dyn ColumnSink) -> Result<bool> {
        (**self).load_column(name, row, sink)
    }

    fn row_count(&self) -> usize {
        (**self).row_count()
    }

    fn file_name(&self) -> String {
        (**self).file_name()
    }
}
