//! In-memory event source.
//!
//! Rows are stored as one `Datum` per schema column. Only columns that the
//! reader has both activated and bound are written on `load_row`.

use std::collections::HashSet;

use tuplecursor_core::error::{Error as CoreError, Result as CoreResult};
use tuplecursor_core::schema::{ColumnSpec, Schema};
use tuplecursor_core::source::{ColumnSink, EventSource};
use tuplecursor_core::value::{fill_cell, Datum};

use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct MemorySource {
    name: String,
    schema: Schema,
    rows: Vec<Vec<Datum>>,
    active: HashSet<String>,
    bound: HashSet<String>,
    cells_loaded: usize,
}

impl MemorySource {
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
            rows: Vec::new(),
            active: HashSet::new(),
            bound: HashSet::new(),
            cells_loaded: 0,
        }
    }

    pub fn from_rows(
        name: impl Into<String>,
        schema: Schema,
        rows: impl IntoIterator<Item = Vec<Datum>>,
    ) -> Result<Self> {
        let mut src = Self::new(name, schema);
        for row in rows {
            src.push_row(row)?;
        }
        Ok(src)
    }

    /// Append a row; it must have one datum per schema column.
    pub fn push_row(&mut self, row: Vec<Datum>) -> Result<()> {
        if row.len() != self.schema.columns.len() {
            return Err(Error::Row {
                line: self.rows.len() + 1,
                message: format!(
                    "expected {} values, got {}",
                    self.schema.columns.len(),
                    row.len()
                ),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.active.contains(name)
    }

    pub fn is_bound(&self, name: &str) -> bool {
        self.bound.contains(name)
    }

    /// Number of cells written so far, across all rows and columns.
    pub fn cells_loaded(&self) -> usize {
        self.cells_loaded
    }

    fn require(&self, name: &str) -> CoreResult<()> {
        match self.schema.index_of(name) {
            Some(_) => Ok(()),
            None => Err(CoreError::Source(format!(
                "{}: no column named '{}'",
                self.name, name
            ))),
        }
    }

    fn deliver(&mut self, idx: usize, row: usize, sink: &mut dyn ColumnSink) -> CoreResult<()> {
        let spec = &self.schema.columns[idx];
        let cell = sink.cell_mut(&spec.name).ok_or_else(|| {
            CoreError::Source(format!("column '{}' is bound but has no cell", spec.name))
        })?;
        fill_cell(&spec.data_type, &self.rows[row][idx], cell)
            .map_err(|e| e.with_context(format!("{} row {} column '{}'", self.name, row, spec.name)))?;
        self.cells_loaded += 1;
        Ok(())
    }
}

impl EventSource for MemorySource {
    fn columns(&self) -> Vec<ColumnSpec> {
        self.schema.columns.clone()
    }

    fn find_column(&self, name: &str) -> Option<ColumnSpec> {
        self.schema.column(name).cloned()
    }

    fn set_active(&mut self, name: &str) -> CoreResult<()> {
        self.require(name)?;
        self.active.insert(name.to_string());
        Ok(())
    }

    fn bind(&mut self, name: &str) -> CoreResult<()> {
        self.require(name)?;
        self.bound.insert(name.to_string());
        Ok(())
    }

    fn load_row(&mut self, row: usize, sink: &mut dyn ColumnSink) -> CoreResult<bool> {
        if row >= self.rows.len() {
            return Ok(false);
        }
        for idx in 0..self.schema.columns.len() {
            let name = &self.schema.columns[idx].name;
            if self.active.contains(name) && self.bound.contains(name) {
                self.deliver(idx, row, sink)?;
            }
        }
        Ok(true)
    }

    fn load_column(&mut self, name: &str, row: usize, sink: &mut dyn ColumnSink) -> CoreResult<bool> {
        if row >= self.rows.len() {
            return Ok(false);
        }
        let idx = self.schema.index_of(name).ok_or_else(|| {
            CoreError::Source(format!("{}: no column named '{}'", self.name, name))
        })?;
        self.deliver(idx, row, sink)?;
        Ok(true)
    }

    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn file_name(&self) -> String {
        self.name.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::any::Any;
    use std::collections::HashMap;
    use tuplecursor_core::schema::{DataType, ScalarType};

    #[derive(Default)]
    struct Cells(HashMap<String, Box<dyn Any>>);

    impl ColumnSink for Cells {
        fn cell_mut(&mut self, name: &str) -> Option<&mut (dyn Any + 'static)> {
            self.0.get_mut(name).map(|b| b.as_mut())
        }
    }

    fn source() -> MemorySource {
        let schema = Schema::new(vec![
            ColumnSpec::new("a", DataType::Scalar(ScalarType::Int32)),
            ColumnSpec::new("b", DataType::Scalar(ScalarType::Float64)),
        ]);
        MemorySource::from_rows(
            "mem",
            schema,
            vec![vec![Datum::Int(1), Datum::Float(0.5)], vec![Datum::Int(2), Datum::Float(1.5)]],
        )
        .unwrap()
    }

    #[test]
    fn loads_only_active_bound_columns() {
        let mut src = source();
        let mut cells = Cells::default();
        cells.0.insert("a".into(), Box::new(0i32));
        src.set_active("a").unwrap();
        src.bind("a").unwrap();
        assert!(src.load_row(1, &mut cells).unwrap());
        assert_eq!(cells.0["a"].downcast_ref::<i32>(), Some(&2));
        assert_eq!(src.cells_loaded(), 1);
        assert!(!src.load_row(2, &mut cells).unwrap());
    }

    #[test]
    fn rejects_short_rows_and_unknown_columns() {
        let mut src = source();
        assert!(src.push_row(vec![Datum::Int(3)]).is_err());
        assert!(src.set_active("zzz").is_err());
    }
}
