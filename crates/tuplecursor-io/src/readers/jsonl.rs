//! NDJSON reader → `MemorySource`.
//!
//! Each non-blank line is one event, a JSON object keyed by column name.
//! Keys missing from a line load as null (the element type's default).
//! Arrays map to vector columns, objects to map columns.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};

use serde_json::Value;
use tuplecursor_core::schema::{DataType, ScalarType, Schema};
use tuplecursor_core::value::Datum;

use crate::error::{Error, Result};
use crate::memory::MemorySource;

pub struct JsonlReader<R: Read> {
    reader: BufReader<R>,
    schema: Schema,
    line: usize,
}

impl JsonlReader<File> {
    pub fn from_path(path: &str, schema: Schema) -> Result<Self> {
        let f = File::open(path)?;
        Ok(Self::from_reader(f, schema))
    }
}

impl<R: Read> JsonlReader<R> {
    pub fn from_reader(reader: R, schema: Schema) -> Self {
        Self {
            reader: BufReader::new(reader),
            schema,
            line: 0,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Next event as one datum per schema column; `None` at end of input.
    pub fn next_row(&mut self) -> Result<Option<Vec<Datum>>> {
        loop {
            let mut s = String::new();
            let n = self.reader.read_line(&mut s)?;
            if n == 0 {
                return Ok(None);
            }
            self.line += 1;
            if s.trim().is_empty() {
                continue;
            }
            let v: Value = serde_json::from_str(&s)?;
            let Value::Object(map) = v else {
                return Err(Error::Row {
                    line: self.line,
                    message: "expected a JSON object".into(),
                });
            };
            let row = self
                .schema
                .columns
                .iter()
                .map(|c| to_datum(map.get(&c.name).unwrap_or(&Value::Null), &c.data_type))
                .collect();
            return Ok(Some(row));
        }
    }

    /// Read every remaining event.
    pub fn into_source(mut self, name: impl Into<String>) -> Result<MemorySource> {
        let name = name.into();
        let mut src = MemorySource::new(name.clone(), self.schema.clone());
        let mut rows = 0usize;
        while let Some(row) = self.next_row()? {
            src.push_row(row)?;
            rows += 1;
        }
        tracing::debug!(source = %name, rows, "loaded JSONL rows");
        Ok(src)
    }
}

fn to_datum(v: &Value, data_type: &DataType) -> Datum {
    match v {
        Value::Null => Datum::Null,
        Value::Bool(b) => Datum::Bool(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Datum::Int(i)
            } else if let Some(u) = n.as_u64() {
                Datum::UInt(u)
            } else {
                Datum::Float(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Value::String(s) => Datum::Str(s.clone()),
        Value::Array(items) => Datum::List(items.iter().map(|i| to_datum(i, data_type)).collect()),
        Value::Object(map) => {
            let key_type = match data_type {
                DataType::Map(k, _) => *k,
                _ => ScalarType::Utf8,
            };
            Datum::Map(
                map.iter()
                    .map(|(k, v)| (key_datum(k, key_type), to_datum(v, data_type)))
                    .collect(),
            )
        }
    }
}

/// JSON object keys are always strings; numeric key columns parse them back.
fn key_datum(key: &str, key_type: ScalarType) -> Datum {
    match key_type {
        ScalarType::Utf8 => Datum::Str(key.to_string()),
        ScalarType::Bool => match key {
            "true" => Datum::Bool(true),
            "false" => Datum::Bool(false),
            _ => Datum::Str(key.to_string()),
        },
        _ => key
            .parse::<i64>()
            .map(Datum::Int)
            .or_else(|_| key.parse::<u64>().map(Datum::UInt))
            .unwrap_or_else(|_| Datum::Str(key.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tuplecursor_core::schema::ColumnSpec;

    #[test]
    fn reads_rows_in_schema_order() {
        let schema = Schema::new(vec![
            ColumnSpec::new("n", DataType::Scalar(ScalarType::Int32)),
            ColumnSpec::new("pt", DataType::Vector(ScalarType::Float64)),
            ColumnSpec::new("w", DataType::Map(ScalarType::Int32, ScalarType::Float32)),
        ]);
        let input = "{\"pt\": [1.5], \"n\": 2, \"w\": {\"3\": 0.5}}\n\n{\"n\": 3}\n";
        let mut r = JsonlReader::from_reader(input.as_bytes(), schema);
        let first = r.next_row().unwrap().unwrap();
        assert_eq!(first[0], Datum::Int(2));
        assert_eq!(first[1], Datum::List(vec![Datum::Float(1.5)]));
        assert_eq!(first[2], Datum::Map(vec![(Datum::Int(3), Datum::Float(0.5))]));
        let second = r.next_row().unwrap().unwrap();
        assert_eq!(second[1], Datum::Null);
        assert!(r.next_row().unwrap().is_none());
    }

    #[test]
    fn non_object_line_is_an_error() {
        let schema = Schema::new(vec![ColumnSpec::new("n", DataType::Scalar(ScalarType::Int32))]);
        let mut r = JsonlReader::from_reader("[1, 2]\n".as_bytes(), schema);
        assert!(matches!(r.next_row(), Err(Error::Row { line: 1, .. })));
    }
}
