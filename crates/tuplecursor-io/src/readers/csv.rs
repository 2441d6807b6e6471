//! CSV reader → `MemorySource`.
//!
//! Caveats:
//! - Headers are required; schema columns are matched to headers by name.
//! - Vector cells are `;`-separated lists (`1.5;2.5`); an empty cell is an empty vector.
//! - Map columns are not supported.

use std::fs::File;
use std::io::Read;

use csv as csv_crate;
use tuplecursor_core::schema::{DataType, ScalarType, Schema};
use tuplecursor_core::value::Datum;

use crate::error::{Error, Result};
use crate::memory::MemorySource;

pub struct CsvReader<R: Read> {
    rdr: csv_crate::Reader<R>,
    schema: Schema,
    /// Header position of each schema column.
    positions: Vec<usize>,
    line: usize,
}

impl CsvReader<File> {
    pub fn from_path(path: &str, schema: Schema) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file, schema)
    }
}

impl<R: Read> CsvReader<R> {
    pub fn from_reader(reader: R, schema: Schema) -> Result<Self> {
        let mut rdr = csv_crate::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv_crate::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = rdr.headers()?.iter().map(|s| s.to_string()).collect();
        let mut positions = Vec::with_capacity(schema.columns.len());
        for col in &schema.columns {
            if let DataType::Map(..) = col.data_type {
                return Err(Error::Schema(format!(
                    "column '{}': map columns cannot be read from CSV",
                    col.name
                )));
            }
            let pos = headers.iter().position(|h| *h == col.name).ok_or_else(|| {
                Error::Schema(format!("column '{}' not found in CSV header", col.name))
            })?;
            positions.push(pos);
        }

        Ok(Self {
            rdr,
            schema,
            positions,
            line: 1,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn next_row(&mut self) -> Result<Option<Vec<Datum>>> {
        let mut rec = csv_crate::StringRecord::new();
        if !self.rdr.read_record(&mut rec)? {
            return Ok(None);
        }
        self.line += 1;
        let mut row = Vec::with_capacity(self.positions.len());
        for (col, &pos) in self.schema.columns.iter().zip(&self.positions) {
            let raw = rec.get(pos).unwrap_or("");
            let d = parse_cell(raw, &col.data_type).map_err(|message| Error::Row {
                line: self.line,
                message: format!("column '{}': {}", col.name, message),
            })?;
            row.push(d);
        }
        Ok(Some(row))
    }

    pub fn into_source(mut self, name: impl Into<String>) -> Result<MemorySource> {
        let name = name.into();
        let mut src = MemorySource::new(name.clone(), self.schema.clone());
        let mut rows = 0usize;
        while let Some(row) = self.next_row()? {
            src.push_row(row)?;
            rows += 1;
        }
        tracing::debug!(source = %name, rows, "loaded CSV rows");
        Ok(src)
    }
}

fn parse_cell(raw: &str, data_type: &DataType) -> std::result::Result<Datum, String> {
    match data_type {
        DataType::Scalar(t) => parse_scalar(raw, *t),
        DataType::Vector(t) => {
            if raw.is_empty() {
                return Ok(Datum::List(Vec::new()));
            }
            raw.split(';')
                .map(|item| parse_scalar(item.trim(), *t))
                .collect::<std::result::Result<Vec<_>, _>>()
                .map(Datum::List)
        }
        DataType::Map(..) => Err("map columns are not supported".into()),
    }
}

fn parse_scalar(raw: &str, t: ScalarType) -> std::result::Result<Datum, String> {
    if raw.is_empty() && t != ScalarType::Utf8 {
        return Ok(Datum::Null);
    }
    let bad = |_| format!("cannot parse '{}' as {}", raw, t);
    match t {
        ScalarType::Utf8 => Ok(Datum::Str(raw.to_string())),
        ScalarType::Bool => match raw {
            "true" | "1" => Ok(Datum::Bool(true)),
            "false" | "0" => Ok(Datum::Bool(false)),
            _ => Err(format!("cannot parse '{}' as bool", raw)),
        },
        ScalarType::Float32 | ScalarType::Float64 => {
            raw.parse::<f64>().map(Datum::Float).map_err(|e| bad(e.to_string()))
        }
        ScalarType::UInt8 | ScalarType::UInt16 | ScalarType::UInt32 | ScalarType::UInt64 => {
            raw.parse::<u64>().map(Datum::UInt).map_err(|e| bad(e.to_string()))
        }
        _ => raw.parse::<i64>().map(Datum::Int).map_err(|e| bad(e.to_string())),
    }
}
