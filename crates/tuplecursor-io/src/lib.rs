#![forbid(unsafe_code)]
//! tuplecursor-io: concrete event sources.
//!
//! - `memory`: `MemorySource`, rows held in memory; every other source loads into it.
//! - `readers`: JSONL and CSV files → `MemorySource` with an explicit schema.

pub mod error;
pub mod memory;
pub mod readers;

pub use memory::MemorySource;
pub use readers::{csv::CsvReader, jsonl::JsonlReader};
