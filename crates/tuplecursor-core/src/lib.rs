#![forbid(unsafe_code)]
//! tuplecursor-core: shared kernel for the tuplecursor event reader.
//!
//! This crate contains only *pure* types, small helpers, and interfaces
//! (traits) that other crates implement. There is **no I/O** here.
//!
//! Crates that use this:
//! - tuplecursor-io: implements `EventSource` for in-memory, JSONL and CSV data.
//! - tuplecursor-reader: drives the cursor, lazy attachment and derived columns.
//! - tuplecursor-cli: inspects data files through the reader.

pub mod cast;
pub mod config;
pub mod error;
pub mod handle;
pub mod prelude;
pub mod schema;
pub mod source;
pub mod store;
pub mod typename;
pub mod value;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
