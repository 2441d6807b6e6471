//! Convenience re-exports.

pub use crate::config::{ReaderConfig, ScalarConversions, VectorConversions};
pub use crate::error::{Error, Result};
pub use crate::handle::{ColumnHandle, ColumnKind, ColumnOrigin};
pub use crate::schema::{ColumnSpec, DataType, ScalarType, Schema};
pub use crate::source::{ColumnSink, EventSource};
pub use crate::store::ColumnStore;
pub use crate::typename::short_type_name;
pub use crate::value::Datum;
