#![forbid(unsafe_code)]
//! tuplecursor-reader: typed, on-demand access to event-structured columns.
//!
//! ```text
//! next_event ─► source.load_row ─► pipeline (registration order) ─► get_var / get_vec / get_map
//! ```
//!
//! - `cursor`: row advance/seek state and the first-event registration window.
//! - `registry`: attaches storage for a known column on first use.
//! - `resolve`: prefix/alias resolution, exact type matching and shadow-column lookup.
//! - `pipeline`: registered functions and derived variables.
//! - `convert`: shadow-column duplication and typed vector aliases.

pub mod convert;
pub mod cursor;
pub mod pipeline;
pub mod reader;
pub mod registry;
pub mod resolve;

pub use cursor::CursorState;
pub use pipeline::{PipelineOutput, UpdateKey};
pub use reader::EventReader;
pub use resolve::shadow_name;
