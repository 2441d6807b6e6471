//! The reader session.
//!
//! An [`EventReader`] owns the event source, the column store, the cursor and
//! the pipeline of registered functions. Typical use:
//!
//! ```rust,no_run
//! # use tuplecursor_core::prelude::*;
//! # use tuplecursor_reader::EventReader;
//! # fn run(source: Box<dyn EventSource>) -> Result<()> {
//! let mut tr = EventReader::new(source);
//! tr.register_function(|tr: &mut EventReader| {
//!     let ht = *tr.get_var::<f64>("ht")?;
//!     tr.register_derived_var("ht_scaled", ht * 1.1)
//! })?;
//! while tr.next_event()? {
//!     let run = *tr.get_var::<u32>("run")?;
//!     let scaled = *tr.get_var::<f64>("ht_scaled")?;
//!     println!("{} {}", run, scaled);
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;
use std::io::Write;

use tuplecursor_core::config::ReaderConfig;
use tuplecursor_core::error::{Error, Result};
use tuplecursor_core::handle::{ColumnKind, ColumnOrigin};
use tuplecursor_core::schema::DataType;
use tuplecursor_core::source::EventSource;
use tuplecursor_core::store::ColumnStore;

use crate::cursor::{CursorState, EventCursor};
use crate::pipeline::Pipeline;

pub struct EventReader<S: EventSource = Box<dyn EventSource>> {
    pub(crate) source: S,
    pub(crate) store: ColumnStore,
    pub(crate) cursor: EventCursor,
    pub(crate) pipeline: Pipeline<S>,
    /// alias -> column name
    pub(crate) aliases: HashMap<String, String>,
    pub(crate) prefix: String,
    pub(crate) rethrow: bool,
    pub(crate) conversion_active: bool,
}

impl<S: EventSource + 'static> EventReader<S> {
    /// Reader that attaches every column on first use.
    pub fn new(source: S) -> Self {
        let mut tr = Self::bare(source);
        tr.declare_columns();
        tr
    }

    /// Reader that attaches and binds `names` up front; other columns stay lazy.
    pub fn with_active_columns<I, N>(source: S, names: I) -> Result<Self>
    where
        I: IntoIterator<Item = N>,
        N: AsRef<str>,
    {
        let mut tr = Self::bare(source);
        tr.declare_columns();
        for name in names {
            let name = name.as_ref();
            if !tr.attach_source_column(name)? {
                tracing::warn!(column = name, file = %tr.source.file_name(), "active column not found in source");
            }
        }
        Ok(tr)
    }

    pub fn with_config(source: S, cfg: &ReaderConfig) -> Result<Self> {
        let mut tr = Self::with_active_columns(source, &cfg.active_columns)?;
        tr.rethrow = cfg.rethrow;
        tr.prefix = cfg.prefix.clone();
        for (alias, name) in &cfg.aliases {
            tr.add_alias(name, alias)?;
        }
        if cfg.scalar_conversions.any() || cfg.vector_conversions.any() {
            tr.set_conversion_mode(cfg.scalar_conversions, cfg.vector_conversions)?;
        }
        tr.conversion_active = cfg.conversion_active();
        if cfg.update_disabled {
            tr.disable_update();
        }
        Ok(tr)
    }

    fn bare(source: S) -> Self {
        Self {
            source,
            store: ColumnStore::new(),
            cursor: EventCursor::new(),
            pipeline: Pipeline::new(),
            aliases: HashMap::new(),
            prefix: String::new(),
            rethrow: true,
            conversion_active: false,
        }
    }

    fn declare_columns(&mut self) {
        let columns = self.source.columns();
        for spec in &columns {
            self.store.declare(spec.name.clone(), spec.data_type.type_name());
        }
        self.cursor.ready();
        tracing::debug!(file = %self.source.file_name(), columns = columns.len(), "populated column list");
    }

    // --- cursor ---

    /// Load the next event. `Ok(false)` once every event has been read.
    pub fn next_event(&mut self) -> Result<bool> {
        let row = self.cursor.next_row();
        if row >= self.source.row_count() {
            self.cursor.exhaust();
            return Ok(false);
        }
        self.load_event(row)
    }

    /// Load event `row` directly; later `next_event` calls continue from there.
    pub fn go_to_event(&mut self, row: i64) -> Result<bool> {
        let rows = self.source.row_count();
        if row < 0 || row as usize >= rows {
            let e = Error::OutOfRange { row, rows };
            tracing::warn!(file = %self.source.file_name(), error = %e, "seek failed");
            return Err(e);
        }
        self.load_event(row as usize)
    }

    fn load_event(&mut self, row: usize) -> Result<bool> {
        self.cursor.begin();
        match self.source.load_row(row, &mut self.store) {
            Ok(true) => {}
            Ok(false) => {
                self.cursor.exhaust();
                return Ok(false);
            }
            Err(e) => {
                self.cursor.abort();
                return Err(e.with_context(format!(
                    "loading event {} of {}",
                    row,
                    self.source.file_name()
                )));
            }
        }
        self.cursor.finish(row);
        tracing::trace!(row, "loaded event");
        if !self.cursor.update_disabled() {
            self.run_pipeline()?;
        }
        Ok(true)
    }

    /// Stop running registered functions; source columns still load.
    pub fn disable_update(&mut self) {
        self.cursor.disable_update();
    }

    /// One-based number of the current event; 0 before the first.
    pub fn event_number(&self) -> usize {
        self.cursor.event_number()
    }

    pub fn current_row(&self) -> Option<usize> {
        self.cursor.current_row()
    }

    pub fn rows_processed(&self) -> usize {
        self.cursor.rows_processed()
    }

    pub fn is_first_event(&self) -> bool {
        self.cursor.is_first_event()
    }

    pub fn row_count(&self) -> usize {
        self.source.row_count()
    }

    pub fn state(&self) -> CursorState {
        self.cursor.state()
    }

    pub fn file_name(&self) -> String {
        self.source.file_name()
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    // --- introspection ---

    /// Known to the schema or derived, after alias and prefix resolution.
    pub fn has_var(&self, name: &str) -> bool {
        self.store.has(&self.resolve_name(name))
    }

    pub fn column_type(&self, name: &str) -> Result<String> {
        self.store
            .type_name(&self.resolve_name(name))
            .map(String::from)
            .map_err(|_| Error::not_found(name, "<any>"))
    }

    /// Every known column name, sorted.
    pub fn tuple_members(&self) -> Vec<String> {
        self.store.names()
    }

    /// Human-readable description of one column.
    pub fn tuple_specs(&self, name: &str) -> Vec<String> {
        let resolved = self.resolve_name(name);
        let mut lines = vec![format!("name: {}", resolved)];
        if resolved != name {
            lines.push(format!("requested as: {}", name));
        }
        let Ok(type_name) = self.store.type_name(&resolved) else {
            lines.push("type: <unknown>".into());
            return lines;
        };
        lines.push(format!("type: {}", type_name));

        let declared = self.source.find_column(&resolved).map(|c| c.data_type);
        let kind = match (declared, self.store.any_handle(&resolved)) {
            (Some(DataType::Scalar(_)), _) => "scalar",
            (Some(DataType::Vector(_)), _) => "vector",
            (Some(DataType::Map(..)), _) => "map",
            (None, Some(h)) if h.kind() == ColumnKind::Scalar => "scalar",
            (None, Some(_)) if type_name.starts_with("BTreeMap") => "map",
            (None, Some(_)) => "vector",
            (None, None) => "unknown",
        };
        lines.push(format!("kind: {}", kind));
        let origin = match self.store.any_handle(&resolved).map(|h| h.origin()) {
            Some(ColumnOrigin::Derived) => "derived",
            _ => "source",
        };
        lines.push(format!("origin: {}", origin));
        let attached = if self.store.is_attached(&resolved) { "yes" } else { "no" };
        lines.push(format!("attached: {}", attached));
        if origin == "source" {
            lines.push(format!("file: {}", self.source.file_name()));
        }
        lines
    }

    /// One `type name` line per known column.
    pub fn print_tuple_members<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        for name in self.store.names() {
            let type_name = self.store.type_name(&name).unwrap_or("<unknown>");
            writeln!(w, "{:>30} {}", type_name, name)?;
        }
        Ok(())
    }

    // --- settings ---

    /// Names are looked up as `prefix + name` first, then bare.
    pub fn set_prefix(&mut self, prefix: impl Into<String>) {
        self.prefix = prefix.into();
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Make `alias` resolve to the existing column `name`.
    pub fn add_alias(&mut self, name: &str, alias: &str) -> Result<()> {
        if !self.store.has(name) {
            return self.fail(Error::not_found(name, "<any>").with_context("adding alias"));
        }
        if self.store.has(alias) || self.aliases.contains_key(alias) {
            return self.fail(Error::DuplicateName(alias.to_string()));
        }
        tracing::debug!(column = name, alias, "added alias");
        self.aliases.insert(alias.to_string(), name.to_string());
        Ok(())
    }

    /// Whether registration and pipeline failures are returned (`true`) or
    /// only logged (`false`). Typed accessors always return their errors.
    pub fn set_rethrow(&mut self, rethrow: bool) {
        self.rethrow = rethrow;
    }

    pub fn rethrow(&self) -> bool {
        self.rethrow
    }

    // --- error policy ---

    /// Report a registration or pipeline failure and apply the rethrow policy.
    pub(crate) fn fail(&self, e: Error) -> Result<()> {
        tracing::warn!(file = %self.source.file_name(), error = %e, "tuple reader error");
        if self.rethrow {
            Err(e)
        } else {
            Ok(())
        }
    }

    /// Report a lookup failure; only the first event is logged loudly.
    pub(crate) fn report(&self, e: &Error) {
        if self.cursor.is_first_event() {
            tracing::warn!(file = %self.source.file_name(), error = %e, "lookup failed");
        } else {
            tracing::trace!(error = %e, "lookup failed");
        }
    }
}
