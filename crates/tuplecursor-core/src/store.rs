//! Column store: attached cells plus the type names of every known column.
//!
//! Scalar and vector columns live in disjoint maps. The type-name map covers
//! every column known to the schema, attached or not, and every attached or
//! derived column. A name in either cell map always has a type-name entry.

use std::any::Any;
use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::handle::{ColumnHandle, ColumnKind};
use crate::source::ColumnSink;

#[derive(Debug, Default)]
pub struct ColumnStore {
    scalars: HashMap<String, ColumnHandle>,
    vectors: HashMap<String, ColumnHandle>,
    types: HashMap<String, String>,
}

impl ColumnStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record schema knowledge of a column without attaching storage.
    pub fn declare(&mut self, name: impl Into<String>, type_name: impl Into<String>) {
        self.types.insert(name.into(), type_name.into());
    }

    /// Known to the schema (or derived), regardless of attachment.
    pub fn has(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn type_name(&self, name: &str) -> Result<&str> {
        self.types
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| Error::not_found(name, "<any>"))
    }

    /// Known names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.types.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn is_attached(&self, name: &str) -> bool {
        self.scalars.contains_key(name) || self.vectors.contains_key(name)
    }

    /// Insert an attached cell, taking ownership of it.
    ///
    /// Any handle previously stored under `name` in the same map is returned
    /// to the caller rather than dropped here.
    pub fn insert(&mut self, name: impl Into<String>, handle: ColumnHandle) -> Option<ColumnHandle> {
        let name = name.into();
        self.types.insert(name.clone(), handle.type_name().to_string());
        match handle.kind() {
            ColumnKind::Scalar => self.scalars.insert(name, handle),
            ColumnKind::Vector => self.vectors.insert(name, handle),
        }
    }

    /// Detach a cell and hand its ownership to the caller.
    pub fn remove(&mut self, name: &str) -> Option<ColumnHandle> {
        let handle = self.scalars.remove(name).or_else(|| self.vectors.remove(name))?;
        self.types.remove(name);
        Some(handle)
    }

    pub fn handle(&self, name: &str, kind: ColumnKind) -> Option<&ColumnHandle> {
        match kind {
            ColumnKind::Scalar => self.scalars.get(name),
            ColumnKind::Vector => self.vectors.get(name),
        }
    }

    pub fn handle_mut(&mut self, name: &str, kind: ColumnKind) -> Option<&mut ColumnHandle> {
        match kind {
            ColumnKind::Scalar => self.scalars.get_mut(name),
            ColumnKind::Vector => self.vectors.get_mut(name),
        }
    }

    /// Attached cell of either kind.
    pub fn any_handle(&self, name: &str) -> Option<&ColumnHandle> {
        self.scalars.get(name).or_else(|| self.vectors.get(name))
    }

    pub fn attached_count(&self) -> usize {
        self.scalars.len() + self.vectors.len()
    }
}

impl ColumnSink for ColumnStore {
    fn cell_mut(&mut self, name: &str) -> Option<&mut (dyn Any + 'static)> {
        match self.scalars.get_mut(name) {
            Some(h) => Some(h.cell_mut()),
            None => self.vectors.get_mut(name).map(ColumnHandle::cell_mut),
        }
    }
}
