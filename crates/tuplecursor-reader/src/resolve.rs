//! Name resolution and typed access.
//!
//! A requested name is rewritten before lookup: `prefix + name` wins when
//! that column exists, otherwise an alias maps the name to the real column. The requested Rust type must match the column type exactly; when
//! conversion lookup is on, a mismatch falls back to a shadow column named
//! `name___<suffix>` that holds the converted values.

use std::any::{Any, TypeId};
use std::collections::BTreeMap;

use tuplecursor_core::error::{Error, Result};
use tuplecursor_core::handle::ColumnKind;
use tuplecursor_core::source::EventSource;
use tuplecursor_core::typename::short_type_name;

use crate::reader::EventReader;

/// Scalar shadows are probed in this order; the first with the requested type wins.
pub(crate) const SCALAR_SHADOW_SUFFIXES: [char; 3] = ['d', 'f', 'i'];

/// Name of the shadow column holding `name` converted as `suffix` describes.
pub fn shadow_name(name: &str, suffix: char) -> String {
    format!("{}___{}", name, suffix)
}

/// Shadow suffix for a vector stored as `native` but requested as `requested`.
pub(crate) fn vector_shadow_suffix(native: TypeId, requested: TypeId) -> Option<char> {
    let pairs = [
        (TypeId::of::<Vec<f64>>(), TypeId::of::<Vec<f32>>(), 'f'),
        (TypeId::of::<Vec<f32>>(), TypeId::of::<Vec<f64>>(), 'd'),
        (TypeId::of::<Vec<u32>>(), TypeId::of::<Vec<i32>>(), 'i'),
        (TypeId::of::<Vec<f32>>(), TypeId::of::<Vec<i32>>(), 'a'),
    ];
    pairs
        .iter()
        .find(|(n, r, _)| *n == native && *r == requested)
        .map(|&(_, _, suffix)| suffix)
}

impl<S: EventSource + 'static> EventReader<S> {
    /// Apply alias and prefix rewriting to a requested name.
    pub(crate) fn resolve_name(&self, raw: &str) -> String {
        if let Some(prefixed) = self.prefixed(raw) {
            return prefixed;
        }
        match self.aliases.get(raw) {
            Some(target) => self.prefixed(target).unwrap_or_else(|| target.clone()),
            None => raw.to_string(),
        }
    }

    /// `prefix + name` when a prefix is set and that column is known.
    fn prefixed(&self, name: &str) -> Option<String> {
        if self.prefix.is_empty() {
            return None;
        }
        let prefixed = format!("{}{}", self.prefix, name);
        self.store.has(&prefixed).then_some(prefixed)
    }

    /// Find the attached column holding a `C`, attaching it (or a shadow) on demand.
    fn locate<C: Any>(&mut self, raw: &str, name: String, kind: ColumnKind, force: bool) -> Result<String> {
        self.ensure_attached(&name)?;

        let mut candidates = Vec::new();
        if let Some(h) = self.store.handle(&name, kind) {
            if h.is::<C>() {
                return Ok(name);
            }
            if self.conversion_active && !force {
                match kind {
                    ColumnKind::Vector => {
                        if let Some(s) = vector_shadow_suffix(h.type_id(), TypeId::of::<C>()) {
                            candidates.push(shadow_name(&name, s));
                        }
                    }
                    ColumnKind::Scalar => {
                        candidates.extend(SCALAR_SHADOW_SUFFIXES.iter().map(|&s| shadow_name(&name, s)));
                    }
                }
            }
        }
        for candidate in candidates {
            self.ensure_attached(&candidate)?;
            if self.store.handle(&candidate, kind).is_some_and(|h| h.is::<C>()) {
                tracing::trace!(column = %name, shadow = %candidate, "using shadow column");
                return Ok(candidate);
            }
        }

        let requested = short_type_name::<C>();
        Err(match self.store.type_name(&name) {
            Ok(actual) => Error::type_mismatch(raw, requested, actual),
            Err(_) => Error::not_found(raw, requested),
        })
    }

    fn locate_reported<C: Any>(&mut self, raw: &str, name: String, kind: ColumnKind, force: bool) -> Result<String> {
        self.locate::<C>(raw, name, kind, force).inspect_err(|e| self.report(e))
    }

    fn var_ref<T: Any>(&mut self, raw: &str, name: String, force: bool) -> Result<&T> {
        let found = self.locate_reported::<T>(raw, name, ColumnKind::Scalar, force)?;
        self.store
            .handle(&found, ColumnKind::Scalar)
            .and_then(|h| h.scalar::<T>())
            .ok_or_else(|| Error::not_found(raw, short_type_name::<T>()))
    }

    fn vec_ref<T: Any>(&mut self, raw: &str, name: String, force: bool) -> Result<&[T]> {
        let found = self.locate_reported::<Vec<T>>(raw, name, ColumnKind::Vector, force)?;
        match self
            .store
            .handle(&found, ColumnKind::Vector)
            .and_then(|h| h.collection::<Vec<T>>())
        {
            Some(Some(v)) => Ok(v.as_slice()),
            Some(None) => Ok(&[]),
            None => Err(Error::not_found(raw, short_type_name::<Vec<T>>())),
        }
    }

    /// Scalar column `name` as `T`.
    pub fn get_var<T: Any>(&mut self, name: &str) -> Result<&T> {
        self.get_var_with(name, false)
    }

    /// Like [`get_var`](Self::get_var); `force_type_match` skips the shadow fallback.
    pub fn get_var_with<T: Any>(&mut self, name: &str, force_type_match: bool) -> Result<&T> {
        let resolved = self.resolve_name(name);
        self.var_ref(name, resolved, force_type_match)
    }

    /// Vector column `name` as a slice of `T`. A row with no payload reads as empty.
    pub fn get_vec<T: Any>(&mut self, name: &str) -> Result<&[T]> {
        self.get_vec_with(name, false)
    }

    pub fn get_vec_with<T: Any>(&mut self, name: &str, force_type_match: bool) -> Result<&[T]> {
        let resolved = self.resolve_name(name);
        self.vec_ref(name, resolved, force_type_match)
    }

    /// Map column `name`. An empty cell is given an empty map.
    pub fn get_map<K: Ord + Any, V: Any>(&mut self, name: &str) -> Result<&BTreeMap<K, V>> {
        let resolved = self.resolve_name(name);
        let found = self.locate_reported::<BTreeMap<K, V>>(name, resolved, ColumnKind::Vector, true)?;
        let slot = self
            .store
            .handle_mut(&found, ColumnKind::Vector)
            .and_then(|h| h.collection_slot::<BTreeMap<K, V>>())
            .ok_or_else(|| Error::not_found(name, short_type_name::<BTreeMap<K, V>>()))?;
        Ok(&**slot.get_or_insert_with(Box::default))
    }

    /// Exact-name, exact-type vector read; no alias, prefix or shadow.
    pub(crate) fn vec_exact<T: Any>(&mut self, name: &str) -> Result<&[T]> {
        self.vec_ref(name, name.to_string(), true)
    }

    pub(crate) fn var_exact<T: Any>(&mut self, name: &str) -> Result<&T> {
        self.var_ref(name, name.to_string(), true)
    }

    /// Raw attached cell of `name`, for callers that dispatch on type themselves.
    pub fn column_any(&self, name: &str) -> Option<&dyn Any> {
        self.store.any_handle(&self.resolve_name(name)).map(|h| h.cell())
    }
}
