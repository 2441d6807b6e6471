//! Registered functions and derived variables.
//!
//! Functions run after every loaded event, in registration order. They are
//! the only place derived variables should be (re)computed. Registration is
//! allowed only before or during the first event; a function may itself
//! register further functions then, and those run from the next pass on.
//!
//! Privileged functions additionally receive an [`UpdateKey`], which unlocks
//! [`EventReader::update_var`]: overwriting any scalar, source columns included.

use std::any::Any;
use std::mem;

use tuplecursor_core::error::{Error, Result};
use tuplecursor_core::handle::{ColumnHandle, ColumnKind, ColumnOrigin};
use tuplecursor_core::source::EventSource;
use tuplecursor_core::typename::short_type_name;

use crate::reader::EventReader;

type Function<S> = Box<dyn FnMut(&mut EventReader<S>) -> Result<()>>;
type PrivilegedFunction<S> = Box<dyn FnMut(&mut EventReader<S>, &UpdateKey) -> Result<()>>;

pub(crate) enum Entry<S: EventSource> {
    Function(Function<S>),
    Privileged(PrivilegedFunction<S>),
}

pub(crate) struct Pipeline<S: EventSource> {
    entries: Vec<Entry<S>>,
}

impl<S: EventSource> Pipeline<S> {
    pub(crate) fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn push(&mut self, entry: Entry<S>) {
        self.entries.push(entry);
    }

    fn take(&mut self) -> Vec<Entry<S>> {
        mem::take(&mut self.entries)
    }

    /// Put taken entries back ahead of any registered while they ran.
    fn restore(&mut self, mut entries: Vec<Entry<S>>) {
        entries.append(&mut self.entries);
        self.entries = entries;
    }
}

/// Capability handed to privileged functions. Only the pipeline creates one.
#[derive(Debug)]
pub struct UpdateKey {
    _private: (),
}

/// What a registered function may return. Boolean results are ignored.
pub trait PipelineOutput {
    fn into_result(self) -> Result<()>;
}

impl PipelineOutput for () {
    fn into_result(self) -> Result<()> {
        Ok(())
    }
}

impl PipelineOutput for bool {
    fn into_result(self) -> Result<()> {
        Ok(())
    }
}

impl PipelineOutput for Result<()> {
    fn into_result(self) -> Result<()> {
        self
    }
}

impl PipelineOutput for Result<bool> {
    fn into_result(self) -> Result<()> {
        self.map(|_| ())
    }
}

impl<S: EventSource + 'static> EventReader<S> {
    fn registration_closed(&self, what: &str) -> Option<Error> {
        if self.is_first_event() {
            None
        } else {
            Some(Error::UsagePastInit(format!(
                "{} must happen before tuple reading begins (event {})",
                what,
                self.event_number()
            )))
        }
    }

    /// Run `f` after every loaded event.
    pub fn register_function<F, R>(&mut self, mut f: F) -> Result<()>
    where
        F: FnMut(&mut EventReader<S>) -> R + 'static,
        R: PipelineOutput,
    {
        if let Some(e) = self.registration_closed("function registration") {
            return self.fail(e);
        }
        self.pipeline.push(Entry::Function(Box::new(move |tr: &mut EventReader<S>| {
            f(tr).into_result()
        })));
        tracing::debug!(functions = self.pipeline.len(), "registered function");
        Ok(())
    }

    /// Run `f` after every loaded event, with permission to overwrite scalars.
    pub fn register_privileged_function<F, R>(&mut self, mut f: F) -> Result<()>
    where
        F: FnMut(&mut EventReader<S>, &UpdateKey) -> R + 'static,
        R: PipelineOutput,
    {
        if let Some(e) = self.registration_closed("function registration") {
            return self.fail(e);
        }
        self.pipeline.push(Entry::Privileged(Box::new(
            move |tr: &mut EventReader<S>, key: &UpdateKey| f(tr, key).into_result(),
        )));
        tracing::debug!(functions = self.pipeline.len(), "registered privileged function");
        Ok(())
    }

    pub(crate) fn push_entry(&mut self, entry: Entry<S>) {
        self.pipeline.push(entry);
    }

    pub fn function_count(&self) -> usize {
        self.pipeline.len()
    }

    /// Run every registered function once. All of them run even if one fails;
    /// the first failure is returned (or logged, with rethrow off).
    pub(crate) fn run_pipeline(&mut self) -> Result<()> {
        let mut entries = self.pipeline.take();
        let key = UpdateKey { _private: () };
        let mut first = None;
        for (idx, entry) in entries.iter_mut().enumerate() {
            let outcome = match entry {
                Entry::Function(f) => f(self),
                Entry::Privileged(f) => f(self, &key),
            };
            if let Err(e) = outcome {
                tracing::debug!(function = idx, "pipeline function failed");
                self.report(&e);
                first.get_or_insert(e);
            }
        }
        self.pipeline.restore(entries);
        match first {
            Some(e) if self.rethrow => Err(e),
            _ => Ok(()),
        }
    }

    /// Create or update the derived scalar `name`.
    ///
    /// Fails with `DuplicateName` if a source column already uses the name,
    /// and with `TypeMismatch` if the derived column holds another type.
    pub fn register_derived_var<T: Any>(&mut self, name: &str, value: T) -> Result<()> {
        match self.store_derived_var(name, value) {
            Ok(()) => Ok(()),
            Err(e) => self.fail(e),
        }
    }

    fn store_derived_var<T: Any>(&mut self, name: &str, value: T) -> Result<()> {
        if let Some(h) = self.store.handle_mut(name, ColumnKind::Scalar) {
            if h.origin() != ColumnOrigin::Derived {
                return Err(Error::DuplicateName(name.to_string()));
            }
            let actual = h.type_name().to_string();
            return match h.scalar_mut::<T>() {
                Some(slot) => {
                    *slot = value;
                    Ok(())
                }
                None => Err(Error::type_mismatch(name, short_type_name::<T>(), actual)),
            };
        }
        if self.store.has(name) || self.aliases.contains_key(name) {
            return Err(Error::DuplicateName(name.to_string()));
        }
        tracing::debug!(column = name, ty = %short_type_name::<T>(), "registered derived variable");
        self.store
            .insert(name, ColumnHandle::attach(Box::new(value), ColumnOrigin::Derived));
        Ok(())
    }

    /// Create or update the derived vector-like column `name` (`Vec<T>`,
    /// `BTreeMap<K, V>`, ...). The previous payload is dropped; `None` leaves
    /// the column empty for this event.
    pub fn register_derived_vec<C: Any>(&mut self, name: &str, payload: Option<C>) -> Result<()> {
        match self.store_derived_vec(name, payload) {
            Ok(()) => Ok(()),
            Err(e) => self.fail(e),
        }
    }

    fn store_derived_vec<C: Any>(&mut self, name: &str, payload: Option<C>) -> Result<()> {
        if let Some(h) = self.store.handle_mut(name, ColumnKind::Vector) {
            if h.origin() != ColumnOrigin::Derived {
                return Err(Error::DuplicateName(name.to_string()));
            }
            let actual = h.type_name().to_string();
            return match h.collection_slot::<C>() {
                Some(slot) => {
                    *slot = payload.map(Box::new);
                    Ok(())
                }
                None => Err(Error::type_mismatch(name, short_type_name::<C>(), actual)),
            };
        }
        if self.store.has(name) || self.aliases.contains_key(name) {
            return Err(Error::DuplicateName(name.to_string()));
        }
        tracing::debug!(column = name, ty = %short_type_name::<C>(), "registered derived vector");
        self.store.insert(
            name,
            ColumnHandle::attach_vector::<C>(Box::new(payload.map(Box::new)), ColumnOrigin::Derived),
        );
        Ok(())
    }

    /// Overwrite scalar `name` with `value`, source columns included.
    ///
    /// An unknown name creates a derived scalar during the first event only.
    pub fn update_var<T: Any>(&mut self, _key: &UpdateKey, name: &str, value: T) -> Result<()> {
        match self.store_update(name, value) {
            Ok(()) => Ok(()),
            Err(e) => self.fail(e),
        }
    }

    fn store_update<T: Any>(&mut self, name: &str, value: T) -> Result<()> {
        self.ensure_attached(name)?;
        if let Some(h) = self.store.handle_mut(name, ColumnKind::Scalar) {
            let actual = h.type_name().to_string();
            return match h.scalar_mut::<T>() {
                Some(slot) => {
                    *slot = value;
                    Ok(())
                }
                None => Err(Error::type_mismatch(name, short_type_name::<T>(), actual)),
            };
        }
        if let Ok(actual) = self.store.type_name(name) {
            return Err(Error::type_mismatch(name, short_type_name::<T>(), actual));
        }
        if !self.is_first_event() {
            return Err(Error::not_found(name, short_type_name::<T>()));
        }
        tracing::debug!(column = name, ty = %short_type_name::<T>(), "created variable through update");
        self.store
            .insert(name, ColumnHandle::attach(Box::new(value), ColumnOrigin::Derived));
        Ok(())
    }
}
