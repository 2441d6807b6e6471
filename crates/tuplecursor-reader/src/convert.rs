//! Shadow-column duplication and typed vector aliases.
//!
//! With a conversion mode set, every matching source column `x` gets a
//! derived shadow `x___<suffix>` holding its values cast to another numeric
//! type, recomputed after each event. With conversion lookup on, a typed
//! request that does not match `x` falls back to the shadow.
//!
//! | source      | shadow      | suffix |
//! |-------------|-------------|--------|
//! | `f64`       | `f32`       | `f`    |
//! | `f32`       | `f64`       | `d`    |
//! | `i32`       | `f32`       | `i`    |
//! | `Vec<f64>`  | `Vec<f32>`  | `f`    |
//! | `Vec<f32>`  | `Vec<f64>`  | `d`    |
//! | `Vec<u32>`  | `Vec<i32>`  | `i`    |
//! | `Vec<f32>`  | `Vec<i32>`  | `a`    |

use std::any::Any;

use tuplecursor_core::cast::{cast_slice, CastInto};
use tuplecursor_core::config::{ScalarConversions, VectorConversions};
use tuplecursor_core::error::{Error, Result};
use tuplecursor_core::schema::{DataType, ScalarType};
use tuplecursor_core::source::EventSource;
use tuplecursor_core::typename::short_type_name;

use crate::pipeline::Entry;
use crate::reader::EventReader;
use crate::resolve::shadow_name;

impl<S: EventSource + 'static> EventReader<S> {
    /// Register shadow columns for every source column the given conversions cover.
    pub fn set_conversion_mode(
        &mut self,
        scalars: ScalarConversions,
        vectors: VectorConversions,
    ) -> Result<()> {
        if !self.is_first_event() {
            return self.fail(Error::UsagePastInit(
                "conversion mode must be set before tuple reading begins".into(),
            ));
        }
        self.conversion_active = scalars.any() || vectors.any();

        let mut specs = self.source.columns();
        specs.sort_by(|a, b| a.name.cmp(&b.name));
        for spec in specs {
            if spec.name.contains("___") {
                continue;
            }
            let name = spec.name;
            match spec.data_type {
                DataType::Scalar(ScalarType::Float64) if scalars.double_to_float => {
                    self.push_scalar_shadow::<f64, f32>(name, 'f')
                }
                DataType::Scalar(ScalarType::Float32) if scalars.float_to_double => {
                    self.push_scalar_shadow::<f32, f64>(name, 'd')
                }
                DataType::Scalar(ScalarType::Int32) if scalars.int_to_float => {
                    self.push_scalar_shadow::<i32, f32>(name, 'i')
                }
                DataType::Vector(ScalarType::Float64) if vectors.double_to_float => {
                    self.push_vector_shadow::<f64, f32>(name, 'f')
                }
                DataType::Vector(ScalarType::Float32) => {
                    if vectors.float_to_double {
                        self.push_vector_shadow::<f32, f64>(name.clone(), 'd');
                    }
                    if vectors.float_to_int {
                        self.push_vector_shadow::<f32, i32>(name, 'a');
                    }
                }
                DataType::Vector(ScalarType::UInt32) if vectors.uint_to_int => {
                    self.push_vector_shadow::<u32, i32>(name, 'i')
                }
                _ => {}
            }
        }
        tracing::debug!(?scalars, ?vectors, "conversion mode set");
        Ok(())
    }

    /// Fall back to shadow columns on type-mismatched lookups.
    pub fn set_conversion_lookup(&mut self, on: bool) {
        self.conversion_active = on;
    }

    pub fn conversion_lookup(&self) -> bool {
        self.conversion_active
    }

    /// A shadow the source already delivers is read as is, never recomputed.
    fn source_ships(&self, shadow: &str) -> bool {
        let shipped = self.source.find_column(shadow).is_some();
        if shipped {
            tracing::debug!(shadow, "source provides shadow column");
        }
        shipped
    }

    fn push_scalar_shadow<F, T>(&mut self, name: String, suffix: char)
    where
        F: CastInto<T> + Any,
        T: Any,
    {
        let shadow = shadow_name(&name, suffix);
        if self.source_ships(&shadow) {
            return;
        }
        tracing::trace!(column = %name, shadow = %shadow, "scalar shadow");
        self.push_entry(Entry::Function(Box::new(move |tr: &mut EventReader<S>| {
            let value: T = tr.var_exact::<F>(&name)?.cast();
            tr.register_derived_var(&shadow, value)
        })));
    }

    fn push_vector_shadow<F, T>(&mut self, name: String, suffix: char)
    where
        F: CastInto<T> + Any,
        T: Any,
    {
        let shadow = shadow_name(&name, suffix);
        if self.source_ships(&shadow) {
            return;
        }
        tracing::trace!(column = %name, shadow = %shadow, "vector shadow");
        self.push_entry(Entry::Function(Box::new(move |tr: &mut EventReader<S>| {
            let values: Vec<T> = cast_slice(tr.vec_exact::<F>(&name)?);
            tr.register_derived_vec(&shadow, Some(values))
        })));
    }

    /// Publish vector `from`, element-cast from `F` to `T`, as derived column `alias`.
    pub fn set_vector_alias<F, T>(&mut self, from: &str, alias: &str) -> Result<()>
    where
        F: CastInto<T> + Any,
        T: Any,
    {
        if !self.is_first_event() {
            return self.fail(Error::UsagePastInit(format!(
                "vector alias '{}' must be set before tuple reading begins",
                alias
            )));
        }
        if !self.has_var(from) {
            return self.fail(Error::not_found(from, short_type_name::<Vec<F>>()));
        }
        let (from, alias) = (from.to_string(), alias.to_string());
        tracing::debug!(column = %from, alias = %alias, "vector alias");
        self.push_entry(Entry::Function(Box::new(move |tr: &mut EventReader<S>| {
            let values: Vec<T> = cast_slice(tr.get_vec::<F>(&from)?);
            tr.register_derived_vec(&alias, Some(values))
        })));
        Ok(())
    }
}
