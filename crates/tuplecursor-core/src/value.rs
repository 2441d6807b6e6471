//! Source-side values and the cell delivery helpers.
//!
//! Sources hold row data as [`Datum`]s. When a row is loaded, each bound
//! column's datum is written into its attached cell with [`fill_cell`];
//! [`read_cell`] goes the other way for display.

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Error, Result};
use crate::schema::{with_key_type, with_scalar_type, DataType};
use crate::typename::short_type_name;

#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    List(Vec<Datum>),
    Map(Vec<(Datum, Datum)>),
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datum::Null => f.write_str("null"),
            Datum::Bool(b) => write!(f, "{}", b),
            Datum::Int(i) => write!(f, "{}", i),
            Datum::UInt(u) => write!(f, "{}", u),
            Datum::Float(x) => write!(f, "{}", x),
            Datum::Str(s) => write!(f, "{:?}", s),
            Datum::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Datum::Map(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                f.write_str("}")
            }
        }
    }
}

macro_rules! datum_from {
    ($variant:ident as $wide:ty: $($t:ty),*) => {
        $(impl From<$t> for Datum {
            fn from(v: $t) -> Self {
                Datum::$variant(v as $wide)
            }
        })*
    };
}

datum_from!(Int as i64: i8, i16, i32, i64);
datum_from!(UInt as u64: u8, u16, u32, u64);
datum_from!(Float as f64: f32, f64);

impl From<bool> for Datum {
    fn from(v: bool) -> Self {
        Datum::Bool(v)
    }
}

impl From<String> for Datum {
    fn from(v: String) -> Self {
        Datum::Str(v)
    }
}

impl From<&str> for Datum {
    fn from(v: &str) -> Self {
        Datum::Str(v.to_string())
    }
}

impl<T: Into<Datum>> From<Vec<T>> for Datum {
    fn from(v: Vec<T>) -> Self {
        Datum::List(v.into_iter().map(Into::into).collect())
    }
}

impl<K: Into<Datum>, V: Into<Datum>> From<BTreeMap<K, V>> for Datum {
    fn from(m: BTreeMap<K, V>) -> Self {
        Datum::Map(m.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Conversion from a datum into a concrete element type.
pub trait FromDatum: Sized {
    fn from_datum(d: &Datum) -> Result<Self>;
}

fn mismatch<T>(d: &Datum) -> Error {
    Error::Source(format!(
        "cannot store value {} as {}",
        d,
        short_type_name::<T>()
    ))
}

macro_rules! from_datum_int {
    ($($t:ty),*) => {
        $(impl FromDatum for $t {
            fn from_datum(d: &Datum) -> Result<Self> {
                match d {
                    Datum::Null => Ok(0),
                    Datum::Int(i) => <$t>::try_from(*i).map_err(|_| mismatch::<$t>(d)),
                    Datum::UInt(u) => <$t>::try_from(*u).map_err(|_| mismatch::<$t>(d)),
                    Datum::Bool(b) => Ok(*b as $t),
                    // upper bound is exclusive: MAX as f64 rounds up for 64-bit types
                    Datum::Float(x)
                        if x.fract() == 0.0
                            && *x >= <$t>::MIN as f64
                            && *x < <$t>::MAX as f64 + 1.0 =>
                    {
                        Ok(*x as $t)
                    }
                    _ => Err(mismatch::<$t>(d)),
                }
            }
        })*
    };
}

from_datum_int!(i8, u8, i16, u16, i32, u32, i64, u64);

macro_rules! from_datum_float {
    ($($t:ty),*) => {
        $(impl FromDatum for $t {
            fn from_datum(d: &Datum) -> Result<Self> {
                match d {
                    Datum::Null => Ok(0.0),
                    Datum::Int(i) => Ok(*i as $t),
                    Datum::UInt(u) => Ok(*u as $t),
                    Datum::Float(x) => Ok(*x as $t),
                    _ => Err(mismatch::<$t>(d)),
                }
            }
        })*
    };
}

from_datum_float!(f32, f64);

impl FromDatum for bool {
    fn from_datum(d: &Datum) -> Result<Self> {
        match d {
            Datum::Null => Ok(false),
            Datum::Bool(b) => Ok(*b),
            Datum::Int(i) => Ok(*i != 0),
            Datum::UInt(u) => Ok(*u != 0),
            _ => Err(mismatch::<bool>(d)),
        }
    }
}

impl FromDatum for String {
    fn from_datum(d: &Datum) -> Result<Self> {
        match d {
            Datum::Null => Ok(String::new()),
            Datum::Str(s) => Ok(s.clone()),
            _ => Err(mismatch::<String>(d)),
        }
    }
}

fn list_of<T: FromDatum>(d: &Datum) -> Result<Vec<T>> {
    match d {
        Datum::Null => Ok(Vec::new()),
        Datum::List(items) => items.iter().map(T::from_datum).collect(),
        _ => Err(mismatch::<Vec<T>>(d)),
    }
}

fn map_of<K: FromDatum + Ord, V: FromDatum>(d: &Datum) -> Result<BTreeMap<K, V>> {
    match d {
        Datum::Null => Ok(BTreeMap::new()),
        Datum::Map(entries) => entries
            .iter()
            .map(|(k, v)| Ok((K::from_datum(k)?, V::from_datum(v)?)))
            .collect(),
        _ => Err(mismatch::<BTreeMap<K, V>>(d)),
    }
}

fn cell_as<C: Any>(cell: &mut dyn Any) -> Result<&mut C> {
    cell.downcast_mut::<C>().ok_or_else(|| {
        Error::Source(format!(
            "bound cell does not hold {}",
            short_type_name::<C>()
        ))
    })
}

/// Write `datum` into an attached cell of type `data_type`.
///
/// Scalar cells hold the value itself; vector and map cells hold an
/// `Option<Box<C>>` whose collection is reused when present.
pub fn fill_cell(data_type: &DataType, datum: &Datum, cell: &mut dyn Any) -> Result<()> {
    match *data_type {
        DataType::Scalar(t) => with_scalar_type!(t, T => {
            *cell_as::<T>(cell)? = T::from_datum(datum)?;
        }),
        DataType::Vector(t) => with_scalar_type!(t, T => {
            let values = list_of::<T>(datum)?;
            let slot = cell_as::<Option<Box<Vec<T>>>>(cell)?;
            match slot {
                Some(existing) => **existing = values,
                None => *slot = Some(Box::new(values)),
            }
        }),
        DataType::Map(k, v) => with_key_type!(
            k,
            K => with_scalar_type!(v, V => {
                let values = map_of::<K, V>(datum)?;
                let slot = cell_as::<Option<Box<BTreeMap<K, V>>>>(cell)?;
                match slot {
                    Some(existing) => **existing = values,
                    None => *slot = Some(Box::new(values)),
                }
            }),
            return Err(Error::Source(format!("unsupported map key type {}", k)))
        ),
    }
    Ok(())
}

/// Read an attached cell back into a datum.
pub fn read_cell(data_type: &DataType, cell: &dyn Any) -> Option<Datum> {
    match *data_type {
        DataType::Scalar(t) => {
            with_scalar_type!(t, T => cell.downcast_ref::<T>().map(|v| Datum::from(v.clone())))
        }
        DataType::Vector(t) => with_scalar_type!(t, T => {
            let slot = cell.downcast_ref::<Option<Box<Vec<T>>>>()?;
            Some(match slot {
                Some(values) => Datum::from((**values).clone()),
                None => Datum::List(Vec::new()),
            })
        }),
        DataType::Map(k, v) => with_key_type!(
            k,
            K => with_scalar_type!(v, V => {
                let slot = cell.downcast_ref::<Option<Box<BTreeMap<K, V>>>>()?;
                Some(match slot {
                    Some(values) => Datum::from((**values).clone()),
                    None => Datum::Map(Vec::new()),
                })
            }),
            None
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ScalarType;

    #[test]
    fn fills_scalar_cell() {
        let mut cell: Box<dyn Any> = Box::new(0i32);
        fill_cell(&DataType::Scalar(ScalarType::Int32), &Datum::Int(7), cell.as_mut()).unwrap();
        assert_eq!(cell.downcast_ref::<i32>(), Some(&7));
    }

    #[test]
    fn fills_vector_cell_reusing_box() {
        let dt = DataType::Vector(ScalarType::Float64);
        let mut cell: Box<dyn Any> = Box::new(None::<Box<Vec<f64>>>);
        fill_cell(&dt, &Datum::from(vec![1.5, 2.5]), cell.as_mut()).unwrap();
        fill_cell(&dt, &Datum::from(vec![3.5]), cell.as_mut()).unwrap();
        let slot = cell.downcast_ref::<Option<Box<Vec<f64>>>>().unwrap();
        assert_eq!(slot.as_deref(), Some(&vec![3.5]));
    }

    #[test]
    fn rejects_out_of_range_and_wrong_kind() {
        let mut cell: Box<dyn Any> = Box::new(0u8);
        let dt = DataType::Scalar(ScalarType::UInt8);
        assert!(fill_cell(&dt, &Datum::Int(300), cell.as_mut()).is_err());
        assert!(fill_cell(&dt, &Datum::Str("x".into()), cell.as_mut()).is_err());
    }

    #[test]
    fn rejects_whole_floats_outside_integer_range() {
        assert!(i32::from_datum(&Datum::Float(1e20)).is_err());
        assert!(i32::from_datum(&Datum::Float(-3e9)).is_err());
        assert!(u8::from_datum(&Datum::Float(-1.0)).is_err());
        assert!(u8::from_datum(&Datum::Float(256.0)).is_err());
        assert!(i64::from_datum(&Datum::Float(9.3e18)).is_err());
        assert_eq!(u8::from_datum(&Datum::Float(255.0)).unwrap(), 255);
        assert_eq!(i32::from_datum(&Datum::Float(-2147483648.0)).unwrap(), i32::MIN);

        let mut cell: Box<dyn Any> = Box::new(0i32);
        let dt = DataType::Scalar(ScalarType::Int32);
        assert!(fill_cell(&dt, &Datum::Float(1e20), cell.as_mut()).is_err());
        assert_eq!(cell.downcast_ref::<i32>(), Some(&0));
    }

    #[test]
    fn reads_map_cell() {
        let dt = DataType::Map(ScalarType::Utf8, ScalarType::Int32);
        let mut m = BTreeMap::new();
        m.insert("a".to_string(), 1i32);
        let cell: Box<dyn Any> = Box::new(Some(Box::new(m)));
        let d = read_cell(&dt, cell.as_ref()).unwrap();
        assert_eq!(d.to_string(), "{\"a\": 1}");
    }
}
