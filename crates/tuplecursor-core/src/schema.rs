//! Column schema types. Pure data; the source decides where values come from.
//!
//! Every `DataType` corresponds to exactly one Rust storage type, and its
//! display name is produced by [`short_type_name`] for that type, so names
//! reported by a source compare directly with names of requested types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::typename::short_type_name;

/// Element types a source can deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScalarType {
    Bool,
    Int8,
    UInt8,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Float32,
    Float64,
    Utf8,
}

/// Expand `$body` with `$T` bound to the Rust type of a [`ScalarType`].
macro_rules! with_scalar_type {
    ($ty:expr, $T:ident => $body:expr) => {
        match $ty {
            $crate::schema::ScalarType::Bool => { type $T = bool; $body }
            $crate::schema::ScalarType::Int8 => { type $T = i8; $body }
            $crate::schema::ScalarType::UInt8 => { type $T = u8; $body }
            $crate::schema::ScalarType::Int16 => { type $T = i16; $body }
            $crate::schema::ScalarType::UInt16 => { type $T = u16; $body }
            $crate::schema::ScalarType::Int32 => { type $T = i32; $body }
            $crate::schema::ScalarType::UInt32 => { type $T = u32; $body }
            $crate::schema::ScalarType::Int64 => { type $T = i64; $body }
            $crate::schema::ScalarType::UInt64 => { type $T = u64; $body }
            $crate::schema::ScalarType::Float32 => { type $T = f32; $body }
            $crate::schema::ScalarType::Float64 => { type $T = f64; $body }
            $crate::schema::ScalarType::Utf8 => { type $T = String; $body }
        }
    };
}

/// Like `with_scalar_type!` but restricted to ordered key types; floats yield `$err`.
macro_rules! with_key_type {
    ($ty:expr, $K:ident => $body:expr, $err:expr) => {
        match $ty {
            $crate::schema::ScalarType::Bool => { type $K = bool; $body }
            $crate::schema::ScalarType::Int8 => { type $K = i8; $body }
            $crate::schema::ScalarType::UInt8 => { type $K = u8; $body }
            $crate::schema::ScalarType::Int16 => { type $K = i16; $body }
            $crate::schema::ScalarType::UInt16 => { type $K = u16; $body }
            $crate::schema::ScalarType::Int32 => { type $K = i32; $body }
            $crate::schema::ScalarType::UInt32 => { type $K = u32; $body }
            $crate::schema::ScalarType::Int64 => { type $K = i64; $body }
            $crate::schema::ScalarType::UInt64 => { type $K = u64; $body }
            $crate::schema::ScalarType::Utf8 => { type $K = String; $body }
            $crate::schema::ScalarType::Float32 | $crate::schema::ScalarType::Float64 => $err,
        }
    };
}

pub(crate) use with_key_type;
pub(crate) use with_scalar_type;

impl ScalarType {
    pub fn type_name(self) -> String {
        with_scalar_type!(self, T => short_type_name::<T>())
    }

    /// Types usable as map keys (must be totally ordered).
    pub fn is_key_type(self) -> bool {
        !matches!(self, ScalarType::Float32 | ScalarType::Float64)
    }
}

impl FromStr for ScalarType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let t = match s.trim() {
            "bool" | "Bool" | "Boolean" => ScalarType::Bool,
            "i8" | "char" | "Int8" => ScalarType::Int8,
            "u8" | "unsigned char" | "UInt8" => ScalarType::UInt8,
            "i16" | "short" | "Int16" => ScalarType::Int16,
            "u16" | "unsigned short" | "UInt16" => ScalarType::UInt16,
            "i32" | "int" | "Int32" => ScalarType::Int32,
            "u32" | "unsigned int" | "UInt32" => ScalarType::UInt32,
            "i64" | "long" | "long long" | "Int64" => ScalarType::Int64,
            "u64" | "unsigned long" | "unsigned long long" | "UInt64" => ScalarType::UInt64,
            "f32" | "float" | "Float32" => ScalarType::Float32,
            "f64" | "double" | "Float64" => ScalarType::Float64,
            "String" | "string" | "std::string" | "str" | "Utf8" => ScalarType::Utf8,
            other => return Err(Error::Config(format!("unknown element type '{}'", other))),
        };
        Ok(t)
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_name())
    }
}

/// Storage category of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DataType {
    Scalar(ScalarType),
    Vector(ScalarType),
    Map(ScalarType, ScalarType),
}

impl DataType {
    /// Name of the Rust type this column is stored as.
    pub fn type_name(&self) -> String {
        match *self {
            DataType::Scalar(t) => t.type_name(),
            DataType::Vector(t) => with_scalar_type!(t, T => short_type_name::<Vec<T>>()),
            DataType::Map(k, v) => with_key_type!(
                k,
                K => with_scalar_type!(v, V => short_type_name::<std::collections::BTreeMap<K, V>>()),
                format!("BTreeMap<{}, {}>", k, v)
            ),
        }
    }
}

impl FromStr for DataType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Some(inner) = strip_generic(s, &["Vec", "vector", "std::vector"]) {
            return Ok(DataType::Vector(inner.parse()?));
        }
        if let Some(inner) = strip_generic(s, &["BTreeMap", "map", "std::map"]) {
            let (k, v) = inner
                .split_once(',')
                .ok_or_else(|| Error::Config(format!("map type '{}' needs key and value", s)))?;
            let k: ScalarType = k.parse()?;
            if !k.is_key_type() {
                return Err(Error::Config(format!("'{}' cannot be a map key", k)));
            }
            return Ok(DataType::Map(k, v.parse()?));
        }
        Ok(DataType::Scalar(s.parse()?))
    }
}

fn strip_generic<'a>(s: &'a str, heads: &[&str]) -> Option<&'a str> {
    heads.iter().find_map(|head| {
        s.strip_prefix(head)?
            .trim_start()
            .strip_prefix('<')?
            .strip_suffix('>')
            .map(str::trim)
    })
}

impl TryFrom<String> for DataType {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<DataType> for String {
    fn from(t: DataType) -> Self {
        t.type_name()
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: DataType,
}

impl ColumnSpec {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub columns: Vec<ColumnSpec>,
}

impl Schema {
    pub fn new(columns: Vec<ColumnSpec>) -> Self {
        Self { columns }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_rust_and_legacy_spellings() {
        assert_eq!("i32".parse::<DataType>().unwrap(), DataType::Scalar(ScalarType::Int32));
        assert_eq!(
            "vector<double>".parse::<DataType>().unwrap(),
            DataType::Vector(ScalarType::Float64)
        );
        assert_eq!(
            "BTreeMap<String, f32>".parse::<DataType>().unwrap(),
            DataType::Map(ScalarType::Utf8, ScalarType::Float32)
        );
        assert!("map<float, int>".parse::<DataType>().is_err());
        assert!("quaternion".parse::<DataType>().is_err());
    }

    #[test]
    fn names_match_rust_type_names() {
        assert_eq!(DataType::Vector(ScalarType::UInt32).to_string(), "Vec<u32>");
        assert_eq!(DataType::Scalar(ScalarType::Utf8).to_string(), "String");
        assert_eq!(
            DataType::Map(ScalarType::Int32, ScalarType::Float64).to_string(),
            short_type_name::<std::collections::BTreeMap<i32, f64>>()
        );
    }

    #[test]
    fn column_spec_serde() {
        let spec: ColumnSpec =
            serde_json::from_str(r#"{"name": "jets", "type": "Vec<f32>"}"#).unwrap();
        assert_eq!(spec.data_type, DataType::Vector(ScalarType::Float32));
        let back = serde_json::to_string(&spec).unwrap();
        assert!(back.contains("Vec<f32>"));
    }
}
