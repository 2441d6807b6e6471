//! Reader session configuration.
//!
//! Defaults match a plain reader: errors returned to the caller, no prefix,
//! lazy attachment of every column, exact type matching.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Which scalar shadow columns to materialize every row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScalarConversions {
    /// `f64` column `x` gets an `f32` shadow `x___f`.
    pub double_to_float: bool,
    /// `f32` column `x` gets an `f64` shadow `x___d`.
    pub float_to_double: bool,
    /// `i32` column `x` gets an `f32` shadow `x___i`.
    pub int_to_float: bool,
}

impl ScalarConversions {
    /// Double to float and int to float.
    pub fn legacy() -> Self {
        Self {
            double_to_float: true,
            float_to_double: false,
            int_to_float: true,
        }
    }

    pub fn any(&self) -> bool {
        self.double_to_float || self.float_to_double || self.int_to_float
    }
}

/// Which vector shadow columns to materialize every row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorConversions {
    /// `Vec<f64>` to `Vec<f32>`, suffix `f`.
    pub double_to_float: bool,
    /// `Vec<f32>` to `Vec<f64>`, suffix `d`.
    pub float_to_double: bool,
    /// `Vec<u32>` to `Vec<i32>`, suffix `i`.
    pub uint_to_int: bool,
    /// `Vec<f32>` to `Vec<i32>`, suffix `a`.
    pub float_to_int: bool,
}

impl VectorConversions {
    /// Double to float only.
    pub fn legacy() -> Self {
        Self {
            double_to_float: true,
            ..Self::default()
        }
    }

    pub fn any(&self) -> bool {
        self.double_to_float || self.float_to_double || self.uint_to_int || self.float_to_int
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Return registration and pipeline failures to the caller.
    pub rethrow: bool,
    /// Tried before the bare name on every lookup.
    pub prefix: String,
    /// Columns attached at construction. Empty means attach on first use.
    pub active_columns: Vec<String>,
    /// alias -> column name
    pub aliases: BTreeMap<String, String>,
    /// Resolve mismatched requests to `name___<suffix>` shadow columns.
    pub conversion_lookup: bool,
    pub scalar_conversions: ScalarConversions,
    pub vector_conversions: VectorConversions,
    /// Skip derived-variable computation on every row.
    pub update_disabled: bool,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            rethrow: true,
            prefix: String::new(),
            active_columns: Vec::new(),
            aliases: BTreeMap::new(),
            conversion_lookup: false,
            scalar_conversions: ScalarConversions::default(),
            vector_conversions: VectorConversions::default(),
            update_disabled: false,
        }
    }
}

impl ReaderConfig {
    /// Defaults overlaid with `TUPLECURSOR_*` environment variables.
    ///
    /// - `TUPLECURSOR_RETHROW`: `true`/`false`/`1`/`0`
    /// - `TUPLECURSOR_PREFIX`: name prefix
    /// - `TUPLECURSOR_ACTIVE`: comma-separated column names
    /// - `TUPLECURSOR_CONVERSION_LOOKUP`: `true`/`false`/`1`/`0`
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars(get: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();
        if let Some(v) = get("TUPLECURSOR_RETHROW").and_then(|v| parse_flag("TUPLECURSOR_RETHROW", &v)) {
            cfg.rethrow = v;
        }
        if let Some(prefix) = get("TUPLECURSOR_PREFIX") {
            cfg.prefix = prefix;
        }
        if let Some(active) = get("TUPLECURSOR_ACTIVE") {
            cfg.active_columns = active
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(v) = get("TUPLECURSOR_CONVERSION_LOOKUP")
            .and_then(|v| parse_flag("TUPLECURSOR_CONVERSION_LOOKUP", &v))
        {
            cfg.conversion_lookup = v;
        }
        cfg
    }

    /// Conversion lookup is on when asked for or when any shadow is produced.
    pub fn conversion_active(&self) -> bool {
        self.conversion_lookup || self.scalar_conversions.any() || self.vector_conversions.any()
    }
}

fn parse_flag(key: &str, value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        other => {
            tracing::warn!(key, value = other, "ignoring unparsable flag");
            None
        }
    }
}
