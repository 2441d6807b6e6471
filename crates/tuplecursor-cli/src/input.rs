//! Input description loaded from YAML.
//!
//! ```yaml
//! path: events.jsonl        # relative to the YAML file
//! format: jsonl             # or csv; inferred from the extension when omitted
//! columns:
//!   - { name: run, type: u32 }
//!   - { name: pt, type: "Vec<f64>" }
//! reader:
//!   prefix: "reco_"
//!   aliases: { energy: e }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tuplecursor_core::config::ReaderConfig;
use tuplecursor_core::schema::{ColumnSpec, Schema};
use tuplecursor_core::source::EventSource;
use tuplecursor_io::{CsvReader, JsonlReader, MemorySource};

use crate::error::{CliError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Jsonl,
    Csv,
}

#[derive(Debug, Deserialize)]
pub struct InputFile {
    pub path: PathBuf,
    #[serde(default)]
    pub format: Option<Format>,
    pub columns: Vec<ColumnSpec>,
    /// Session options; `TUPLECURSOR_*` environment variables when absent.
    #[serde(default)]
    pub reader: Option<ReaderConfig>,
}

impl InputFile {
    /// Parse the YAML at `config`; `path` is made relative to its directory.
    pub fn load(config: &Path) -> Result<Self> {
        let text = fs::read_to_string(config)?;
        let mut input: InputFile = serde_yaml::from_str(&text)?;
        if input.path.is_relative() {
            if let Some(dir) = config.parent() {
                input.path = dir.join(&input.path);
            }
        }
        if input.columns.is_empty() {
            return Err(CliError::Usage("input declares no columns".into()));
        }
        Ok(input)
    }

    pub fn reader_config(&self) -> ReaderConfig {
        self.reader.clone().unwrap_or_else(ReaderConfig::from_env)
    }

    pub fn format(&self) -> Result<Format> {
        if let Some(f) = self.format {
            return Ok(f);
        }
        match self.path.extension().and_then(|e| e.to_str()) {
            Some("jsonl") | Some("ndjson") | Some("json") => Ok(Format::Jsonl),
            Some("csv") => Ok(Format::Csv),
            _ => Err(CliError::Usage(format!(
                "cannot infer format of {}; set `format: jsonl|csv`",
                self.path.display()
            ))),
        }
    }

    /// Read the whole file into an in-memory source.
    pub fn open(&self) -> Result<MemorySource> {
        let schema = Schema::new(self.columns.clone());
        let path = self.path.to_string_lossy().into_owned();
        let source = match self.format()? {
            Format::Jsonl => JsonlReader::from_path(&path, schema)?.into_source(path.clone())?,
            Format::Csv => CsvReader::from_path(&path, schema)?.into_source(path.clone())?,
        };
        tracing::info!(file = %path, rows = source.row_count(), "loaded input");
        Ok(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_relative_path_and_infers_format() {
        let dir = tempfile::tempdir().unwrap();
        let mut data = fs::File::create(dir.path().join("ev.jsonl")).unwrap();
        writeln!(data, "{{\"n\": 1, \"pt\": [0.5]}}").unwrap();
        writeln!(data, "{{\"n\": 2, \"pt\": []}}").unwrap();
        let cfg = dir.path().join("input.yaml");
        fs::write(
            &cfg,
            "path: ev.jsonl\ncolumns:\n  - { name: n, type: i32 }\n  - { name: pt, type: \"Vec<f64>\" }\nreader:\n  prefix: x_\n",
        )
        .unwrap();

        let input = InputFile::load(&cfg).unwrap();
        assert_eq!(input.format().unwrap(), Format::Jsonl);
        let cfg = input.reader_config();
        assert_eq!(cfg.prefix, "x_");
        assert!(cfg.rethrow);
        let src = input.open().unwrap();
        assert_eq!(src.row_count(), 2);
    }

    #[test]
    fn unknown_extension_needs_explicit_format() {
        let input: InputFile =
            serde_yaml::from_str("path: data.bin\ncolumns: [{ name: n, type: i32 }]\n").unwrap();
        assert!(matches!(input.format(), Err(CliError::Usage(_))));
    }
}
