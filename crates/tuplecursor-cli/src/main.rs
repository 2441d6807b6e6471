//! tuplecursor CLI: inspect event files through a typed reader session.

mod error;
mod input;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use tracing_subscriber::EnvFilter;
use tuplecursor_core::schema::DataType;
use tuplecursor_core::value::{read_cell, Datum};
use tuplecursor_io::MemorySource;
use tuplecursor_reader::EventReader;

use crate::error::{CliError, Result};
use crate::input::InputFile;

#[derive(Parser)]
#[command(name = "tuplecursor")]
#[command(about = "Typed, on-demand access to columns of event files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every known column with its type
    Columns {
        /// Path to the input YAML file
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Describe one column
    Describe {
        #[arg(short, long)]
        config: PathBuf,

        /// Column name (aliases and prefix apply)
        column: String,
    },

    /// Print columns row by row
    Dump {
        #[arg(short, long)]
        config: PathBuf,

        /// Comma-separated columns to print (default: all declared columns)
        #[arg(long, value_delimiter = ',')]
        columns: Option<Vec<String>>,

        /// Stop after this many rows
        #[arg(long)]
        limit: Option<usize>,

        /// First row to print
        #[arg(long, default_value_t = 0)]
        start: usize,

        /// Name prefix (overrides the YAML reader block)
        #[arg(long)]
        prefix: Option<String>,

        /// One JSON object per row
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Columns { config } => list_columns(&config),
        Commands::Describe { config, column } => describe_column(&config, &column),
        Commands::Dump {
            config,
            columns,
            limit,
            start,
            prefix,
            json,
        } => dump(&config, columns, limit, start, prefix, json),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        for hint in e.suggestions() {
            eprintln!("  hint: {}", hint);
        }
        std::process::exit(1);
    }
}

fn open_reader(config: &Path, prefix: Option<String>) -> Result<(InputFile, EventReader<MemorySource>)> {
    let input = InputFile::load(config)?;
    let mut reader_cfg = input.reader_config();
    if let Some(prefix) = prefix {
        reader_cfg.prefix = prefix;
    }
    let source = input.open()?;
    let tr = EventReader::with_config(source, &reader_cfg)?;
    Ok((input, tr))
}

fn list_columns(config: &Path) -> Result<()> {
    let (_, tr) = open_reader(config, None)?;
    println!("{} ({} events)", tr.file_name(), tr.row_count());
    let stdout = io::stdout();
    tr.print_tuple_members(&mut stdout.lock())?;
    Ok(())
}

fn describe_column(config: &Path, column: &str) -> Result<()> {
    let (_, tr) = open_reader(config, None)?;
    if !tr.has_var(column) {
        return Err(CliError::Reader(tuplecursor_core::error::Error::not_found(column, "<any>")));
    }
    for line in tr.tuple_specs(column) {
        println!("{}", line);
    }
    Ok(())
}

fn dump(
    config: &Path,
    columns: Option<Vec<String>>,
    limit: Option<usize>,
    start: usize,
    prefix: Option<String>,
    json: bool,
) -> Result<()> {
    let (input, mut tr) = open_reader(config, prefix)?;
    let names = columns.unwrap_or_else(|| input.columns.iter().map(|c| c.name.clone()).collect());

    let mut types = Vec::with_capacity(names.len());
    for name in &names {
        if !tr.activate(name)? {
            return Err(CliError::Usage(format!("unknown column '{}'", name)));
        }
        let data_type: DataType = tr.column_type(name)?.parse()?;
        types.push(data_type);
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut loaded = if start > 0 {
        tr.go_to_event(start as i64)?
    } else {
        tr.next_event()?
    };
    let mut printed = 0;
    while loaded {
        let row = tr.current_row().unwrap_or_default();
        let values: Vec<Datum> = names
            .iter()
            .zip(&types)
            .map(|(name, dt)| {
                tr.column_any(name)
                    .and_then(|cell| read_cell(dt, cell))
                    .unwrap_or(Datum::Null)
            })
            .collect();
        if json {
            let mut obj = Map::new();
            obj.insert("row".into(), Value::from(row));
            for (name, value) in names.iter().zip(&values) {
                obj.insert(name.clone(), to_json(value));
            }
            writeln!(out, "{}", serde_json::to_string(&Value::Object(obj))?)?;
        } else {
            let fields: Vec<String> = names
                .iter()
                .zip(&values)
                .map(|(name, value)| format!("{}={}", name, value))
                .collect();
            writeln!(out, "row {}: {}", row, fields.join(" "))?;
        }
        printed += 1;
        if limit.is_some_and(|l| printed >= l) {
            break;
        }
        loaded = tr.next_event()?;
    }
    tracing::debug!(rows = printed, "dump finished");
    Ok(())
}

fn to_json(d: &Datum) -> Value {
    match d {
        Datum::Null => Value::Null,
        Datum::Bool(b) => Value::Bool(*b),
        Datum::Int(i) => Value::from(*i),
        Datum::UInt(u) => Value::from(*u),
        Datum::Float(x) => Value::from(*x),
        Datum::Str(s) => Value::String(s.clone()),
        Datum::List(items) => Value::Array(items.iter().map(to_json).collect()),
        Datum::Map(entries) => Value::Object(
            entries
                .iter()
                .map(|(k, v)| {
                    let key = match k {
                        Datum::Str(s) => s.clone(),
                        other => other.to_string(),
                    };
                    (key, to_json(v))
                })
                .collect(),
        ),
    }
}
