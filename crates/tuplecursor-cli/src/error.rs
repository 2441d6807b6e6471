use thiserror::Error;

pub type Result<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("input: {0}")]
    Input(#[from] tuplecursor_io::error::Error),

    #[error(transparent)]
    Reader(#[from] tuplecursor_core::error::Error),

    #[error("{0}")]
    Usage(String),
}

impl CliError {
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            CliError::Reader(e) => e.suggestions(),
            CliError::Usage(_) => vec!["Run `tuplecursor columns --config <yaml>` to list columns".into()],
            _ => vec![],
        }
    }
}
