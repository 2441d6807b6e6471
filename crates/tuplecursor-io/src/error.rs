use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("schema error: {0}")]
    Schema(String),

    #[error("line {line}: {message}")]
    Row { line: usize, message: String },
}

impl From<Error> for tuplecursor_core::error::Error {
    fn from(e: Error) -> Self {
        tuplecursor_core::error::Error::Source(e.to_string())
    }
}
