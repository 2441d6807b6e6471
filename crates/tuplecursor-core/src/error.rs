use thiserror::Error;

/// Canonical result for core.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Variable not found: \"{name}\" with type \"{requested}\"")]
    NotFound { name: String, requested: String },

    #[error("Variable not found: \"{name}\" with type \"{requested}\", but is found with type \"{actual}\"")]
    TypeMismatch {
        name: String,
        requested: String,
        actual: String,
    },

    #[error("You are trying to redefine a tuple var: \"{0}\". Please choose a unique name.")]
    DuplicateName(String),

    #[error("Registration after tuple reading began: {0}")]
    UsagePastInit(String),

    #[error("Event {row} is out of range (source has {rows} events)")]
    OutOfRange { row: i64, rows: usize },

    // Sources map their own I/O and decoding failures into this variant.
    #[error("Source error: {0}")]
    Source(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Error with context chain for better debugging
    #[error("Error in {context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl Error {
    /// Add context to an error, creating an error chain.
    ///
    /// # Example
    /// ```rust,no_run
    /// use tuplecursor_core::error::Error;
    /// let err = Error::DuplicateName("met".into());
    /// let err = err.with_context("while registering derived variables");
    /// ```
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Error::Context {
            context: context.into(),
            source: Box::new(self) as Box<dyn std::error::Error + Send + Sync>,
        }
    }

    pub fn not_found(name: impl Into<String>, requested: impl Into<String>) -> Self {
        Error::NotFound {
            name: name.into(),
            requested: requested.into(),
        }
    }

    pub fn type_mismatch(
        name: impl Into<String>,
        requested: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Error::TypeMismatch {
            name: name.into(),
            requested: requested.into(),
            actual: actual.into(),
        }
    }

    /// True for the lookup failures a typed accessor can produce.
    pub fn is_lookup_failure(&self) -> bool {
        matches!(self, Error::NotFound { .. } | Error::TypeMismatch { .. })
    }

    /// Get suggestions for common errors.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Error::NotFound { .. } => vec![
                "Check that the variable name is spelled correctly".into(),
                "Check the name prefix and aliases configured on the reader".into(),
            ],
            Error::TypeMismatch { actual, .. } => vec![
                format!("Request the variable with its stored type \"{}\"", actual),
                "Enable conversion mode if a shadow column of the requested type exists".into(),
            ],
            Error::DuplicateName(_) => {
                vec!["Derived variables must not shadow tuple variables".into()]
            }
            Error::UsagePastInit(_) => vec![
                "Register functions before the first call to next_event/go_to_event".into(),
            ],
            Error::OutOfRange { rows, .. } => {
                vec![format!("Valid events are 0..{}", rows)]
            }
            Error::Context { source, .. } => match source.downcast_ref::<Error>() {
                Some(inner) => inner.suggestions(),
                None => vec![],
            },
            _ => vec![],
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Config(e.to_string())
    }
}
