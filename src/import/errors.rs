use thiserror::Error;

/// Result type for import operations
pub type ImportResult<T> = Result<T, ImportError>;

/// Failures while importing external JSON documents.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The input was not parseable JSON.
    #[error("malformed JSON document: {0}")]
    MalformedJson(#[from] serde_json::Error),

    /// The document root must be a JSON object to split by key.
    #[error("import document must be a JSON object, got {0}")]
    NotAnObject(&'static str),
}
