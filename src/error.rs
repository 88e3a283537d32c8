//! Errors that reach callers. Persistence and remote-sync failures never do;
//! the store logs and swallows them.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to turn an uploaded file into a structured book.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("unsupported file type: {0}")]
    UnsupportedFormat(String),
    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not structure content: {0}")]
    Unstructured(String),
}

/// Failure of one AI generation request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AiError {
    #[error("{0}")]
    GenerationFailed(String),
    #[error("no book is loaded")]
    NoBookLoaded,
}
