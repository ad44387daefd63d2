use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = LogsaiError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum LogsaiError {
    /// The embedding or chat endpoint was unreachable or rejected the request.
    #[error("{service} request failed: {message}")]
    RemoteService {
        service: &'static str,
        message: String,
    },

    #[error("vector dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("got {vectors} vectors for {texts} texts")]
    CountMismatch { vectors: usize, texts: usize },

    #[error("top_k must be at least 1")]
    InvalidTopK,

    #[error("file is {size} bytes, the limit is {limit} bytes")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("'{}' is not valid UTF-8", .0.display())]
    InvalidEncoding(PathBuf),

    #[error("document contains no text")]
    EmptyDocument,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl LogsaiError {
    pub(crate) fn remote(service: &'static str, message: impl Into<String>) -> Self {
        LogsaiError::RemoteService {
            service,
            message: message.into(),
        }
    }
}
