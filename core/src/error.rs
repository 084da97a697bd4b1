use thiserror::Error;

/// Failure taxonomy for coordinator and store operations.
///
/// `NotFound` and `Validation` are returned to the initiating intent;
/// `Store` is a persistence I/O failure and is retryable. None of these
/// are ever allowed to take the process down.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("store failure: {0}")]
    Store(String),
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Store(err.to_string())
    }
}

impl Error {
    /// Whether retrying the same operation could succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Store(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
