use thiserror::Error;

/// Failures of board-scoped storage operations.
#[derive(Debug, Error)]
pub enum BoardError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("{0}")]
    Conflict(&'static str),

    #[error("{0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("DB lock poisoned")]
    Poisoned,
}

pub type BoardResult<T> = Result<T, BoardError>;
