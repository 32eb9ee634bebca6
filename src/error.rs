use thiserror::Error;

#[derive(Error, Debug)]
pub enum TallyError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: i64 },

    #[error("Unknown client: {0}")]
    UnknownClient(i64),

    #[error("Invalid page request: page {page}, page size {page_size} (both must be at least 1)")]
    InvalidPage { page: u32, page_size: u32 },

    #[error("Invalid report filters: {0}")]
    InvalidFilters(String),

    #[error("Failed to generate report: could not fetch page {page}: {reason}")]
    RetrievalFailed { page: u32, reason: String },

    #[error("Failed to render report: {0}")]
    RenderFailed(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, TallyError>;
