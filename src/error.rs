#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("table {table}: row {row} is unreadable: {reason}")]
    CorruptRow {
        table: String,
        row: usize,
        reason: String,
    },

    #[error("table {table}: line {line} is not valid UTF-8")]
    NotUtf8 { table: String, line: usize },

    #[error("not an access key: {0:?}")]
    InvalidKey(String),

    #[error("email and phone are registered to different students")]
    IdentityConflict,

    #[error("could not draw an unused access key after {0} attempts")]
    KeySpaceExhausted(usize),

    #[error("{0}")]
    Validation(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    /// Stable code used in IPC error responses.
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::InvalidKey(_) => "invalid_access_key",
            StoreError::IdentityConflict => "identity_conflict",
            StoreError::Validation(_) => "bad_params",
            _ => "store_failed",
        }
    }
}
