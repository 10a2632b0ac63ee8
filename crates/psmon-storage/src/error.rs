/// Errors that can occur within the storage layer.
///
/// # Examples
///
/// ```rust
/// use psmon_storage::error::StorageError;
///
/// let err = StorageError::InvalidArgument {
///     name: "days",
///     reason: "must be positive".to_string(),
/// };
/// assert!(err.to_string().contains("days"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// An underlying SQLite error.
    #[error("Storage: SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Creating or securing the database directory failed.
    #[error("Storage: I/O error on {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    /// A caller passed a value outside the accepted range.
    #[error("Storage: invalid argument '{name}': {reason}")]
    InvalidArgument { name: &'static str, reason: String },
}

/// Convenience `Result` alias for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
