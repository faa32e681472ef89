use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, UsageError>;

/// Errors produced by the bundle usage ledger.
#[derive(Debug, thiserror::Error)]
pub enum UsageError {
    #[error("bundle cache root is not configured")]
    CacheRootUnset,

    #[error("bundle cache root {path} does not exist")]
    CacheRootMissing { path: PathBuf },

    #[error("bundle cache root {path} is not a directory")]
    CacheRootNotADirectory { path: PathBuf },

    #[error("invalid QUIVER_USAGE_TIMESTAMP_OVERRIDE value {value:?}: {source}")]
    TimestampOverride {
        value: String,
        source: std::num::ParseIntError,
    },

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
