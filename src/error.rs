use crate::sql::BuildError;
use thiserror::Error;

/// Failure reported by a [`Store`](crate::db::Store) while executing a
/// statement or materializing its rows.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("column {0:?} missing from row")]
    MissingColumn(String),
    #[error("column {column:?}: {reason}")]
    Decode { column: String, reason: String },
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Error returned by repository operations.
///
/// `Build` means this crate assembled a bad statement. `Internal` means the
/// store failed; it is never produced for an empty result.
#[derive(Debug, Error)]
pub enum RepoError {
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error("internal error: {0}")]
    Internal(#[source] StoreError),
}

impl RepoError {
    pub fn is_build(&self) -> bool {
        matches!(self, RepoError::Build(_))
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, RepoError::Internal(_))
    }
}

impl From<StoreError> for RepoError {
    fn from(err: StoreError) -> Self {
        RepoError::Internal(err)
    }
}
