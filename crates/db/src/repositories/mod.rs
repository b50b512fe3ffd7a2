use thiserror::Error;

use reviewdesk_core::errors::PersistenceError;

pub mod challenge;
pub mod memory;
pub mod reviewer;

pub use challenge::SqlChallengeRepository;
pub use memory::{InMemoryChallengeStore, InMemoryReviewerStore};
pub use reviewer::SqlReviewerRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("version conflict on `{key}`: expected {expected}, found {actual:?}")]
    Conflict { key: String, expected: u64, actual: Option<u64> },
}

impl From<RepositoryError> for PersistenceError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Database(error) => Self::Unavailable(error.to_string()),
            RepositoryError::Decode(message) => Self::Decode(message),
            RepositoryError::Conflict { key, expected, actual } => {
                Self::VersionConflict { key, expected, actual }
            }
        }
    }
}

pub(crate) fn decode_error(error: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Decode(error.to_string())
}

pub(crate) fn parse_timestamp(
    value: &str,
) -> Result<chrono::DateTime<chrono::Utc>, RepositoryError> {
    chrono::DateTime::parse_from_rfc3339(value)
        .map(|timestamp| timestamp.with_timezone(&chrono::Utc))
        .map_err(|error| RepositoryError::Decode(format!("invalid timestamp `{value}`: {error}")))
}
