//! Storage-specific error type wrapping sqlx errors.

use std::str::FromStr;

use cmms_domain::error::{CmmsError, NotFoundError};

/// Errors originating from the `SQLite` storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A query or connection failed.
    #[error("database error")]
    Database(#[from] sqlx::Error),

    /// Failed to serialize or deserialize a stored JSON value.
    #[error("JSON error")]
    Json(#[from] serde_json::Error),

    /// Failed to run migrations.
    #[error("migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl From<StorageError> for CmmsError {
    fn from(err: StorageError) -> Self {
        Self::Storage(Box::new(err))
    }
}

/// Error returned when a write matched no row.
pub(crate) fn not_found(entity: &'static str, id: impl ToString) -> CmmsError {
    NotFoundError {
        entity,
        id: id.to_string(),
    }
    .into()
}

/// Parse a stored text column, reporting failures as decode errors.
pub(crate) fn decode<T>(raw: &str) -> Result<T, sqlx::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.parse().map_err(|err| sqlx::Error::Decode(Box::new(err)))
}

/// Parse an optional stored text column.
pub(crate) fn decode_opt<T>(raw: Option<String>) -> Result<Option<T>, sqlx::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.as_deref().map(decode).transpose()
}
