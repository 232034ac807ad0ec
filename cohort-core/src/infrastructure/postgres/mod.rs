//! PostgreSQL adapters for the persistence ports.

mod groups;
mod users;

pub use groups::PostgresGroupDirectory;
pub use users::PostgresUsersRepository;

use crate::error::StoreError;

/// Translate a driver error, surfacing unique-constraint collisions by name.
pub(crate) fn map_sqlx_error(err: sqlx::Error, context: &str) -> StoreError {
    if let Some(db_err) = err.as_database_error()
        && db_err.is_unique_violation()
    {
        return StoreError::UniqueViolation {
            constraint: db_err.constraint().unwrap_or_default().to_string(),
        };
    }
    StoreError::Internal(format!("{context}: {err}"))
}
