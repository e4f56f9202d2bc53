//! # Database Error Types
//!
//! ```text
//! sqlx::Error ──► DbError ──┬──► ProfitLedger: logged, absorbed (fail open)
//!                           └──► ApiError: status + { error, code } body
//! ```
//!
//! Constraint failures are classified with [`sqlx::error::ErrorKind`] so the
//! API can answer 400 for bad input and 500 only for real faults.

use sqlx::error::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    /// No such row for this owner. Rows of other owners are reported the
    /// same way.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A UNIQUE index rejected the write (item code per shop, account email).
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Usually an owner id that has no account row.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// A CHECK such as `quantity >= 0` failed.
    #[error("Check constraint failed: {message}")]
    CheckViolation { message: String },

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Every pooled connection stayed busy past the acquire timeout.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl ToString) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(self, DbError::UniqueViolation { .. })
    }
}

/// Column named last in SQLite's `UNIQUE constraint failed: t.a, t.b`.
///
/// For composite keys such as `(user_id, item_code)` the last column is the
/// one the user typed.
fn unique_column(message: &str) -> String {
    message
        .rsplit(&[' ', ','][..])
        .find(|part| !part.is_empty())
        .and_then(|qualified| qualified.rsplit('.').next())
        .unwrap_or("value")
        .to_string()
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();
                match db_err.kind() {
                    ErrorKind::UniqueViolation => DbError::UniqueViolation {
                        field: unique_column(&message),
                        value: "unknown".to_string(),
                    },
                    ErrorKind::ForeignKeyViolation => DbError::ForeignKeyViolation { message },
                    ErrorKind::CheckViolation | ErrorKind::NotNullViolation => {
                        DbError::CheckViolation { message }
                    }
                    _ => DbError::QueryFailed(message),
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::db_with_owner;

    #[test]
    fn test_unique_column() {
        assert_eq!(
            unique_column("UNIQUE constraint failed: items.user_id, items.item_code"),
            "item_code"
        );
        assert_eq!(unique_column("UNIQUE constraint failed: users.email"), "email");
    }

    #[tokio::test]
    async fn test_constraint_kinds_are_classified() {
        let (db, owner) = db_with_owner().await;

        let negative = sqlx::query(
            "INSERT INTO items (user_id, item_code, item_name, quantity) VALUES (?, 'NEG', 'Neg', -1)",
        )
        .bind(owner)
        .execute(db.pool())
        .await
        .unwrap_err();
        assert!(matches!(DbError::from(negative), DbError::CheckViolation { .. }));

        let orphan = sqlx::query(
            "INSERT INTO items (user_id, item_code, item_name, quantity) VALUES (9999, 'ORPH', 'Orphan', 1)",
        )
        .execute(db.pool())
        .await
        .unwrap_err();
        assert!(matches!(DbError::from(orphan), DbError::ForeignKeyViolation { .. }));
    }
}
