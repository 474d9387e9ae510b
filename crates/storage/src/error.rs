use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("Referential error: {0}")]
    Referential(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Restore requires explicit confirmation")]
    ConfirmationRequired,

    #[error("Backup error: {0}")]
    Backup(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StorageError>;

impl StorageError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            StorageError::Database(sqlx::Error::Database(e)) if e.is_unique_violation()
        )
    }

    pub fn is_foreign_key_violation(&self) -> bool {
        matches!(
            self,
            StorageError::Database(sqlx::Error::Database(e)) if e.is_foreign_key_violation()
        )
    }
}

/// Maps a unique-constraint failure on insert/update to a readable conflict.
pub(crate) fn unique_conflict(message: &str) -> impl FnOnce(sqlx::Error) -> StorageError + '_ {
    move |e| {
        let err = StorageError::from(e);
        if err.is_unique_violation() {
            StorageError::ConstraintViolation(message.to_string())
        } else {
            err
        }
    }
}
