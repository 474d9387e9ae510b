use storage::error::StorageError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ImporterError>;

#[derive(Error, Debug)]
pub enum ImporterError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Failed to parse provider response: {0}")]
    ParseError(String),

    #[error("Storage error: {0}")]
    StorageError(#[from] storage::error::StorageError),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Bridge is not configured with a competition")]
    NotConfigured,

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ImporterError {
    /// The record itself was refused, as opposed to the store or transport
    /// being unavailable. Refused records are not worth retrying.
    pub fn is_rejection(&self) -> bool {
        match self {
            ImporterError::StorageError(e) => matches!(
                e,
                StorageError::Validation { .. } | StorageError::InvalidTransition(_) | StorageError::NotFound
            ),
            ImporterError::ParseError(_) | ImporterError::ProviderError(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_refused_records_are_rejections() {
        let refused = ImporterError::StorageError(StorageError::Validation {
            field: "control_code".to_string(),
            message: "unknown control 99".to_string(),
        });
        assert!(refused.is_rejection());
        assert!(ImporterError::StorageError(StorageError::InvalidTransition("finished".to_string())).is_rejection());

        let outage = ImporterError::StorageError(StorageError::Io(std::io::Error::other("database is locked")));
        assert!(!outage.is_rejection());
        assert!(!ImporterError::IoError(std::io::Error::other("disk full")).is_rejection());
    }
}
