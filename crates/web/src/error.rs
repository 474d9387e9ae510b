use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use importer::ImporterError;
use serde_json::json;
use std::fmt;
use storage::error::StorageError;
use validator::ValidationErrors;

/// Web layer errors
#[derive(Debug)]
pub enum WebError {
    Storage(StorageError),
    Importer(ImporterError),
    Validation(ValidationErrors),
    BadRequest(String),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage(e) => write!(f, "Storage error: {}", e),
            Self::Importer(e) => write!(f, "Importer error: {}", e),
            Self::Validation(e) => write!(f, "Validation error: {}", e),
            Self::BadRequest(msg) => write!(f, "Bad request: {}", msg),
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status_code = match &self {
            Self::Storage(e) | Self::Importer(ImporterError::StorageError(e)) => storage_status(e),
            Self::Importer(ImporterError::NotConfigured) => StatusCode::CONFLICT,
            Self::Importer(ImporterError::CsvError(_)) => StatusCode::BAD_REQUEST,
            Self::Importer(_) => StatusCode::BAD_GATEWAY,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        let body = match &self {
            Self::Storage(e) | Self::Importer(ImporterError::StorageError(e)) => storage_body(e),
            Self::Importer(e @ (ImporterError::NotConfigured | ImporterError::CsvError(_))) => {
                json!({
                    "error": e.to_string()
                })
            }
            Self::Importer(e) => {
                tracing::error!("Importer error: {:?}", e);
                json!({
                    "error": "External provider request failed"
                })
            }
            Self::Validation(errors) => {
                let field_errors: Vec<String> = errors
                    .field_errors()
                    .iter()
                    .flat_map(|(field, errors)| {
                        errors.iter().map(move |e| {
                            format!(
                                "{}: {}",
                                field,
                                e.message
                                    .as_ref()
                                    .map(|m| m.to_string())
                                    .unwrap_or_else(|| e.code.to_string())
                            )
                        })
                    })
                    .collect();

                json!({
                    "error": "Validation failed",
                    "details": field_errors
                })
            }
            Self::BadRequest(msg) => {
                json!({
                    "error": msg
                })
            }
        };

        (status_code, Json(body)).into_response()
    }
}

fn storage_status(error: &StorageError) -> StatusCode {
    match error {
        StorageError::NotFound => StatusCode::NOT_FOUND,
        StorageError::ConstraintViolation(_)
        | StorageError::Referential(_)
        | StorageError::InvalidTransition(_) => StatusCode::CONFLICT,
        StorageError::Validation { .. } => StatusCode::BAD_REQUEST,
        StorageError::ConfirmationRequired => StatusCode::PRECONDITION_FAILED,
        StorageError::Backup(_) => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn storage_body(error: &StorageError) -> serde_json::Value {
    match error {
        StorageError::NotFound => json!({
            "error": "Resource not found"
        }),
        StorageError::ConstraintViolation(msg)
        | StorageError::Referential(msg)
        | StorageError::InvalidTransition(msg) => json!({
            "error": msg
        }),
        StorageError::Validation { field, message } => json!({
            "error": "Validation failed",
            "details": [format!("{field}: {message}")]
        }),
        StorageError::ConfirmationRequired | StorageError::Backup(_) => json!({
            "error": error.to_string()
        }),
        e => {
            tracing::error!("Storage error: {:?}", e);
            json!({
                "error": "An internal error occurred"
            })
        }
    }
}

impl From<StorageError> for WebError {
    fn from(error: StorageError) -> Self {
        Self::Storage(error)
    }
}

impl From<ImporterError> for WebError {
    fn from(error: ImporterError) -> Self {
        Self::Importer(error)
    }
}

impl From<ValidationErrors> for WebError {
    fn from(error: ValidationErrors) -> Self {
        Self::Validation(error)
    }
}

pub type WebResult<T> = Result<T, WebError>;
