/// Error types for Entries Service
///
/// Store-level `NotFound`/`Conflict` travel through typed so the edge can
/// branch on them. Blob I/O failures are wrapped with the key they concern.
use crate::storage::BlobError;
use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

/// Result type for entries-service operations
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Post (or its content) does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Slug already in use
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Writing a blob failed
    #[error("Upload of '{key}' failed: {source}")]
    UploadFailed {
        key: String,
        #[source]
        source: BlobError,
    },

    /// Reading a blob failed
    #[error("Download of '{key}' failed: {source}")]
    DownloadFailed {
        key: String,
        #[source]
        source: BlobError,
    },

    /// Removing a blob (or a blob prefix) failed
    #[error("Delete of '{key}' failed: {source}")]
    DeleteFailed {
        key: String,
        #[source]
        source: BlobError,
    },

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Request fields failed edge validation
    #[error("Validation failed")]
    Validation(HashMap<String, String>),

    /// Bad request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Operation exceeded its deadline and was cancelled
    #[error("Operation timed out")]
    Timeout,

    /// Missing or wrong API key
    #[error("missing or invalid API key")]
    Unauthorized,
}

impl AppError {
    pub fn upload(key: impl Into<String>, source: BlobError) -> Self {
        AppError::UploadFailed {
            key: key.into(),
            source,
        }
    }

    pub fn download(key: impl Into<String>, source: BlobError) -> Self {
        AppError::DownloadFailed {
            key: key.into(),
            source,
        }
    }

    pub fn delete(key: impl Into<String>, source: BlobError) -> Self {
        AppError::DeleteFailed {
            key: key.into(),
            source,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, AppError::Conflict(_))
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Unauthorized => "UNAUTHORIZED",
            AppError::Timeout => "TIMEOUT",
            _ => "INTERNAL_ERROR",
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a HashMap<String, String>>,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            AppError::UploadFailed { .. }
            | AppError::DownloadFailed { .. }
            | AppError::DeleteFailed { .. }
            | AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = if status.is_server_error() && !matches!(self, AppError::Timeout) {
            tracing::error!(error = %self, "request failed");
            "internal server error".to_string()
        } else {
            self.to_string()
        };

        let details = match self {
            AppError::Validation(fields) => Some(fields),
            _ => None,
        };

        let body = ErrorBody {
            code: self.code(),
            message,
            details,
        };

        HttpResponse::build(status).json(serde_json::json!({ "error": body }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::Conflict("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::upload("posts/a.md", BlobError::Backend("boom".into())).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(AppError::Timeout.status_code(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            AppError::Unauthorized.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::BadRequest("invalid JSON body".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[actix_web::test]
    async fn test_internal_errors_are_not_echoed() {
        let err = AppError::download("posts/a.md", BlobError::Backend("secret detail".into()));
        let body = to_bytes(err.error_response().into_body()).await.unwrap();
        let body = String::from_utf8(body.to_vec()).unwrap();
        assert!(body.contains("INTERNAL_ERROR"));
        assert!(!body.contains("secret detail"));
    }

    #[actix_web::test]
    async fn test_validation_details_are_returned() {
        let mut fields = HashMap::new();
        fields.insert("slug".to_string(), "required".to_string());
        let body = to_bytes(AppError::Validation(fields).error_response().into_body())
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"]["code"], "VALIDATION_ERROR");
        assert_eq!(json["error"]["details"]["slug"], "required");
    }
}
