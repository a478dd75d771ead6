//! Centralized API error handling
//!
//! Every failure that reaches a client is an [`ApiError`]. It maps to an HTTP
//! status and a title and renders as a JSON:API error document:
//!
//! ```json
//! {"errors": [{"status": "404", "title": "Resource not found", "detail": "Trip 7 not found"}]}
//! ```

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// A single field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// API error type with HTTP status code mapping
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Validation failed on {} field(s)", .0.len())]
    Validation(Vec<FieldError>),

    #[error("{0}")]
    InternalError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("{0}")]
    ExternalServiceError(String),
}

/// JSON:API error document
#[derive(Debug, Serialize)]
pub struct ErrorDocument {
    pub errors: Vec<ErrorObject>,
}

/// JSON:API error object
#[derive(Debug, Serialize)]
pub struct ErrorObject {
    pub status: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ApiError {
    /// Get the HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ExternalServiceError(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Short, fixed title for the error class
    pub fn title(&self) -> &'static str {
        match self {
            ApiError::NotFound(_) => "Resource not found",
            ApiError::BadRequest(_) => "Bad request",
            ApiError::Unauthorized(_) => "Unauthorized",
            ApiError::Forbidden(_) => "Forbidden",
            ApiError::Conflict(_) => "Conflict",
            ApiError::Validation(_) => "Validation Error",
            ApiError::InternalError(_) | ApiError::DatabaseError(_) => "Internal server error",
            ApiError::ExternalServiceError(_) => "Bad gateway",
        }
    }

    /// Build the JSON:API error document for this error
    pub fn to_document(&self) -> ErrorDocument {
        let status = self.status_code().as_u16().to_string();
        let title = self.title().to_string();

        let errors = match self {
            ApiError::Validation(fields) => fields
                .iter()
                .map(|f| ErrorObject {
                    status: status.clone(),
                    title: title.clone(),
                    detail: Some(if f.field.is_empty() {
                        f.message.clone()
                    } else {
                        format!("{}: {}", f.field, f.message)
                    }),
                })
                .collect(),
            // Internal details stay in the logs
            ApiError::InternalError(_) | ApiError::DatabaseError(_) => vec![ErrorObject {
                status,
                title,
                detail: None,
            }],
            other => vec![ErrorObject {
                status,
                title,
                detail: Some(other.to_string()),
            }],
        };

        ErrorDocument { errors }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();

        match &self {
            ApiError::InternalError(_)
            | ApiError::DatabaseError(_)
            | ApiError::ExternalServiceError(_) => {
                tracing::error!(error = %message, status = %status.as_u16(), "Server error occurred");
            }
            _ => {
                tracing::debug!(error = %message, status = %status.as_u16(), "Client error occurred");
            }
        }

        let mut response = (status, Json(self.to_document())).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            _ => ApiError::DatabaseError(err.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        let mut fields: Vec<FieldError> = err
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string());
                    FieldError::new(field, message)
                })
            })
            .collect();
        // HashMap order is not stable
        fields.sort_by(|a, b| a.field.cmp(&b.field));
        ApiError::Validation(fields)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::ExternalServiceError(err.to_string())
    }
}

/// Result type alias using ApiError
pub type ApiResult<T> = Result<T, ApiError>;

/// Whether a database error is a unique violation on the named constraint
pub fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db) => db.is_unique_violation() && db.constraint() == Some(constraint),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(range(min = 0, max = 100, message = "must be between 0 and 100"))]
        battery_lvl: i32,
        #[validate(length(min = 3))]
        name: String,
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::NotFound("test".to_string()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Conflict("test".to_string()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::Forbidden("test".to_string()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::ExternalServiceError("test".to_string()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ApiError::Validation(vec![]).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_document_carries_detail() {
        let doc = ApiError::NotFound("Trip 7 not found".to_string()).to_document();
        assert_eq!(doc.errors.len(), 1);
        assert_eq!(doc.errors[0].status, "404");
        assert_eq!(doc.errors[0].title, "Resource not found");
        assert_eq!(doc.errors[0].detail.as_deref(), Some("Trip 7 not found"));
    }

    #[test]
    fn test_internal_detail_is_hidden() {
        let doc = ApiError::DatabaseError("relation trips does not exist".to_string()).to_document();
        assert_eq!(doc.errors[0].status, "500");
        assert!(doc.errors[0].detail.is_none());
    }

    #[test]
    fn test_validation_errors_one_entry_per_field() {
        let sample = Sample {
            battery_lvl: 120,
            name: "ab".to_string(),
        };
        let err: ApiError = sample.validate().unwrap_err().into();
        let doc = err.to_document();

        assert_eq!(doc.errors.len(), 2);
        assert!(doc.errors.iter().all(|e| e.status == "422"));
        assert_eq!(
            doc.errors[0].detail.as_deref(),
            Some("battery_lvl: must be between 0 and 100")
        );
        assert_eq!(doc.errors[1].detail.as_deref(), Some("name: length"));
    }
}
