// HTTP API Error Types
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::database::DatabaseError;

/// Field name -> client-facing message
pub type FieldErrors = BTreeMap<String, String>;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError {
        message: String,
        errors: FieldErrors,
    },

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden {
        message: String,
        errors: Option<FieldErrors>,
    },

    // 404 Not Found
    NotFound(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::ValidationError { .. } => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden { .. } => 403,
            ApiError::NotFound(_) => 404,
            ApiError::InternalServerError(_) => 500,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::ValidationError { message, .. } => message,
            ApiError::Unauthorized(msg) => msg,
            ApiError::Forbidden { message, .. } => message,
            ApiError::NotFound(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            ApiError::ValidationError { errors, .. } => Some(errors),
            ApiError::Forbidden { errors, .. } => errors.as_ref(),
            _ => None,
        }
    }

    /// Convert to JSON response body: `{message, statusCode, errors?}`
    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "message": self.message(),
            "statusCode": self.status_code(),
        });

        if let Some(errors) = self.field_errors() {
            body["errors"] = json!(errors);
        }

        body
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation_error(message: impl Into<String>, errors: FieldErrors) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            errors,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn authentication_required() -> Self {
        ApiError::Unauthorized("Authentication required".to_string())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden {
            message: message.into(),
            errors: None,
        }
    }

    pub fn forbidden_with(message: impl Into<String>, errors: FieldErrors) -> Self {
        ApiError::Forbidden {
            message: message.into(),
            errors: Some(errors),
        }
    }

    pub fn spot_not_found() -> Self {
        ApiError::NotFound("Spot couldn't be found".to_string())
    }

    pub fn review_not_found() -> Self {
        ApiError::NotFound("Review couldn't be found".to_string())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::ConfigMissing(_) | DatabaseError::InvalidDatabaseUrl => {
                tracing::error!("Database configuration error: {}", err);
                ApiError::service_unavailable("Database temporarily unavailable")
            }
            DatabaseError::UniqueViolation(_)
            | DatabaseError::ExclusionViolation(_)
            | DatabaseError::OwnerMissing(..)
            | DatabaseError::ImageLimit(..) => {
                // Handlers translate the violations they expect; anything reaching here was not expected
                tracing::error!("Unhandled store violation: {}", err);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
            DatabaseError::Migration(e) => {
                tracing::error!("Migration error: {}", e);
                ApiError::service_unavailable("Service is being updated, please try again later")
            }
            DatabaseError::Sqlx(sqlx_err) => {
                // Log the real error but return generic message
                tracing::error!("SQLx error: {}", sqlx_err);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Rejected JSON body: {}", rejection.body_text());
        match rejection {
            JsonRejection::MissingJsonContentType(_) => {
                ApiError::bad_request("Request body must be JSON (Content-Type: application/json)")
            }
            JsonRejection::JsonSyntaxError(_) => ApiError::bad_request("Request body is not valid JSON"),
            JsonRejection::JsonDataError(_) => ApiError::bad_request("Request body must be a JSON object"),
            other => ApiError::bad_request(other.body_text()),
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_envelope_has_message_and_status() {
        let body = ApiError::spot_not_found().to_json();
        assert_eq!(body["message"], "Spot couldn't be found");
        assert_eq!(body["statusCode"], 404);
        assert!(body.get("errors").is_none());
    }

    #[test]
    fn validation_envelope_carries_field_errors() {
        let mut errors = FieldErrors::new();
        errors.insert("city".to_string(), "City is required".to_string());
        let err = ApiError::validation_error("Validation Error", errors);

        assert_eq!(err.status_code(), 400);
        let body = err.to_json();
        assert_eq!(body["errors"]["city"], "City is required");
    }

    #[test]
    fn sqlx_errors_do_not_leak_details() {
        let err: ApiError = DatabaseError::Sqlx(sqlx::Error::PoolTimedOut).into();
        assert_eq!(err.status_code(), 500);
        assert!(!err.message().to_lowercase().contains("pool"));
    }
}
