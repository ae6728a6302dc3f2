//! API error taxonomy.
//!
//! Authorization failures are decided before any mutation and surfaced as-is.
//! Database errors are logged and returned as a generic internal error, except
//! "row not found on update/delete" which maps to NotFound.

use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use derive_more::Display;
use sea_orm::DbErr;
use serde_json::json;

#[derive(Debug, Display)]
pub enum ApiError {
    /// No identity present on the request.
    #[display(fmt = "Authentication required.")]
    Unauthorized,
    /// Identity present but role or ownership is insufficient.
    #[display(fmt = "{}", _0)]
    Forbidden(String),
    /// Malformed input, rejected locally with a human-readable reason.
    #[display(fmt = "{}", _0)]
    Validation(String),
    #[display(fmt = "{}", _0)]
    NotFound(String),
    #[display(fmt = "{}", _0)]
    Conflict(String),
    /// Unexpected failure; detail is logged, not leaked.
    #[display(fmt = "An internal error occurred.")]
    Internal,
}

impl ApiError {
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

impl actix_web::ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        match err {
            DbErr::RecordNotFound(what) => {
                log::warn!("record not found: {}", what);
                ApiError::NotFound("Record not found.".to_string())
            }
            other => {
                log::error!("database error: {}", other);
                ApiError::Internal
            }
        }
    }
}

/// Result alias used by handlers and the policy core.
pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::ResponseError;

    #[test]
    fn status_codes_match_taxonomy() {
        assert_eq!(ApiError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::forbidden("no").status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::validation("bad").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::not_found("gone").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Conflict("dup".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::Internal.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn record_not_found_maps_to_not_found() {
        let err: ApiError = DbErr::RecordNotFound("posts".to_string()).into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn internal_error_does_not_leak_detail() {
        let err: ApiError = DbErr::Custom("password=hunter2".to_string()).into();
        assert!(!err.to_string().contains("hunter2"));
    }
}
