use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// Aggregated validator messages, already rendered as `<li>` items.
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Not Found: {0}")]
    NotFound(String),
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    /// An expected structural field (e.g. the id set) is missing.
    #[error("Malformed request")]
    MalformedRequest,
    /// The repository refused a create or update.
    #[error("Persistence failed")]
    PersistenceFailed,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::NotFound(_)
            | AppError::MalformedRequest
            | AppError::PersistenceFailed => StatusCode::CONFLICT,
            AppError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match self {
            AppError::MalformedRequest | AppError::PersistenceFailed => return status.into_response(),
            AppError::Validation(msg) | AppError::NotFound(msg) | AppError::PermissionDenied(msg) => msg,
            AppError::InvalidCredentials => "Invalid credentials".to_string(),
            AppError::DatabaseError(msg) => format!("Database error: {msg}"),
            AppError::InternalServerError(msg) => msg,
        };
        (status, Json(serde_json::json!({ "error": error_message }))).into_response()
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        AppError::DatabaseError(err.to_string())
    }
}

impl From<tera::Error> for AppError {
    fn from(err: tera::Error) -> Self {
        AppError::InternalServerError(format!("Template rendering error: {err}"))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InternalServerError(format!("JSON serialization/deserialization error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_family_maps_to_409() {
        assert_eq!(AppError::Validation("<li>x</li>".into()).status(), StatusCode::CONFLICT);
        assert_eq!(AppError::NotFound("gone".into()).status(), StatusCode::CONFLICT);
        assert_eq!(AppError::MalformedRequest.status(), StatusCode::CONFLICT);
        assert_eq!(AppError::PersistenceFailed.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn permission_denied_maps_to_403() {
        let resp = AppError::PermissionDenied("no".into()).into_response();
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn bare_errors_have_no_json_content_type() {
        let resp = AppError::MalformedRequest.into_response();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        assert!(resp.headers().get(axum::http::header::CONTENT_TYPE).is_none());
    }
}
