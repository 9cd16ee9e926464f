use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// Error type returned by every handler. Maps onto HTTP statuses:
/// validation -> 400, missing auth -> 401, non-admin writes -> 403,
/// unknown resources -> 404, storage failures -> 500.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("missing or invalid authorization")]
    Unauthorized,

    #[error("administrator privileges required")]
    Forbidden,

    #[error("resource not found")]
    NotFound,

    #[error("upload failed: {0}")]
    Upload(String),

    #[error("database error: {0}")]
    Database(diesel::result::Error),

    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
}

impl From<diesel::result::Error> for ApiError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => ApiError::NotFound,
            other => ApiError::Database(other),
        }
    }
}

impl From<actix_multipart::MultipartError> for ApiError {
    fn from(err: actix_multipart::MultipartError) -> Self {
        ApiError::Upload(err.to_string())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Upload(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Database(_) | ApiError::Pool(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code() == StatusCode::INTERNAL_SERVER_ERROR {
            log::error!("{}", self);
        }
        HttpResponse::build(self.status_code()).json(json!({ "message": self.to_string() }))
    }
}
