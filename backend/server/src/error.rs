use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use models::{ValidationError, payloads::ErrorResponse};
use thiserror::Error;
use tracing::error;

use crate::{auth::AuthError, database::StoreError, images::ImageError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("{0}")]
    Forbidden(String),

    #[error("Image upload is not configured")]
    ImagesDisabled,

    #[error("Failed to upload images: {0}")]
    Upload(#[from] ImageError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err.0)
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::MalformedPayload(_) | AppError::Conflict(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::ImagesDisabled => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Auth(AuthError::Token(_)) => StatusCode::UNAUTHORIZED,
            AppError::Upload(_) | AppError::Store(_) | AppError::Auth(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Server faults keep their detail in the log only.
        let message = match &self {
            AppError::Upload(_) => {
                error!(error = %self, "Upload failed");
                "Failed to upload images".to_string()
            }
            AppError::Auth(AuthError::Token(_)) => "Not authorized, token failed".to_string(),
            _ if status == StatusCode::INTERNAL_SERVER_ERROR => {
                error!(error = %self, "Request failed");
                "Server error".to_string()
            }
            _ => self.to_string(),
        };

        (status, Json(ErrorResponse::new(message))).into_response()
    }
}
