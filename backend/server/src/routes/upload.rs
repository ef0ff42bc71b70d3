use std::sync::Arc;

use axum::{
    Json,
    extract::{Multipart, State, multipart::{MultipartError, MultipartRejection}},
};
use models::payloads::UploadResponse;
use tracing::info;

use crate::{
    auth::CurrentUser,
    error::AppError,
    images::{ImageFile, upload_all},
    state::AppState,
};

pub const FIELD: &str = "photos";
pub const MAX_FILES: usize = 10;
pub const MAX_FILE_BYTES: usize = 5 * 1024 * 1024;
/// Room for ten full size files plus multipart framing.
pub const BODY_LIMIT: usize = MAX_FILES * MAX_FILE_BYTES + 64 * 1024;

fn malformed(err: MultipartError) -> AppError {
    AppError::MalformedPayload(err.body_text())
}

/// Reads the `photos` parts, enforcing count, size and image type. Other
/// fields are ignored.
async fn read_photos(mut multipart: Multipart) -> Result<Vec<ImageFile>, AppError> {
    let mut files = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        if field.name() != Some(FIELD) {
            continue;
        }

        if files.len() == MAX_FILES {
            return Err(AppError::Validation(format!(
                "Too many files, at most {MAX_FILES} photos per upload"
            )));
        }

        let content_type = field.content_type().unwrap_or_default().to_string();
        if !content_type.starts_with("image/") {
            return Err(AppError::Validation(
                "Only image files are allowed!".to_string(),
            ));
        }

        let file_name = field.file_name().unwrap_or("photo").to_string();
        let bytes = field.bytes().await.map_err(malformed)?;
        if bytes.len() > MAX_FILE_BYTES {
            return Err(AppError::Validation(format!(
                "File {file_name} is too large, the limit is 5MB"
            )));
        }

        files.push(ImageFile {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    Ok(files)
}

pub async fn upload_handler(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, AppError> {
    let Some(host) = state.images.clone() else {
        return Err(AppError::ImagesDisabled);
    };

    let multipart = multipart.map_err(|rejection| AppError::MalformedPayload(rejection.body_text()))?;
    let files = read_photos(multipart).await?;
    if files.is_empty() {
        return Err(AppError::Validation("No files uploaded".to_string()));
    }

    let urls = upload_all(host.as_ref(), files).await?;
    info!(username = %user.username, count = urls.len(), "Photos uploaded");

    Ok(Json(UploadResponse {
        success: true,
        count: urls.len(),
        data: urls,
    }))
}
