//! # Installation Photos
//!
//! Photos are never stored by this service. They are pushed to Cloudinary with
//! a signed upload and only the returned `secure_url` is kept.
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use futures::future::try_join_all;
use reqwest::{
    Client, StatusCode,
    multipart::{Form, Part},
};
use serde::Deserialize;
use sha1::{Digest, Sha1};
use thiserror::Error;
use tracing::info;

use crate::config::CloudinaryConfig;

pub const TRANSFORMATION: &str = "c_limit,w_1200,h_1200/q_auto:good";

#[derive(Error, Debug)]
pub enum ImageError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("image host rejected upload ({status}): {message}")]
    Rejected { status: StatusCode, message: String },
}

#[derive(Debug, Clone)]
pub struct ImageFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Returns the public HTTPS URL of the stored image.
    async fn upload(&self, file: ImageFile) -> Result<String, ImageError>;
}

/// Uploads concurrently. Any failure fails the whole batch; images that did
/// make it stay on the host.
pub async fn upload_all(
    host: &dyn ImageHost,
    files: Vec<ImageFile>,
) -> Result<Vec<String>, ImageError> {
    try_join_all(files.into_iter().map(|file| host.upload(file))).await
}

#[derive(Deserialize)]
struct UploadResult {
    secure_url: String,
}

#[derive(Deserialize)]
struct UploadFailure {
    error: FailureDetail,
}

#[derive(Deserialize)]
struct FailureDetail {
    message: String,
}

pub struct Cloudinary {
    client: Client,
    config: CloudinaryConfig,
}

impl Cloudinary {
    pub fn new(config: CloudinaryConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "https://api.cloudinary.com/v1_1/{}/image/upload",
            self.config.cloud_name
        )
    }
}

/// Cloudinary signature: SHA-1 over the alphabetically sorted parameters
/// joined as `k=v&k=v`, followed by the API secret.
pub fn sign(params: &[(&str, &str)], secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let joined = sorted
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha1::new();
    hasher.update(joined.as_bytes());
    hasher.update(secret.as_bytes());

    hex::encode(hasher.finalize())
}

fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default()
}

#[async_trait]
impl ImageHost for Cloudinary {
    async fn upload(&self, file: ImageFile) -> Result<String, ImageError> {
        let timestamp = unix_timestamp().to_string();
        let signature = sign(
            &[
                ("folder", self.config.folder.as_str()),
                ("timestamp", timestamp.as_str()),
                ("transformation", TRANSFORMATION),
            ],
            &self.config.api_secret,
        );

        let part = Part::bytes(file.bytes)
            .file_name(file.file_name.clone())
            .mime_str(&file.content_type)?;

        let form = Form::new()
            .part("file", part)
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", self.config.folder.clone())
            .text("transformation", TRANSFORMATION)
            .text("signature", signature);

        let response = self
            .client
            .post(self.endpoint())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<UploadFailure>()
                .await
                .map(|failure| failure.error.message)
                .unwrap_or_else(|_| "unknown error".to_string());

            return Err(ImageError::Rejected { status, message });
        }

        let result: UploadResult = response.json().await?;
        info!(file = %file.file_name, url = %result.secure_url, "Image uploaded");

        Ok(result.secure_url)
    }
}
