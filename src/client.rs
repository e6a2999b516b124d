//! Client-side upload of captured images to the describe endpoint

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};

use crate::ingest::{IMAGE_FIELD, ImagePayload};
use crate::pipeline::{Camera, Uploader};
use crate::{Error, Result};

/// Uploads images to a remote describe endpoint
pub struct SceneClient {
    client: reqwest::Client,
    endpoint: String,
}

impl SceneClient {
    /// Create a client for the given endpoint URL
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Upload an image as a multipart form and return the response body
    ///
    /// Single attempt, no internal retry. A non-success status is an error
    /// carrying the status code and the response body verbatim.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Network`] on transport failure or a non-success
    /// response
    pub async fn upload(&self, image: &ImagePayload) -> Result<String> {
        let mut part = Part::bytes(image.bytes.to_vec())
            .mime_str(&image.mime_type)
            .map_err(|e| {
                Error::RequestFormat(format!("invalid MIME type {}: {e}", image.mime_type))
            })?;
        if let Some(name) = &image.filename {
            part = part.file_name(name.clone());
        }

        let form = Form::new().part(IMAGE_FIELD, part);

        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::Network(format!("upload failed: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::Network(format!("reading response failed: {e}")))?;

        if !status.is_success() {
            return Err(Error::Network(format!(
                "request failed ({}): {text}",
                status.as_u16()
            )));
        }

        Ok(text)
    }

    /// Resolve a local file into an image payload and upload it
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or the upload fails
    pub async fn upload_path(&self, path: &Path) -> Result<String> {
        let image = ImagePayload::from_path(path).await?;
        self.upload(&image).await
    }
}

#[async_trait]
impl Uploader for SceneClient {
    async fn upload(&self, image: &ImagePayload) -> Result<String> {
        Self::upload(self, image).await
    }
}

/// File-backed camera: resolves a fixed local path into an image payload.
/// Stands in for device capture on hosts without a camera.
pub struct FileCamera {
    path: PathBuf,
}

impl FileCamera {
    /// Create a camera reading from the given path
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl Camera for FileCamera {
    async fn capture(&self) -> Result<ImagePayload> {
        ImagePayload::from_path(&self.path).await
    }
}
