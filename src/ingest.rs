//! Streaming multipart ingest for image uploads
//!
//! Extracts a single bounded binary `image` field from an HTTP request body.
//! Works over any byte stream, so a pre-buffered body and a live request
//! stream share the same parsing logic.

use std::path::Path;

use bytes::Bytes;
use futures::Stream;
use multer::Multipart;

use crate::{Error, Result};

/// Form field name carrying the image
pub const IMAGE_FIELD: &str = "image";

/// Per-request cap on image bytes (10 MiB)
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// A captured image on its way through the pipeline
///
/// Owned exclusively by the request that carries it and discarded once the
/// HTTP call completes.
#[derive(Debug, Clone)]
pub struct ImagePayload {
    /// Raw image bytes
    pub bytes: Bytes,
    /// MIME type of the image
    pub mime_type: String,
    /// Original filename, when one was supplied
    pub filename: Option<String>,
}

impl ImagePayload {
    /// Read an image from a local file, inferring the MIME type from its
    /// extension
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read
    pub async fn from_path(path: &Path) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        Ok(Self {
            bytes: bytes.into(),
            mime_type: mime_for_path(path).to_string(),
            filename: path
                .file_name()
                .and_then(|n| n.to_str())
                .map(ToOwned::to_owned),
        })
    }

    /// Number of image bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the payload is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Infer a MIME type from a file extension
#[must_use]
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);

    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    }
}

/// Parse a multipart body and extract the `image` field
///
/// Non-`image` fields are drained without buffering. `Ok(None)` means the
/// body was well-formed multipart but carried no `image` field, so the
/// caller can answer 400 rather than 500.
///
/// The `Content-Type` header is checked before the body is touched; a
/// non-multipart request fails fast with zero bytes read.
///
/// # Errors
///
/// Returns [`Error::RequestFormat`] for a missing or non-multipart
/// `Content-Type` or malformed framing, and [`Error::PayloadTooLarge`] once
/// the `image` field exceeds `limit`.
pub async fn ingest<S, E>(
    content_type: Option<&str>,
    body: S,
    limit: usize,
) -> Result<Option<ImagePayload>>
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Send + 'static,
    E: Into<Box<dyn std::error::Error + Send + Sync>> + 'static,
{
    let Some(content_type) = content_type else {
        return Err(Error::RequestFormat(
            "missing Content-Type header".to_string(),
        ));
    };

    let boundary = multer::parse_boundary(content_type).map_err(|e| {
        Error::RequestFormat(format!("Content-Type must be multipart/form-data: {e}"))
    })?;

    let mut multipart = Multipart::new(body, boundary);
    let mut image: Option<ImagePayload> = None;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::RequestFormat(format!("malformed multipart body: {e}")))?
    {
        // Only the first `image` field is buffered; everything else is
        // drained so memory stays bounded under multi-field uploads.
        if field.name() != Some(IMAGE_FIELD) || image.is_some() {
            let name = field.name().unwrap_or_default().to_string();
            while field
                .chunk()
                .await
                .map_err(|e| Error::RequestFormat(format!("malformed multipart body: {e}")))?
                .is_some()
            {}
            tracing::debug!(field = %name, "drained unrecognized multipart field");
            continue;
        }

        let mime_type = field
            .content_type()
            .map_or_else(|| "application/octet-stream".to_string(), ToString::to_string);
        let filename = field.file_name().map(ToOwned::to_owned);

        let mut buf = Vec::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| Error::RequestFormat(format!("malformed multipart body: {e}")))?
        {
            if buf.len() + chunk.len() > limit {
                return Err(Error::PayloadTooLarge(limit));
            }
            buf.extend_from_slice(&chunk);
        }

        image = Some(ImagePayload {
            bytes: buf.into(),
            mime_type,
            filename,
        });
    }

    Ok(image)
}

/// Parse an already-materialized multipart body
///
/// # Errors
///
/// Same failure modes as [`ingest`].
pub async fn ingest_buffered(
    content_type: Option<&str>,
    body: Bytes,
    limit: usize,
) -> Result<Option<ImagePayload>> {
    let stream =
        futures::stream::once(async move { Ok::<Bytes, std::convert::Infallible>(body) });
    ingest(content_type, stream, limit).await
}
