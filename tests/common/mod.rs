//! Shared test utilities
#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::Router;
use scene_echo::api::{ApiState, router};
use scene_echo::ingest::ImagePayload;
use scene_echo::vision::SceneDescriber;
use scene_echo::{Error, Result};

/// Multipart boundary used by test bodies
pub const BOUNDARY: &str = "test-boundary";

/// Content-Type header for test multipart bodies
#[must_use]
pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={BOUNDARY}")
}

/// Build a multipart body with (field name, mime, data) parts
#[must_use]
pub fn multipart_body(parts: &[(&str, &str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, mime, data) in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{name}\"; filename=\"scene\"\r\n")
                .as_bytes(),
        );
        body.extend_from_slice(format!("Content-Type: {mime}\r\n\r\n").as_bytes());
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// Scripted describer reply
pub enum MockReply {
    Text(&'static str),
    AuthFailure,
    UpstreamFailure(&'static str),
}

/// Scene describer double that records calls
pub struct MockDescriber {
    reply: MockReply,
    calls: AtomicUsize,
}

impl MockDescriber {
    #[must_use]
    pub fn text(reply: &'static str) -> Self {
        Self {
            reply: MockReply::Text(reply),
            calls: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn auth_failure() -> Self {
        Self {
            reply: MockReply::AuthFailure,
            calls: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn upstream_failure(message: &'static str) -> Self {
        Self {
            reply: MockReply::UpstreamFailure(message),
            calls: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SceneDescriber for MockDescriber {
    async fn describe(&self, _image: &ImagePayload) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.reply {
            MockReply::Text(text) => Ok((*text).to_string()),
            MockReply::AuthFailure => Err(Error::Auth("API key rejected".to_string())),
            MockReply::UpstreamFailure(msg) => Err(Error::Upstream((*msg).to_string())),
        }
    }
}

/// Build a test API router around an optional describer
#[must_use]
pub fn build_router(
    describer: Option<Arc<dyn SceneDescriber>>,
    max_image_bytes: usize,
) -> Router {
    router(Arc::new(ApiState {
        describer,
        max_image_bytes,
    }))
}
