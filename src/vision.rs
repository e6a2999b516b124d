//! Vision-language client for scene description
//!
//! Submits a captured image plus a fixed instruction prompt to the Gemini
//! `generateContent` API and returns the textual answer unmodified.

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::ingest::ImagePayload;
use crate::{Error, Result};

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const DEFAULT_MODEL: &str = "gemini-3-pro-preview";

/// Instruction prompt sent with every image. The response format contract
/// lives entirely in this prompt; the server does no post-processing.
const SCENE_PROMPT: &str = "\
Describe this image for someone who cannot see it. Provide:
1. A short description of the scene, at most one sentence of ten words. \
If a person is the main subject, include a guess at what they are doing.
2. An estimated distance in feet from the camera to the main subject.

Format your response as plain text with the description followed by the \
distance estimate. If you cannot confidently estimate the distance, please \
state that.";

/// Describes a scene from an image
#[async_trait]
pub trait SceneDescriber: Send + Sync {
    /// Produce a natural-language description of the image
    ///
    /// # Errors
    ///
    /// Returns [`Error::Auth`] when the inference credential is rejected and
    /// [`Error::Upstream`] for any other inference failure.
    async fn describe(&self, image: &ImagePayload) -> Result<String>;
}

/// Gemini-backed scene describer
#[derive(Debug)]
pub struct GeminiVision {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text {
        text: &'a str,
    },
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineData<'a>,
    },
}

/// Image bytes embedded directly in the request as base64
#[derive(Debug, Serialize)]
struct InlineData<'a> {
    #[serde(rename = "mimeType")]
    mime_type: &'a str,
    data: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GeminiVision {
    /// Create a new vision client
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing
    pub fn new(api_key: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::Config(
                "Gemini API key required for vision".to_string(),
            ));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model: DEFAULT_MODEL.to_string(),
        })
    }

    /// Create with a specific model
    #[must_use]
    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }
}

#[async_trait]
impl SceneDescriber for GeminiVision {
    async fn describe(&self, image: &ImagePayload) -> Result<String> {
        let base64_data = base64::engine::general_purpose::STANDARD.encode(&image.bytes);
        let media_type = normalize_mime_type(&image.mime_type);

        let request = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![
                    Part::Text { text: SCENE_PROMPT },
                    Part::Inline {
                        inline_data: InlineData {
                            mime_type: media_type,
                            data: base64_data,
                        },
                    },
                ],
            }],
        };

        let url = format!("{GEMINI_API_URL}/{}:generateContent", self.model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if status == reqwest::StatusCode::UNAUTHORIZED
                || status == reqwest::StatusCode::FORBIDDEN
                || body.contains("API key")
            {
                return Err(Error::Auth(format!("API key rejected: {body}")));
            }
            return Err(Error::Upstream(format!("API error {status}: {body}")));
        }

        let result: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("parse error: {e}")))?;

        let description = result
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|c| c.parts)
            .filter_map(|p| p.text)
            .collect::<Vec<_>>()
            .join(" ");

        if description.is_empty() {
            return Err(Error::Upstream(
                "empty response from vision API".to_string(),
            ));
        }

        tracing::debug!(description = %description, "scene described");
        Ok(description)
    }
}

/// Normalize MIME type for the inference API
fn normalize_mime_type(mime_type: &str) -> &'static str {
    match mime_type.to_lowercase().as_str() {
        "image/png" => "image/png",
        "image/gif" => "image/gif",
        "image/webp" => "image/webp",
        // jpeg, jpg, and any unknown type default to jpeg
        _ => "image/jpeg",
    }
}
