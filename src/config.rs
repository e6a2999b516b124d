//! Process-wide configuration, read once at startup

use crate::ingest::MAX_IMAGE_BYTES;
use crate::voice::DEFAULT_VOICE_ID;

/// Default describe endpoint for the client side
const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8080/describe";

/// scene-echo configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Vision inference credential (`GEMINI_API_KEY`). Absence means every
    /// describe request is answered with a 500.
    pub vision_api_key: Option<String>,

    /// Speech synthesis credential (`ELEVENLABS_API_KEY`). Absence degrades
    /// spoken feedback to a logged warning.
    pub speech_api_key: Option<String>,

    /// Vision model identifier (`GEMINI_MODEL`)
    pub vision_model: Option<String>,

    /// Describe endpoint URL for the client side (`SCENE_ECHO_ENDPOINT`)
    pub endpoint: String,

    /// Speech voice identifier (`SCENE_ECHO_VOICE`)
    pub voice_id: String,

    /// Per-request cap on uploaded image bytes
    pub max_image_bytes: usize,
}

impl Config {
    /// Read configuration from the environment
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            vision_api_key: env_non_empty("GEMINI_API_KEY"),
            speech_api_key: env_non_empty("ELEVENLABS_API_KEY"),
            vision_model: env_non_empty("GEMINI_MODEL"),
            endpoint: env_non_empty("SCENE_ECHO_ENDPOINT")
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            voice_id: env_non_empty("SCENE_ECHO_VOICE")
                .unwrap_or_else(|| DEFAULT_VOICE_ID.to_string()),
            max_image_bytes: MAX_IMAGE_BYTES,
        }
    }
}

/// Read an environment variable, treating empty values as unset
fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
