//! Speech output: synthesis and playback

pub mod playback;
pub mod tts;

pub use tts::{DEFAULT_VOICE_ID, TextToSpeech};

use async_trait::async_trait;

use crate::pipeline::Speaker;

/// Speaks scene descriptions aloud: synthesize, then play
///
/// Errors at either step are logged and swallowed here. Losing audio
/// feedback must not leave the pipeline stuck, so speech failure degrades
/// to silence rather than propagating.
pub struct SpeechPlayback {
    tts: Option<TextToSpeech>,
}

impl SpeechPlayback {
    /// Create a playback adapter
    ///
    /// Pass `None` when no speech credential is configured; speaking then
    /// degrades to a logged warning.
    #[must_use]
    pub fn new(tts: Option<TextToSpeech>) -> Self {
        Self { tts }
    }
}

#[async_trait]
impl Speaker for SpeechPlayback {
    async fn speak(&self, text: &str) {
        let Some(tts) = &self.tts else {
            tracing::warn!("speech API key not configured, skipping spoken feedback");
            return;
        };

        let audio = match tts.synthesize(text).await {
            Ok(audio) => audio,
            Err(e) => {
                tracing::error!(error = %e, "speech synthesis failed");
                return;
            }
        };

        // Playback start is the end of this component's responsibility;
        // the blocking task runs the audio out without holding the caller.
        tokio::task::spawn_blocking(move || {
            if let Err(e) = playback::play_mp3(&audio) {
                tracing::error!(error = %e, "audio playback failed");
            }
        });
    }
}
