//! Pipeline orchestration: capture → upload → describe → speak
//!
//! A single logical pipeline instance per device. The orchestrator owns the
//! state machine; collaborators are injected and only ever read the state.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::Result;
use crate::ingest::ImagePayload;

/// Enforced floor on cycle duration, measured from the start of processing.
/// Rate-limits trigger frequency and gives the spoken description time to
/// begin before the user can re-trigger.
pub const MIN_CYCLE: Duration = Duration::from_millis(5000);

/// Pipeline state, exactly one live per device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Ready for a trigger
    Idle,
    /// Device capture in flight
    Capturing,
    /// Upload + inference round-trip in flight
    Uploading,
    /// Spoken feedback dispatched
    Speaking,
}

/// Produces a captured image
#[async_trait]
pub trait Camera: Send + Sync {
    /// Capture one image
    ///
    /// # Errors
    ///
    /// Returns error if capture fails
    async fn capture(&self) -> Result<ImagePayload>;
}

/// Uploads an image and returns the scene description
#[async_trait]
pub trait Uploader: Send + Sync {
    /// Single-attempt upload, no internal retry
    ///
    /// # Errors
    ///
    /// Returns error if the upload or the remote inference fails
    async fn upload(&self, image: &ImagePayload) -> Result<String>;
}

/// Speaks a description aloud
///
/// Infallible from the caller's perspective: speech failure degrades to
/// silence, never to pipeline failure.
#[async_trait]
pub trait Speaker: Send + Sync {
    /// Synthesize and start playback
    async fn speak(&self, text: &str);
}

/// Receives user-visible failure alerts
pub trait AlertSink: Send + Sync {
    /// Surface an alert to the user
    fn alert(&self, message: &str);
}

/// Outcome of one trigger
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Cycle completed; carries the scene description
    Described(String),
    /// Capture or upload failed; an alert was surfaced
    Failed,
    /// Trigger arrived while a cycle was in flight and was dropped
    Dropped,
}

/// Sequences one pipeline cycle at a time
pub struct Orchestrator {
    camera: Arc<dyn Camera>,
    uploader: Arc<dyn Uploader>,
    speaker: Arc<dyn Speaker>,
    alerts: Arc<dyn AlertSink>,
    state: Mutex<PipelineState>,
}

impl Orchestrator {
    /// Create a new orchestrator with injected collaborators
    #[must_use]
    pub fn new(
        camera: Arc<dyn Camera>,
        uploader: Arc<dyn Uploader>,
        speaker: Arc<dyn Speaker>,
        alerts: Arc<dyn AlertSink>,
    ) -> Self {
        Self {
            camera,
            uploader,
            speaker,
            alerts,
            state: Mutex::new(PipelineState::Idle),
        }
    }

    /// Current pipeline state, for rendering only
    #[must_use]
    pub fn state(&self) -> PipelineState {
        *self.state.lock().unwrap()
    }

    /// Entry guard: claim the pipeline if it is idle
    fn begin(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        if *state == PipelineState::Idle {
            *state = PipelineState::Capturing;
            true
        } else {
            false
        }
    }

    fn set_state(&self, next: PipelineState) {
        *self.state.lock().unwrap() = next;
    }

    /// Run one capture→upload→speak cycle
    ///
    /// A trigger received while a cycle is in flight is dropped with no
    /// observable effect. Failures alert, log, and still honor the
    /// minimum-cycle-time pad before the pipeline returns to idle.
    pub async fn trigger(&self) -> CycleOutcome {
        if !self.begin() {
            tracing::debug!("capture trigger dropped, cycle already in flight");
            return CycleOutcome::Dropped;
        }

        let started = tokio::time::Instant::now();

        let outcome = match self.run_cycle().await {
            Ok(text) => CycleOutcome::Described(text),
            Err(e) => {
                tracing::error!(error = %e, "pipeline cycle failed");
                self.alerts.alert(&format!("Could not process image: {e}"));
                CycleOutcome::Failed
            }
        };

        let elapsed = started.elapsed();
        if elapsed < MIN_CYCLE {
            tokio::time::sleep(MIN_CYCLE - elapsed).await;
        }

        self.set_state(PipelineState::Idle);
        outcome
    }

    async fn run_cycle(&self) -> Result<String> {
        // State is already Capturing from the entry guard
        let image = self.camera.capture().await?;
        tracing::debug!(bytes = image.len(), mime = %image.mime_type, "image captured");

        self.set_state(PipelineState::Uploading);
        let text = self.uploader.upload(&image).await?;
        tracing::info!(description = %text, "scene described");

        self.set_state(PipelineState::Speaking);
        self.speaker.speak(&text).await;

        Ok(text)
    }
}
