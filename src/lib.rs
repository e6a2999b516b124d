//! Scene Echo - environmental-awareness aid
//!
//! Captures a photograph, sends it to a vision-language inference endpoint,
//! and speaks the returned scene description aloud.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                  PipelineOrchestrator                 │
//! │   Idle → Capturing → Uploading → Speaking → Idle     │
//! └──────┬──────────────────┬─────────────────┬──────────┘
//!        │                  │                 │
//!     Camera           SceneClient      SpeechPlayback
//!        │                  │                 │
//!        ▼                  ▼                 ▼
//!    local image      POST /describe    ElevenLabs TTS
//!                          │
//!              ┌───────────▼───────────┐
//!              │    DescribeEndpoint    │
//!              │  ingest → GeminiVision │
//!              └───────────────────────┘
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod ingest;
pub mod pipeline;
pub mod vision;
pub mod voice;

pub use client::{FileCamera, SceneClient};
pub use config::Config;
pub use error::{Error, Result};
pub use ingest::{IMAGE_FIELD, ImagePayload, MAX_IMAGE_BYTES};
pub use pipeline::{CycleOutcome, Orchestrator, PipelineState};
pub use vision::{GeminiVision, SceneDescriber};
pub use voice::{SpeechPlayback, TextToSpeech};
