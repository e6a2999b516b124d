//! Pipeline orchestrator tests
//!
//! Timing properties run under tokio paused time, so the 5 second floor is
//! verified without real waiting.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use scene_echo::ingest::ImagePayload;
use scene_echo::pipeline::{
    AlertSink, Camera, CycleOutcome, MIN_CYCLE, Orchestrator, PipelineState, Speaker, Uploader,
};
use scene_echo::{Error, Result};
use tokio::sync::Notify;

const DESCRIPTION: &str = "A hallway with an open door. About 6 feet away.";

fn test_image() -> ImagePayload {
    ImagePayload {
        bytes: Bytes::from_static(b"image bytes"),
        mime_type: "image/png".to_string(),
        filename: None,
    }
}

struct StaticCamera {
    calls: AtomicUsize,
}

impl StaticCamera {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Camera for StaticCamera {
    async fn capture(&self) -> Result<ImagePayload> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(test_image())
    }
}

/// Camera that blocks until released, to hold a cycle in flight
struct GatedCamera {
    gate: Notify,
    calls: AtomicUsize,
}

impl GatedCamera {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            gate: Notify::new(),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Camera for GatedCamera {
    async fn capture(&self) -> Result<ImagePayload> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.gate.notified().await;
        Ok(test_image())
    }
}

struct FailingCamera;

#[async_trait]
impl Camera for FailingCamera {
    async fn capture(&self) -> Result<ImagePayload> {
        Err(Error::Network("camera unavailable".to_string()))
    }
}

struct RecordingUploader {
    calls: AtomicUsize,
    fail: bool,
    delay: Duration,
}

impl RecordingUploader {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail: false,
            delay: Duration::ZERO,
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail: true,
            delay: Duration::ZERO,
        })
    }

    fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail: false,
            delay,
        })
    }
}

#[async_trait]
impl Uploader for RecordingUploader {
    async fn upload(&self, _image: &ImagePayload) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.fail {
            return Err(Error::Network("request failed (503): busy".to_string()));
        }
        Ok(DESCRIPTION.to_string())
    }
}

#[derive(Default)]
struct RecordingSpeaker {
    spoken: Mutex<Vec<String>>,
}

#[async_trait]
impl Speaker for RecordingSpeaker {
    async fn speak(&self, text: &str) {
        self.spoken.lock().unwrap().push(text.to_string());
    }
}

#[derive(Default)]
struct RecordingAlerts {
    alerts: Mutex<Vec<String>>,
}

impl AlertSink for RecordingAlerts {
    fn alert(&self, message: &str) {
        self.alerts.lock().unwrap().push(message.to_string());
    }
}

#[tokio::test(start_paused = true)]
async fn trigger_runs_a_full_cycle() {
    let camera = StaticCamera::new();
    let uploader = RecordingUploader::new();
    let speaker = Arc::new(RecordingSpeaker::default());
    let alerts = Arc::new(RecordingAlerts::default());

    let orchestrator = Orchestrator::new(
        camera.clone(),
        uploader.clone(),
        speaker.clone(),
        alerts.clone(),
    );

    let outcome = orchestrator.trigger().await;

    assert_eq!(outcome, CycleOutcome::Described(DESCRIPTION.to_string()));
    assert_eq!(orchestrator.state(), PipelineState::Idle);
    assert_eq!(camera.calls.load(Ordering::SeqCst), 1);
    assert_eq!(uploader.calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        speaker.spoken.lock().unwrap().as_slice(),
        &[DESCRIPTION.to_string()]
    );
    assert!(alerts.alerts.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn trigger_while_busy_has_no_observable_effect() {
    let camera = GatedCamera::new();
    let uploader = RecordingUploader::new();
    let speaker = Arc::new(RecordingSpeaker::default());
    let alerts = Arc::new(RecordingAlerts::default());

    let orchestrator = Arc::new(Orchestrator::new(
        camera.clone(),
        uploader.clone(),
        speaker,
        alerts,
    ));

    let in_flight = {
        let orchestrator = orchestrator.clone();
        tokio::spawn(async move { orchestrator.trigger().await })
    };

    // Wait for the first cycle to reach the capture await
    while orchestrator.state() != PipelineState::Capturing {
        tokio::task::yield_now().await;
    }

    // A second trigger while busy is dropped with no second capture
    assert_eq!(orchestrator.trigger().await, CycleOutcome::Dropped);
    assert_eq!(camera.calls.load(Ordering::SeqCst), 1);

    camera.gate.notify_one();
    let outcome = in_flight.await.unwrap();

    assert_eq!(outcome, CycleOutcome::Described(DESCRIPTION.to_string()));
    assert_eq!(camera.calls.load(Ordering::SeqCst), 1);
    assert_eq!(uploader.calls.load(Ordering::SeqCst), 1);
    assert_eq!(orchestrator.state(), PipelineState::Idle);
}

#[tokio::test(start_paused = true)]
async fn fast_cycle_is_padded_to_the_floor() {
    let orchestrator = Orchestrator::new(
        StaticCamera::new(),
        RecordingUploader::new(),
        Arc::new(RecordingSpeaker::default()),
        Arc::new(RecordingAlerts::default()),
    );

    let started = tokio::time::Instant::now();
    orchestrator.trigger().await;
    let elapsed = started.elapsed();

    assert!(elapsed >= MIN_CYCLE, "cycle returned after {elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn slow_cycle_is_not_padded() {
    let work = MIN_CYCLE + Duration::from_millis(1000);
    let orchestrator = Orchestrator::new(
        StaticCamera::new(),
        RecordingUploader::slow(work),
        Arc::new(RecordingSpeaker::default()),
        Arc::new(RecordingAlerts::default()),
    );

    let started = tokio::time::Instant::now();
    orchestrator.trigger().await;
    let elapsed = started.elapsed();

    assert!(elapsed >= work);
    assert!(
        elapsed < work + Duration::from_millis(500),
        "extra delay added to a slow cycle: {elapsed:?}"
    );
}

#[tokio::test(start_paused = true)]
async fn capture_failure_alerts_pads_and_returns_to_idle() {
    let uploader = RecordingUploader::new();
    let alerts = Arc::new(RecordingAlerts::default());
    let orchestrator = Orchestrator::new(
        Arc::new(FailingCamera),
        uploader.clone(),
        Arc::new(RecordingSpeaker::default()),
        alerts.clone(),
    );

    let started = tokio::time::Instant::now();
    let outcome = orchestrator.trigger().await;
    let elapsed = started.elapsed();

    assert_eq!(outcome, CycleOutcome::Failed);
    assert_eq!(orchestrator.state(), PipelineState::Idle);
    assert!(elapsed >= MIN_CYCLE, "failure skipped the pad: {elapsed:?}");
    assert_eq!(uploader.calls.load(Ordering::SeqCst), 0);

    let alerts = alerts.alerts.lock().unwrap();
    assert_eq!(alerts.len(), 1);
    assert!(alerts[0].contains("camera unavailable"));
}

#[tokio::test(start_paused = true)]
async fn upload_failure_skips_speech_and_alerts() {
    let speaker = Arc::new(RecordingSpeaker::default());
    let alerts = Arc::new(RecordingAlerts::default());
    let orchestrator = Orchestrator::new(
        StaticCamera::new(),
        RecordingUploader::failing(),
        speaker.clone(),
        alerts.clone(),
    );

    let outcome = orchestrator.trigger().await;

    assert_eq!(outcome, CycleOutcome::Failed);
    assert_eq!(orchestrator.state(), PipelineState::Idle);
    assert!(speaker.spoken.lock().unwrap().is_empty());
    assert_eq!(alerts.alerts.lock().unwrap().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn pipeline_is_retriggerable_after_a_cycle() {
    let camera = StaticCamera::new();
    let orchestrator = Orchestrator::new(
        camera.clone(),
        RecordingUploader::new(),
        Arc::new(RecordingSpeaker::default()),
        Arc::new(RecordingAlerts::default()),
    );

    orchestrator.trigger().await;
    let outcome = orchestrator.trigger().await;

    assert_eq!(outcome, CycleOutcome::Described(DESCRIPTION.to_string()));
    assert_eq!(camera.calls.load(Ordering::SeqCst), 2);
}
