//! Shared fixtures for orchestrator integration tests.
//!
//! - ScriptedTransport: replays a fixed list of outcomes and records requests
//! - FailingStore: a cooldown store whose backend is always broken
//! - png_photo / three_photos: real encoded images for the compression stage

#![allow(dead_code)]

use async_trait::async_trait;
use hairline_scan_lib::cooldown::CooldownStore;
use hairline_scan_lib::llm::{AnalysisRequest, AnalysisTransport, RemoteResponse, TransportError};
use hairline_scan_lib::{
    AnalyzerConfig, CapturedPhotos, EncodedImage, ManualClock, MemoryCooldownStore, Orchestrator,
    QuestionnaireData,
};
use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

pub const START_MS: u64 = 1_767_225_600_000;

pub const VALID_BODY: &str = r#"{
    "score": 4.5,
    "confidence": 0.82,
    "summary": "Mild recession at the temples.",
    "observations": ["Slight temple recession"],
    "likely_patterns": ["Early pattern thinning"],
    "options": [{"title": "Lifestyle", "bullets": ["Gentle shampoo"]}],
    "see_dermatologist_if": ["Sudden shedding"],
    "disclaimer": "Not medical advice."
}"#;

pub enum Step {
    Respond(u16, String),
    /// Signal `entered`, wait for `release`, then respond.
    Hold(u16, String),
    Fail(String),
}

impl Step {
    pub fn ok() -> Self {
        Step::Respond(200, VALID_BODY.to_string())
    }

    pub fn status(code: u16, body: &str) -> Self {
        Step::Respond(code, body.to_string())
    }
}

#[derive(Default)]
pub struct ScriptedTransport {
    steps: Mutex<VecDeque<Step>>,
    calls: AtomicUsize,
    requests: Mutex<Vec<AnalysisRequest>>,
    pub entered: Notify,
    pub release: Notify,
}

impl ScriptedTransport {
    pub fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            ..Default::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<AnalysisRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnalysisTransport for ScriptedTransport {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn submit(&self, request: &AnalysisRequest) -> Result<RemoteResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Respond(status, body)) => Ok(RemoteResponse::new(status, body)),
            Some(Step::Hold(status, body)) => {
                self.entered.notify_one();
                self.release.notified().await;
                Ok(RemoteResponse::new(status, body))
            }
            Some(Step::Fail(msg)) => Err(TransportError::Request(msg)),
            None => Err(TransportError::Request("script exhausted".to_string())),
        }
    }
}

/// Store whose backend is unavailable: reads nothing, drops writes.
#[derive(Default)]
pub struct FailingStore {
    pub writes: AtomicUsize,
}

impl CooldownStore for FailingStore {
    fn read(&self) -> Option<u64> {
        None
    }

    fn write(&self, _timestamp_ms: u64) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct Harness {
    pub orchestrator: Orchestrator,
    pub transport: Arc<ScriptedTransport>,
    pub clock: Arc<ManualClock>,
    pub store: Arc<MemoryCooldownStore>,
}

pub fn harness(steps: Vec<Step>) -> Harness {
    harness_with(AnalyzerConfig::default(), steps)
}

pub fn harness_with(config: AnalyzerConfig, steps: Vec<Step>) -> Harness {
    let transport = ScriptedTransport::new(steps);
    let clock = Arc::new(ManualClock::new(START_MS));
    let store = Arc::new(MemoryCooldownStore::new());
    let orchestrator = Orchestrator::new(config, transport.clone())
        .with_store(store.clone())
        .with_clock(clock.clone());
    Harness {
        orchestrator,
        transport,
        clock,
        store,
    }
}

/// A solid-color PNG of the given size.
pub fn png_photo(width: u32, height: u32) -> EncodedImage {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([180, 140, 120]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    EncodedImage::from_bytes(&buf)
}

pub fn front_photo() -> CapturedPhotos {
    CapturedPhotos::front_only(png_photo(320, 240))
}

pub fn three_photos() -> CapturedPhotos {
    CapturedPhotos {
        front: Some(png_photo(320, 240)),
        left: Some(png_photo(240, 320)),
        right: Some(png_photo(240, 320)),
    }
}

pub fn questionnaire() -> QuestionnaireData {
    QuestionnaireData {
        age_range: Some("25-34".to_string()),
        duration: Some("1-2 years".to_string()),
        family_history: Some("father".to_string()),
        routine_frequency: None,
        care_level: None,
    }
}
