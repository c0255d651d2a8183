//! Analysis orchestrator — photos + questionnaire → AnalysisResult.
//!
//! Flow of one `analyze` call:
//!   gate (single-flight, cooldown) → compress (parallel) → size/trim →
//!   request loop (≤ 3 attempts, 503-only backoff) → resolve
//!
//! Nothing is ever returned as an error. The caller gets a real result,
//! a fallback result, or `None`, and reads `status()` to learn why.

mod error;
mod flight;
pub mod retry;
mod state;

pub use error::{ErrorKind, Failure};
pub use state::{AnalysisStatus, Stage};

use crate::capture::{self, CapturedPhotos, CompressError, PreparedPhoto};
use crate::config::AnalyzerConfig;
use crate::cooldown::{self, Clock, CooldownStore, FileCooldownStore, SystemClock};
use crate::llm::{fallback_result, AnalysisRequest, AnalysisResult, AnalysisTransport, QuestionnaireData};
use flight::SingleFlight;
use retry::{AttemptState, Decision};
use state::{Phase, StatusCell};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::watch;

/// Inputs of the last accepted `analyze`, kept for `retry()`.
#[derive(Debug, Clone)]
struct LastRequest {
    photos: CapturedPhotos,
    questionnaire: QuestionnaireData,
}

/// How one accepted call ended.
enum Resolution {
    Success {
        result: AnalysisResult,
        single_photo: bool,
    },
    /// Recoverable user-facing error, no result.
    Failed {
        failure: Failure,
        single_photo: bool,
    },
    Fallback {
        advisory: Failure,
        single_photo: bool,
    },
}

pub struct Orchestrator {
    config: AnalyzerConfig,
    transport: Arc<dyn AnalysisTransport>,
    store: Arc<dyn CooldownStore>,
    clock: Arc<dyn Clock>,
    flight: SingleFlight,
    status: StatusCell,
    last_request: Mutex<Option<LastRequest>>,
}

impl Orchestrator {
    /// Orchestrator with the file-backed cooldown store and the system clock.
    pub fn new(config: AnalyzerConfig, transport: Arc<dyn AnalysisTransport>) -> Self {
        let store: Arc<dyn CooldownStore> = match config.state_file() {
            Some(path) => Arc::new(FileCooldownStore::new(path)),
            None => Arc::new(FileCooldownStore::default_location()),
        };
        Self {
            config,
            transport,
            store,
            clock: Arc::new(SystemClock),
            flight: SingleFlight::default(),
            status: StatusCell::new(),
            last_request: Mutex::new(None),
        }
    }

    pub fn with_store(mut self, store: Arc<dyn CooldownStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Fresh status snapshot; countdowns are computed against the clock now.
    pub fn status(&self) -> AnalysisStatus {
        self.status.snapshot(self.clock.now_ms())
    }

    /// Status pushed on every state transition.
    pub fn subscribe(&self) -> watch::Receiver<AnalysisStatus> {
        self.status.subscribe()
    }

    /// Reset the user-visible error. Cooldown and in-flight state are untouched.
    pub fn clear_error(&self) {
        self.status.clear_error(self.clock.now_ms());
    }

    /// Replay the last accepted `analyze` inputs.
    pub async fn retry(&self) -> Option<AnalysisResult> {
        let last = self.lock_last_request().clone();
        match last {
            Some(req) => {
                log::info!("[ANALYZE] Retrying last request");
                self.analyze(req.photos, req.questionnaire).await
            }
            None => {
                log::warn!("[ANALYZE] Retry requested with no prior analysis");
                self.status
                    .set_idle_error(self.clock.now_ms(), Failure::nothing_to_retry());
                None
            }
        }
    }

    pub async fn analyze(
        &self,
        photos: CapturedPhotos,
        questionnaire: QuestionnaireData,
    ) -> Option<AnalysisResult> {
        // Gate 1: single-flight. Busy is silent: no error, no state change.
        if self.flight.is_held() {
            log::debug!("[ANALYZE] Rejected: analysis already in flight");
            return None;
        }

        // Gate 2: cooldown. Checked before the lock is taken.
        let now = self.clock.now_ms();
        if let Some(left) = cooldown::remaining(self.store.read(), now, self.config.cooldown) {
            let secs = cooldown::ceil_secs(left);
            log::info!("[COOLDOWN] Rejected: {}s remaining", secs);
            let until = cooldown::deadline_ms(now, left);
            self.status.set_idle_error(now, Failure::cooldown(secs, until));
            return None;
        }

        let Some(_guard) = self.flight.try_acquire(&self.status, self.clock.as_ref()) else {
            log::debug!("[ANALYZE] Rejected: lost single-flight race");
            return None;
        };

        // Both gates passed: stamp the start before any I/O.
        self.store.write(now);
        *self.lock_last_request() = Some(LastRequest {
            photos: photos.clone(),
            questionnaire: questionnaire.clone(),
        });
        self.status.set(
            now,
            Phase::Running {
                stage: Stage::Compressing,
                used_single_photo: false,
            },
        );

        let start = Instant::now();
        let resolution = self.run(&photos, &questionnaire).await;
        let result = self.resolve(resolution);
        log::info!(
            "[ANALYZE] Finished in {}ms (fallback={})",
            start.elapsed().as_millis(),
            self.status().used_fallback
        );
        result
    }

    async fn run(&self, photos: &CapturedPhotos, questionnaire: &QuestionnaireData) -> Resolution {
        if photos.is_empty() {
            log::warn!("[ANALYZE] No photos present");
            return Resolution::Failed {
                failure: Failure::no_photos(),
                single_photo: false,
            };
        }

        let compressed = match self.compress_all(photos).await {
            Ok(c) => c,
            Err(e) => {
                log::error!("[COMPRESS] {}", e);
                return Resolution::Fallback {
                    advisory: Failure::new(
                        ErrorKind::NetworkError,
                        format!("Could not prepare your photos ({}). Showing a demo result.", e),
                    ),
                    single_photo: false,
                };
            }
        };

        self.status.set_stage(self.clock.now_ms(), Stage::Sizing);
        let total = capture::total_bytes(&compressed);
        let (prepared, single_photo) = capture::trim_to_ceiling(compressed, self.config.max_payload_bytes);
        log::info!(
            "[PAYLOAD] {} bytes across {} photo(s) (ceiling {})",
            total,
            prepared.len(),
            self.config.max_payload_bytes
        );
        if single_photo {
            self.status.mark_single_photo(self.clock.now_ms());
        }

        let request = AnalysisRequest::new(&prepared, questionnaire);
        self.request_loop(&request, AttemptState::new(single_photo)).await
    }

    /// Compress every present slot concurrently and join.
    async fn compress_all(&self, photos: &CapturedPhotos) -> Result<Vec<PreparedPhoto>, CompressError> {
        let max_width = self.config.max_width;
        let quality = self.config.jpeg_quality;

        let tasks = photos.present().into_iter().map(|(slot, image)| {
            let image = image.clone();
            async move {
                let joined = tokio::task::spawn_blocking(move || {
                    capture::compress_image(&image, max_width, quality)
                })
                .await;
                match joined {
                    Ok(Ok(image)) => Ok(PreparedPhoto { slot, image }),
                    Ok(Err(e)) => Err(e),
                    Err(join_err) => Err(CompressError::Render(format!(
                        "{} photo compression task failed: {}",
                        slot, join_err
                    ))),
                }
            }
        });

        // join_all keeps input order, which is slot priority order.
        futures::future::join_all(tasks).await.into_iter().collect()
    }

    async fn request_loop(&self, request: &AnalysisRequest, mut state: AttemptState) -> Resolution {
        loop {
            let now = self.clock.now_ms();
            self.status.set_stage(
                now,
                Stage::Requesting {
                    attempt: state.attempt + 1,
                },
            );
            log::info!(
                "[ANALYZE] Attempt {}/{} via {}",
                state.attempt + 1,
                self.config.retry.max_attempts,
                self.transport.name()
            );

            let outcome = self.transport.submit(request).await;
            state.last_status = outcome.as_ref().ok().map(|r| r.status);
            let classification = retry::classify(outcome);

            match retry::decide(classification, state.attempt, &self.config.retry) {
                Decision::Accept(result) => {
                    log::info!("[ANALYZE] Success: score={:.1} confidence={:.2}", result.score, result.confidence);
                    return Resolution::Success {
                        result,
                        single_photo: state.single_photo,
                    };
                }
                Decision::Surface { kind, wait_hint } => {
                    log::warn!("[ANALYZE] Terminal {} (status {:?})", kind, state.last_status);
                    return Resolution::Failed {
                        failure: self.terminal_failure(kind, wait_hint),
                        single_photo: state.single_photo,
                    };
                }
                Decision::Backoff(delay) => {
                    log::warn!(
                        "[ANALYZE] Service unavailable (status {:?}), retrying in {}ms",
                        state.last_status,
                        delay.as_millis()
                    );
                    self.status.set_stage(
                        self.clock.now_ms(),
                        Stage::RetryWait {
                            next_attempt: state.attempt + 2,
                        },
                    );
                    tokio::time::sleep(delay).await;
                    state.attempt += 1;
                }
                Decision::Fallback { kind, detail } => {
                    log::warn!("[ANALYZE] Falling back ({}): {}", kind, detail);
                    return Resolution::Fallback {
                        advisory: fallback_advisory(kind),
                        single_photo: state.single_photo,
                    };
                }
            }
        }
    }

    fn terminal_failure(&self, kind: ErrorKind, wait_hint: Option<u64>) -> Failure {
        match kind {
            ErrorKind::RateLimit => {
                let wait = wait_hint
                    .map(Duration::from_secs)
                    .unwrap_or(self.config.default_rate_limit_wait);
                let secs = wait.as_secs();
                Failure::new(
                    ErrorKind::RateLimit,
                    format!(
                        "The analysis service is busy. Please wait {} seconds and try again.",
                        secs
                    ),
                )
                .with_wait_until(cooldown::deadline_ms(self.clock.now_ms(), wait))
            }
            ErrorKind::PayloadTooLarge => Failure::new(
                ErrorKind::PayloadTooLarge,
                "Your photos are too large to analyze. Retake them or use fewer photos.",
            ),
            other => Failure::new(other, "The analysis could not be completed."),
        }
    }

    /// Publish the final phase and produce the caller's return value.
    fn resolve(&self, resolution: Resolution) -> Option<AnalysisResult> {
        let now = self.clock.now_ms();
        match resolution {
            Resolution::Success {
                result,
                single_photo,
            } => {
                self.status.set(
                    now,
                    Phase::Idle {
                        used_fallback: false,
                        used_single_photo: single_photo,
                        error: None,
                    },
                );
                Some(result)
            }
            Resolution::Failed {
                failure,
                single_photo,
            } => {
                self.status.set(
                    now,
                    Phase::Idle {
                        used_fallback: false,
                        used_single_photo: single_photo,
                        error: Some(failure),
                    },
                );
                None
            }
            Resolution::Fallback {
                advisory,
                single_photo,
            } => {
                debug_assert!(advisory.kind.is_some_and(ErrorKind::fallback_eligible));
                self.status.set(
                    now,
                    Phase::Idle {
                        used_fallback: true,
                        used_single_photo: single_photo,
                        error: Some(advisory),
                    },
                );
                Some(fallback_result())
            }
        }
    }

    fn lock_last_request(&self) -> std::sync::MutexGuard<'_, Option<LastRequest>> {
        match self.last_request.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

fn fallback_advisory(kind: ErrorKind) -> Failure {
    let message = match kind {
        ErrorKind::NetworkError => {
            "Couldn't reach the analysis service. Showing a demo result. Try again when you're online."
        }
        _ => "The analysis service is having trouble. Showing a demo result. Try again in a moment.",
    };
    Failure::new(kind, message)
}
