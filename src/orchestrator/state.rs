//! Orchestrator state — one tagged value internally, flags externally.
//!
//! `Phase` makes the illegal combinations unrepresentable: while an
//! analysis is running there is no error and no fallback flag; those only
//! exist on `Idle`. The UI reads the derived `AnalysisStatus`.

use super::error::{ErrorKind, Failure};
use crate::cooldown::ceil_secs;
use serde::Serialize;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::watch;

/// Where a running analysis currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Compressing,
    Sizing,
    /// 1-based attempt number.
    Requesting { attempt: u32 },
    /// Waiting before `next_attempt` (1-based).
    RetryWait { next_attempt: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Phase {
    Idle {
        used_fallback: bool,
        used_single_photo: bool,
        error: Option<Failure>,
    },
    Running {
        stage: Stage,
        used_single_photo: bool,
    },
}

impl Phase {
    pub(crate) fn initial() -> Self {
        Phase::Idle {
            used_fallback: false,
            used_single_photo: false,
            error: None,
        }
    }

    fn snapshot(&self, now_ms: u64) -> AnalysisStatus {
        match self {
            Phase::Running {
                stage,
                used_single_photo,
            } => AnalysisStatus {
                is_analyzing: true,
                used_single_photo: *used_single_photo,
                stage: Some(*stage),
                ..AnalysisStatus::default()
            },
            Phase::Idle {
                used_fallback,
                used_single_photo,
                error,
            } => {
                let countdown = |kind: ErrorKind| {
                    error
                        .as_ref()
                        .filter(|f| f.is(kind))
                        .and_then(|f| f.wait_until_ms)
                        .map(|until| ceil_secs(Duration::from_millis(until.saturating_sub(now_ms))))
                        .unwrap_or(0)
                };
                AnalysisStatus {
                    is_analyzing: false,
                    error: error.as_ref().map(|f| f.message.clone()),
                    error_type: error.as_ref().and_then(|f| f.kind),
                    used_fallback: *used_fallback,
                    used_single_photo: *used_single_photo,
                    cooldown_remaining: countdown(ErrorKind::Cooldown),
                    rate_limit_wait: countdown(ErrorKind::RateLimit),
                    stage: None,
                }
            }
        }
    }
}

/// Observable status surface polled or subscribed to by the UI.
///
/// Countdown fields are whole seconds computed when the snapshot is
/// taken, so polling once per second shows them decaying.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisStatus {
    pub is_analyzing: bool,
    pub error: Option<String>,
    pub error_type: Option<ErrorKind>,
    pub used_fallback: bool,
    pub used_single_photo: bool,
    pub cooldown_remaining: u64,
    pub rate_limit_wait: u64,
    pub stage: Option<Stage>,
}

/// Shared phase + change notification.
pub(crate) struct StatusCell {
    phase: Mutex<Phase>,
    tx: watch::Sender<AnalysisStatus>,
}

impl StatusCell {
    pub(crate) fn new() -> Self {
        let (tx, _rx) = watch::channel(AnalysisStatus::default());
        Self {
            phase: Mutex::new(Phase::initial()),
            tx,
        }
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<AnalysisStatus> {
        self.tx.subscribe()
    }

    pub(crate) fn snapshot(&self, now_ms: u64) -> AnalysisStatus {
        self.with_phase(|p| p.snapshot(now_ms))
    }

    fn with_phase<T>(&self, f: impl FnOnce(&Phase) -> T) -> T {
        // A poisoned lock still holds a valid Phase; keep serving it.
        match self.phase.lock() {
            Ok(guard) => f(&guard),
            Err(poisoned) => f(&poisoned.into_inner()),
        }
    }

    /// Apply `f` to the phase and publish the new status.
    pub(crate) fn update(&self, now_ms: u64, f: impl FnOnce(&mut Phase)) {
        let status = {
            let mut guard = match self.phase.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            f(&mut guard);
            guard.snapshot(now_ms)
        };
        self.tx.send_replace(status);
    }

    pub(crate) fn set(&self, now_ms: u64, phase: Phase) {
        self.update(now_ms, |p| *p = phase);
    }

    /// Move to a new stage, keeping the single-photo flag. No-op if idle.
    pub(crate) fn set_stage(&self, now_ms: u64, stage: Stage) {
        self.update(now_ms, |p| {
            if let Phase::Running { stage: s, .. } = p {
                *s = stage;
            }
        });
    }

    pub(crate) fn mark_single_photo(&self, now_ms: u64) {
        self.update(now_ms, |p| {
            if let Phase::Running {
                used_single_photo, ..
            } = p
            {
                *used_single_photo = true;
            }
        });
    }

    /// Set an error while idle, keeping the last outcome flags.
    pub(crate) fn set_idle_error(&self, now_ms: u64, failure: Failure) {
        self.update(now_ms, |p| match p {
            Phase::Idle { error, .. } => *error = Some(failure),
            Phase::Running { .. } => {}
        });
    }

    pub(crate) fn clear_error(&self, now_ms: u64) {
        self.update(now_ms, |p| {
            if let Phase::Idle { error, .. } = p {
                *error = None;
            }
        });
    }

    /// Return to idle if still running. Used when an analysis is dropped
    /// mid-flight; the outcome is unknown, so no flags are set.
    pub(crate) fn abandon_if_running(&self, now_ms: u64) {
        self.update(now_ms, |p| {
            if let Phase::Running {
                used_single_photo, ..
            } = *p
            {
                *p = Phase::Idle {
                    used_fallback: false,
                    used_single_photo,
                    error: None,
                };
            }
        });
    }
}
