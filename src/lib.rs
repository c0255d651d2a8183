//! Hairline Scan — analysis client library.
//!
//! Module declarations and the public surface only. No business logic
//! lives here.
//!
//! Domains:
//!   - capture/       — photo slots, compression, payload sizing
//!   - cooldown/      — last-analysis timestamp store + clock ports
//!   - llm/           — request/response types, transports, fallback
//!   - orchestrator/  — single-flight, cooldown, retry, status
//!   - config.rs      — env / `.env` configuration

pub mod capture;
pub mod config;
pub mod cooldown;
pub mod llm;
pub mod orchestrator;

pub use capture::{CapturedPhotos, EncodedImage, PhotoSlot};
pub use config::{AnalyzerConfig, ConfigError, Provider, RetryPolicy};
pub use cooldown::{Clock, CooldownStore, FileCooldownStore, ManualClock, MemoryCooldownStore, SystemClock};
pub use llm::{AnalysisResult, AnalysisTransport, QuestionnaireData};
pub use orchestrator::{AnalysisStatus, ErrorKind, Orchestrator, Stage};
