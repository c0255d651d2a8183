//! Configuration — env vars, `.env.local`/`.env`, and fixed defaults.
//!
//! Variables:
//!   HAIRLINE_PROVIDER      "proxy" | "gemini" (optional override)
//!   HAIRLINE_ENDPOINT      proxy URL for the analysis backend
//!   GEMINI_API_KEY         key for the direct Gemini transport
//!   HAIRLINE_GEMINI_MODEL  model id (default gemini-2.0-flash)
//!   HAIRLINE_MAX_WIDTH     compression max width in px (default 1024)
//!   HAIRLINE_JPEG_QUALITY  1–100 (default 70)
//!   HAIRLINE_COOLDOWN_SECS minimum seconds between analyses (default 20)
//!   HAIRLINE_STATE_DIR     where the cooldown timestamp lives

use crate::capture::MAX_PAYLOAD_BYTES;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_MAX_WIDTH: u32 = 1024;
pub const DEFAULT_JPEG_QUALITY: u8 = 70;
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(20);
pub const DEFAULT_RATE_LIMIT_WAIT: Duration = Duration::from_secs(60);
pub const MAX_ATTEMPTS: u32 = 3;
pub const BACKOFF_SCHEDULE: [Duration; 3] = [
    Duration::from_secs(2),
    Duration::from_secs(4),
    Duration::from_secs(8),
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Which transport carries the analysis request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Proxy,
    Gemini,
}

impl Provider {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "proxy" | "backend" => Some(Provider::Proxy),
            "gemini" => Some(Provider::Gemini),
            _ => None,
        }
    }
}

/// Bounded retry with a fixed backoff per attempt index.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay after attempt `i` (0-based). The last entry is reused if the
    /// schedule is shorter than the attempt budget.
    pub backoff: Vec<Duration>,
}

impl RetryPolicy {
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff
            .get(attempt as usize)
            .or_else(|| self.backoff.last())
            .copied()
            .unwrap_or(Duration::ZERO)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            backoff: BACKOFF_SCHEDULE.to_vec(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    pub provider: Provider,
    pub endpoint: Option<String>,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub max_width: u32,
    pub jpeg_quality: u8,
    /// Combined photo payload ceiling before trimming to one photo.
    pub max_payload_bytes: u64,
    pub cooldown: Duration,
    pub retry: RetryPolicy,
    /// Used when a rate-limit response carries no wait hint.
    pub default_rate_limit_wait: Duration,
    /// Directory for the cooldown state file. `None` → platform config dir.
    pub state_dir: Option<PathBuf>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            provider: Provider::Proxy,
            endpoint: None,
            gemini_api_key: None,
            gemini_model: crate::llm::prompts::GEMINI_MODEL.to_string(),
            max_width: DEFAULT_MAX_WIDTH,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            max_payload_bytes: MAX_PAYLOAD_BYTES,
            cooldown: DEFAULT_COOLDOWN,
            retry: RetryPolicy::default(),
            default_rate_limit_wait: DEFAULT_RATE_LIMIT_WAIT,
            state_dir: None,
        }
    }
}

impl AnalyzerConfig {
    /// Build from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key → value lookup (env in production, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = AnalyzerConfig {
            endpoint: get("HAIRLINE_ENDPOINT"),
            gemini_api_key: get("GEMINI_API_KEY"),
            ..AnalyzerConfig::default()
        };

        if let Some(model) = get("HAIRLINE_GEMINI_MODEL") {
            config.gemini_model = model;
        }
        if let Some(v) = get("HAIRLINE_MAX_WIDTH") {
            config.max_width = parse_number("HAIRLINE_MAX_WIDTH", &v, 1, 8192)?;
        }
        if let Some(v) = get("HAIRLINE_JPEG_QUALITY") {
            config.jpeg_quality = parse_number("HAIRLINE_JPEG_QUALITY", &v, 1, 100)?;
        }
        if let Some(v) = get("HAIRLINE_COOLDOWN_SECS") {
            let secs: u64 = parse_number("HAIRLINE_COOLDOWN_SECS", &v, 0, 86_400)?;
            config.cooldown = Duration::from_secs(secs);
        }
        config.state_dir = get("HAIRLINE_STATE_DIR").map(PathBuf::from);
        config.provider = resolve_provider(get("HAIRLINE_PROVIDER").as_deref(), &config)?;

        log::info!(
            "[CONFIG] provider={:?} max_width={} quality={} cooldown={}s",
            config.provider,
            config.max_width,
            config.jpeg_quality,
            config.cooldown.as_secs()
        );
        Ok(config)
    }

    /// File that holds the cooldown timestamp.
    pub fn state_file(&self) -> Option<PathBuf> {
        let dir = match &self.state_dir {
            Some(d) => d.clone(),
            None => dirs::config_dir()?.join("hairline-scan"),
        };
        Some(dir.join("state.json"))
    }
}

/// Determine which transport to use.
///
/// Priority:
/// 1. HAIRLINE_PROVIDER (explicit override)
/// 2. First configured transport: proxy endpoint, then Gemini key
/// 3. Proxy (transport construction will report the missing endpoint)
fn resolve_provider(explicit: Option<&str>, config: &AnalyzerConfig) -> Result<Provider, ConfigError> {
    if let Some(raw) = explicit {
        let provider = Provider::parse(raw).ok_or_else(|| ConfigError::InvalidValue {
            key: "HAIRLINE_PROVIDER",
            value: raw.to_string(),
            reason: "expected \"proxy\" or \"gemini\"".to_string(),
        })?;
        log::info!("[CONFIG] Provider override: {:?}", provider);
        return Ok(provider);
    }
    if config.endpoint.is_some() {
        return Ok(Provider::Proxy);
    }
    if config.gemini_api_key.is_some() {
        return Ok(Provider::Gemini);
    }
    Ok(Provider::Proxy)
}

fn parse_number<T>(key: &'static str, raw: &str, min: T, max: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr + PartialOrd + std::fmt::Display + Copy,
    T::Err: std::fmt::Display,
{
    let invalid = |reason: String| ConfigError::InvalidValue {
        key,
        value: raw.to_string(),
        reason,
    };
    let value = raw.trim().parse::<T>().map_err(|e| invalid(e.to_string()))?;
    if value < min || value > max {
        return Err(invalid(format!("must be between {} and {}", min, max)));
    }
    Ok(value)
}

/// Load `.env.local` → `.env` from `dir`; the first file found wins.
///
/// Returns the path that was loaded, if any. Variables already set in the
/// process environment are not overridden.
pub fn load_env_files(dir: &Path) -> Option<PathBuf> {
    for env_file in [".env.local", ".env"] {
        let path = dir.join(env_file);
        if !path.exists() {
            continue;
        }
        match dotenvy::from_path(&path) {
            Ok(_) => {
                log::info!("[CONFIG] Loaded {}", path.display());
                return Some(path);
            }
            Err(e) => log::warn!("[CONFIG] Failed to load {}: {}", path.display(), e),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_match_documented_constants() {
        let c = AnalyzerConfig::default();
        assert_eq!(c.cooldown, Duration::from_secs(20));
        assert_eq!(c.max_payload_bytes, 1_572_864);
        assert_eq!(c.retry.max_attempts, 3);
        assert_eq!(c.retry.delay_for(0), Duration::from_secs(2));
        assert_eq!(c.retry.delay_for(1), Duration::from_secs(4));
        assert_eq!(c.retry.delay_for(2), Duration::from_secs(8));
        assert_eq!(c.retry.delay_for(9), Duration::from_secs(8));
    }

    #[test]
    fn endpoint_selects_proxy_and_key_selects_gemini() {
        let c = AnalyzerConfig::from_lookup(lookup(&[("HAIRLINE_ENDPOINT", "http://x/analyze")])).unwrap();
        assert_eq!(c.provider, Provider::Proxy);

        let c = AnalyzerConfig::from_lookup(lookup(&[("GEMINI_API_KEY", "abc")])).unwrap();
        assert_eq!(c.provider, Provider::Gemini);
    }

    #[test]
    fn explicit_provider_wins() {
        let c = AnalyzerConfig::from_lookup(lookup(&[
            ("HAIRLINE_ENDPOINT", "http://x/analyze"),
            ("GEMINI_API_KEY", "abc"),
            ("HAIRLINE_PROVIDER", "Gemini"),
        ]))
        .unwrap();
        assert_eq!(c.provider, Provider::Gemini);
    }

    #[test]
    fn numeric_overrides_are_validated() {
        let c = AnalyzerConfig::from_lookup(lookup(&[
            ("HAIRLINE_MAX_WIDTH", "800"),
            ("HAIRLINE_JPEG_QUALITY", "55"),
            ("HAIRLINE_COOLDOWN_SECS", "5"),
        ]))
        .unwrap();
        assert_eq!(c.max_width, 800);
        assert_eq!(c.jpeg_quality, 55);
        assert_eq!(c.cooldown, Duration::from_secs(5));

        assert!(AnalyzerConfig::from_lookup(lookup(&[("HAIRLINE_JPEG_QUALITY", "150")])).is_err());
        assert!(AnalyzerConfig::from_lookup(lookup(&[("HAIRLINE_MAX_WIDTH", "wide")])).is_err());
        assert!(AnalyzerConfig::from_lookup(lookup(&[("HAIRLINE_PROVIDER", "openai")])).is_err());
    }

    #[test]
    fn state_dir_override_is_used() {
        let c = AnalyzerConfig::from_lookup(lookup(&[("HAIRLINE_STATE_DIR", "/tmp/hs")])).unwrap();
        assert_eq!(c.state_file(), Some(PathBuf::from("/tmp/hs/state.json")));
    }

    #[test]
    fn env_file_loading_prefers_local() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".env"), "HAIRLINE_TEST_ENV_ORDER=plain\n").unwrap();
        std::fs::write(dir.path().join(".env.local"), "HAIRLINE_TEST_ENV_ORDER=local\n").unwrap();
        let loaded = load_env_files(dir.path()).unwrap();
        assert!(loaded.ends_with(".env.local"));
        assert_eq!(std::env::var("HAIRLINE_TEST_ENV_ORDER").unwrap(), "local");
    }
}
