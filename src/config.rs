//! Pipeline configuration
//!
//! Thresholds, paths and model settings, read from the environment.
//! The binaries load `.env` before calling [`PipelineConfig::from_env`].

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Which embedding function backs the retrieval stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingBackend {
    /// Deterministic local feature hashing, no network.
    Hashing,
    /// Gemini `embedContent`.
    Gemini,
}

impl FromStr for EmbeddingBackend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hashing" | "hash" | "local" => Ok(EmbeddingBackend::Hashing),
            "gemini" => Ok(EmbeddingBackend::Gemini),
            other => Err(format!("unknown embedding backend '{}'", other)),
        }
    }
}

/// How the financial path phrases its final answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthesisMode {
    /// Lead with a direct answer to the user's question.
    DirectAnswer,
    /// One-paragraph market brief, question not included.
    Brief,
}

impl FromStr for SynthesisMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "direct" | "direct_answer" | "answer" => Ok(SynthesisMode::DirectAnswer),
            "brief" => Ok(SynthesisMode::Brief),
            other => Err(format!("unknown synthesis mode '{}'", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Best retrieval distance above this routes to clarification.
    /// Specific to the embedding function in use.
    pub confidence_threshold: f32,
    /// Allocation deltas (in percentage points) at or below this are not reported.
    pub negligible_change_pp: f64,
    pub retrieval_k: usize,
    pub synthesis_mode: SynthesisMode,
    pub portfolio_path: PathBuf,
    pub previous_portfolio_path: PathBuf,
    /// Per-ticker bound on a feed fetch.
    pub scrape_timeout: Duration,
    pub gemini_api_key: String,
    pub generation_model: String,
    pub embedding_backend: EmbeddingBackend,
    pub port: u16,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 1.2,
            negligible_change_pp: 0.01,
            retrieval_k: 5,
            synthesis_mode: SynthesisMode::DirectAnswer,
            portfolio_path: PathBuf::from("portfolio.json"),
            previous_portfolio_path: PathBuf::from("daily_log.json"),
            scrape_timeout: Duration::from_secs(10),
            gemini_api_key: String::new(),
            generation_model: "gemini-2.5-flash".to_string(),
            embedding_backend: EmbeddingBackend::Hashing,
            port: 8000,
        }
    }
}

impl PipelineConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let gemini_api_key = env::var("GEMINI_API_KEY")
            .or_else(|_| env::var("GOOGLE_API_KEY"))
            .unwrap_or_default();

        let default_backend = if gemini_api_key.is_empty() {
            EmbeddingBackend::Hashing
        } else {
            EmbeddingBackend::Gemini
        };

        let port = match env::var("PORT").or_else(|_| env::var("API_PORT")) {
            Ok(raw) => parse_or_default("PORT", &raw, defaults.port),
            Err(_) => defaults.port,
        };

        Self {
            confidence_threshold: env_threshold(
                "CONFIDENCE_THRESHOLD",
                defaults.confidence_threshold,
                |v| v.is_finite() && v > 0.0,
            ),
            negligible_change_pp: env_threshold(
                "NEGLIGIBLE_CHANGE_THRESHOLD",
                defaults.negligible_change_pp,
                |v| v.is_finite() && v >= 0.0,
            ),
            retrieval_k: env_or("RETRIEVAL_TOP_K", defaults.retrieval_k).max(1),
            synthesis_mode: env_or("SYNTHESIS_MODE", defaults.synthesis_mode),
            portfolio_path: env::var("PORTFOLIO_CONFIG_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.portfolio_path),
            previous_portfolio_path: env::var("DAILY_LOG_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.previous_portfolio_path),
            scrape_timeout: Duration::from_secs(env_or(
                "SCRAPE_TIMEOUT_SECS",
                defaults.scrape_timeout.as_secs(),
            )),
            generation_model: env::var("GEMINI_MODEL").unwrap_or(defaults.generation_model),
            embedding_backend: env_or("EMBEDDING_BACKEND", default_backend),
            gemini_api_key,
            port,
        }
    }
}

fn env_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => parse_or_default(key, &raw, default),
        Err(_) => default,
    }
}

fn env_threshold<T>(key: &str, default: T, valid: fn(f64) -> bool) -> T
where
    T: FromStr + Into<f64> + Copy,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => parse_threshold(key, &raw, default, valid),
        Err(_) => default,
    }
}

/// Like [`parse_or_default`], but a parsed value failing `valid` (NaN,
/// infinities, out-of-range signs) also falls back to the default.
fn parse_threshold<T>(key: &str, raw: &str, default: T, valid: fn(f64) -> bool) -> T
where
    T: FromStr + Into<f64> + Copy,
    T::Err: std::fmt::Display,
{
    let value = parse_or_default(key, raw, default);
    if valid(value.into()) {
        value
    } else {
        warn!(key, value = raw, "Ignoring out-of-range threshold");
        default
    }
}

fn parse_or_default<T>(key: &str, raw: &str, default: T) -> T
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw.trim().parse::<T>() {
        Ok(value) => value,
        Err(e) => {
            warn!(key, value = raw, error = %e, "Ignoring unparseable config value");
            default
        }
    }
}
