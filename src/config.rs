//! Service configuration
//!
//! Values are layered: serde defaults, then an optional TOML file, then
//! `SUGGEST_`-prefixed environment variables (`SUGGEST_SERVER__PORT=9000`).

use crate::error::{Error, Result};
use crate::ranking::StrategyKind;
use secrecy::SecretString;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub ranking: RankingConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub breaker: BreakerConfig,
}

/// HTTP server settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum accepted request body in bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 5010 }
fn default_max_body_bytes() -> usize { 2 * 1024 * 1024 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String { "info".to_string() }

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Record store seeding
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// JSON array of action records loaded at startup
    #[serde(default)]
    pub seed_file: Option<PathBuf>,

    /// Number of synthetic records generated at startup (0 disables)
    #[serde(default)]
    pub synthetic_records: usize,

    #[serde(default = "default_synthetic_seed")]
    pub synthetic_seed: u64,
}

fn default_synthetic_seed() -> u64 { 42 }

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            seed_file: None,
            synthetic_records: 0,
            synthetic_seed: default_synthetic_seed(),
        }
    }
}

/// Ranking pipeline settings
#[derive(Debug, Clone, Deserialize)]
pub struct RankingConfig {
    /// Strategy chain applied when a request does not name one
    #[serde(default = "default_strategies")]
    pub strategies: Vec<StrategyKind>,

    /// Draws per record for the sampled-reward strategy
    #[serde(default = "default_monte_carlo_samples")]
    pub monte_carlo_samples: usize,

    /// Fixed seed for stochastic strategies; entropy when unset
    #[serde(default)]
    pub seed: Option<u64>,

    /// Maximum records loaded per user
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_strategies() -> Vec<StrategyKind> {
    vec![
        StrategyKind::SampledReward,
        StrategyKind::SoftmaxPriority,
        StrategyKind::AggregateReward,
        StrategyKind::PosteriorBlend,
    ]
}
fn default_monte_carlo_samples() -> usize { crate::ranking::DEFAULT_MONTE_CARLO_SAMPLES }
fn default_history_limit() -> usize { 100 }

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            strategies: default_strategies(),
            monte_carlo_samples: default_monte_carlo_samples(),
            seed: None,
            history_limit: default_history_limit(),
        }
    }
}

/// Text-generation client settings
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// When disabled, suggestions come from the pattern-based generator
    #[serde(default)]
    pub enabled: bool,

    /// OpenAI-compatible chat completions endpoint
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_llm_model")]
    pub model: String,

    #[serde(default)]
    pub api_key: Option<SecretString>,

    #[serde(default = "default_llm_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_llm_retries")]
    pub max_retries: usize,

    #[serde(default = "default_llm_temperature")]
    pub temperature: f32,

    #[serde(default = "default_llm_max_tokens")]
    pub max_tokens: usize,
}

fn default_llm_endpoint() -> String { "https://api.openai.com/v1/chat/completions".to_string() }
fn default_llm_model() -> String { "gpt-4o-mini".to_string() }
fn default_llm_timeout_ms() -> u64 { 30_000 }
fn default_llm_retries() -> usize { 3 }
fn default_llm_temperature() -> f32 { 0.7 }
fn default_llm_max_tokens() -> usize { 600 }

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_llm_endpoint(),
            model: default_llm_model(),
            api_key: None,
            timeout_ms: default_llm_timeout_ms(),
            max_retries: default_llm_retries(),
            temperature: default_llm_temperature(),
            max_tokens: default_llm_max_tokens(),
        }
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Suggestion cache settings
#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,

    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,

    #[serde(default = "default_cache_entries")]
    pub max_entries: u64,
}

fn default_cache_enabled() -> bool { true }
fn default_cache_ttl() -> u64 { 300 }
fn default_cache_entries() -> u64 { 1000 }

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            ttl_secs: default_cache_ttl(),
            max_entries: default_cache_entries(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// Circuit breaker around the text-generation client
#[derive(Debug, Clone, Deserialize)]
pub struct BreakerConfig {
    #[serde(default = "default_breaker_failures")]
    pub failure_threshold: usize,

    #[serde(default = "default_breaker_reset")]
    pub reset_secs: u64,
}

fn default_breaker_failures() -> usize { 5 }
fn default_breaker_reset() -> u64 { 30 }

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_breaker_failures(),
            reset_secs: default_breaker_reset(),
        }
    }
}

impl BreakerConfig {
    pub fn reset_timeout(&self) -> Duration {
        Duration::from_secs(self.reset_secs)
    }
}

impl Config {
    /// Load from an optional config file (extension inferred) and the environment
    pub fn from_file(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("SUGGEST")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("ranking.strategies"),
            )
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `config.toml` in the working directory plus the environment
    pub fn load() -> Result<Self> {
        Self::from_file("config")
    }

    /// Reject settings the service cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(Error::Configuration("server.port must be non-zero".to_string()));
        }
        if self.ranking.monte_carlo_samples == 0 {
            return Err(Error::Configuration(
                "ranking.monte_carlo_samples must be at least 1".to_string(),
            ));
        }
        if self.ranking.history_limit == 0 {
            return Err(Error::Configuration(
                "ranking.history_limit must be at least 1".to_string(),
            ));
        }
        if self.cache.enabled && self.cache.max_entries == 0 {
            return Err(Error::Configuration(
                "cache.max_entries must be non-zero when the cache is enabled".to_string(),
            ));
        }
        if self.llm.enabled && self.llm.endpoint.is_empty() {
            return Err(Error::Configuration(
                "llm.endpoint is required when the LLM is enabled".to_string(),
            ));
        }
        Ok(())
    }
}
