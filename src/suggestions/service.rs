//! Suggestion service: cache, breaker-guarded primary, fallback

use super::cache::SuggestionCache;
use super::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig};
use super::generator::{
    LlmSuggestionGenerator, PatternSuggestionGenerator, SuggestionError, SuggestionGenerator,
};
use crate::config::Config;
use crate::metrics::METRICS;
use crate::ranking::ActionRecord;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Where a suggestion text came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionSource {
    Primary,
    Fallback,
    Cache,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    pub text: String,
    pub source: SuggestionSource,
}

pub struct SuggestionService {
    primary: Arc<dyn SuggestionGenerator>,
    fallback: Option<Arc<dyn SuggestionGenerator>>,
    breaker: CircuitBreaker,
    cache: Option<SuggestionCache>,
}

impl SuggestionService {
    pub fn new(
        primary: Arc<dyn SuggestionGenerator>,
        fallback: Option<Arc<dyn SuggestionGenerator>>,
        breaker: CircuitBreakerConfig,
        cache: Option<SuggestionCache>,
    ) -> Self {
        Self {
            primary,
            fallback,
            breaker: CircuitBreaker::new(breaker),
            cache,
        }
    }

    /// Wire generators from configuration
    ///
    /// With the LLM enabled it is the primary and the pattern generator is
    /// the fallback; otherwise the pattern generator serves alone.
    pub fn from_config(config: &Config) -> Result<Self, SuggestionError> {
        let pattern: Arc<dyn SuggestionGenerator> = Arc::new(PatternSuggestionGenerator);

        let (primary, fallback) = if config.llm.enabled {
            let llm: Arc<dyn SuggestionGenerator> = Arc::new(LlmSuggestionGenerator::new(&config.llm)?);
            (llm, Some(pattern))
        } else {
            (pattern, None)
        };

        let cache = config
            .cache
            .enabled
            .then(|| SuggestionCache::new(config.cache.ttl(), config.cache.max_entries));

        Ok(Self::new(
            primary,
            fallback,
            CircuitBreakerConfig::from(&config.breaker),
            cache,
        ))
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Suggest next actions for `user_id` from their raw history
    pub async fn suggest(
        &self,
        user_id: &str,
        history: &[ActionRecord],
    ) -> Result<Suggestion, SuggestionError> {
        let key = self.cache.as_ref().map(|_| SuggestionCache::key(user_id, history));

        if let (Some(cache), Some(key)) = (&self.cache, &key) {
            let cached = cache.get(key).await;
            METRICS.record_suggestion_cache(cached.is_some());
            if let Some(text) = cached {
                return Ok(Suggestion {
                    text,
                    source: SuggestionSource::Cache,
                });
            }
        }

        let suggestion = self.generate(history).await?;

        // Fallback text is never cached so a recovered primary is used again
        if suggestion.source == SuggestionSource::Primary {
            if let (Some(cache), Some(key)) = (&self.cache, key) {
                cache.insert(key, suggestion.text.clone()).await;
            }
        }

        Ok(suggestion)
    }

    async fn generate(&self, history: &[ActionRecord]) -> Result<Suggestion, SuggestionError> {
        // Checked before the breaker so a half-open trial is never spent on it
        if history.is_empty() {
            return Err(SuggestionError::EmptyHistory);
        }

        let primary_error = if self.breaker.is_open() {
            warn!("Suggestion breaker open, skipping primary generator");
            SuggestionError::CircuitOpen
        } else {
            match self.primary.suggest(history).await {
                Ok(text) => {
                    self.breaker.mark_success();
                    return Ok(Suggestion {
                        text,
                        source: SuggestionSource::Primary,
                    });
                }
                Err(SuggestionError::EmptyHistory) => return Err(SuggestionError::EmptyHistory),
                Err(e) => {
                    self.breaker.mark_failure();
                    warn!(error = %e, "Primary suggestion generator failed");
                    e
                }
            }
        };

        match &self.fallback {
            Some(fallback) => {
                info!("Serving suggestions from fallback generator");
                METRICS.suggestion_fallbacks.inc();
                let text = fallback.suggest(history).await?;
                Ok(Suggestion {
                    text,
                    source: SuggestionSource::Fallback,
                })
            }
            None => Err(primary_error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct FailingGenerator {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SuggestionGenerator for FailingGenerator {
        async fn suggest(&self, _history: &[ActionRecord]) -> Result<String, SuggestionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(SuggestionError::NetworkError("connection refused".to_string()))
        }
    }

    struct CountingGenerator {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SuggestionGenerator for CountingGenerator {
        async fn suggest(&self, _history: &[ActionRecord]) -> Result<String, SuggestionError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("suggestion #{}", n))
        }
    }

    /// Fails the first `failures` calls, then succeeds
    struct RecoveringGenerator {
        failures: usize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SuggestionGenerator for RecoveringGenerator {
        async fn suggest(&self, _history: &[ActionRecord]) -> Result<String, SuggestionError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(SuggestionError::ApiError("HTTP 503".to_string()))
            } else {
                Ok("fresh suggestion".to_string())
            }
        }
    }

    fn history() -> Vec<ActionRecord> {
        vec![ActionRecord::new("U1", "Calendar Agent", "Update Event").with_feedback(4.0)]
    }

    #[tokio::test]
    async fn test_fallback_on_primary_failure() {
        let primary = Arc::new(FailingGenerator { calls: AtomicUsize::new(0) });
        let service = SuggestionService::new(
            primary.clone(),
            Some(Arc::new(PatternSuggestionGenerator)),
            CircuitBreakerConfig {
                failure_threshold: 2,
                reset_timeout: Duration::from_secs(60),
            },
            None,
        );

        for _ in 0..3 {
            let suggestion = service.suggest("U1", &history()).await.unwrap();
            assert_eq!(suggestion.source, SuggestionSource::Fallback);
        }

        // Third call short-circuits once the breaker opened
        assert_eq!(primary.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_error_without_fallback() {
        let service = SuggestionService::new(
            Arc::new(FailingGenerator { calls: AtomicUsize::new(0) }),
            None,
            CircuitBreakerConfig::default(),
            None,
        );

        let result = service.suggest("U1", &history()).await;
        assert!(matches!(result, Err(SuggestionError::NetworkError(_))));
    }

    #[tokio::test]
    async fn test_cache_serves_repeat_requests() {
        let primary = Arc::new(CountingGenerator { calls: AtomicUsize::new(0) });
        let service = SuggestionService::new(
            primary.clone(),
            None,
            CircuitBreakerConfig::default(),
            Some(SuggestionCache::new(Duration::from_secs(60), 10)),
        );

        let history = history();
        let first = service.suggest("U1", &history).await.unwrap();
        let second = service.suggest("U1", &history).await.unwrap();

        assert_eq!(first.source, SuggestionSource::Primary);
        assert_eq!(second.source, SuggestionSource::Cache);
        assert_eq!(first.text, second.text);
        assert_eq!(primary.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fallback_text_is_not_cached() {
        let primary = Arc::new(RecoveringGenerator {
            failures: 1,
            calls: AtomicUsize::new(0),
        });
        let service = SuggestionService::new(
            primary.clone(),
            Some(Arc::new(PatternSuggestionGenerator)),
            CircuitBreakerConfig::default(),
            Some(SuggestionCache::new(Duration::from_secs(60), 10)),
        );

        let history = history();
        let first = service.suggest("U1", &history).await.unwrap();
        assert_eq!(first.source, SuggestionSource::Fallback);

        let second = service.suggest("U1", &history).await.unwrap();
        assert_eq!(second.source, SuggestionSource::Primary);
        assert_eq!(second.text, "fresh suggestion");

        let third = service.suggest("U1", &history).await.unwrap();
        assert_eq!(third.source, SuggestionSource::Cache);
        assert_eq!(primary.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_from_default_config_uses_patterns() {
        let service = SuggestionService::from_config(&Config::default()).unwrap();
        let suggestion = service.suggest("U1", &history()).await.unwrap();
        assert_eq!(suggestion.source, SuggestionSource::Primary);
        assert!(suggestion.text.contains("Calendar Agent"));
    }
}
