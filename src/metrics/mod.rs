//! Metrics collection for observability

use prometheus::{
    Counter, CounterVec, HistogramOpts, HistogramVec, Opts, Registry,
    register_counter_vec_with_registry, register_counter_with_registry,
    register_histogram_vec_with_registry,
};
use std::sync::Arc;
use once_cell::sync::Lazy;

/// Global metrics registry
pub static METRICS: Lazy<Arc<Metrics>> = Lazy::new(|| {
    Arc::new(Metrics::new().expect("Failed to initialize metrics"))
});

/// Metrics collector
pub struct Metrics {
    registry: Registry,

    // Ranking metrics
    pub rank_requests: CounterVec,
    pub ranking_stages: CounterVec,
    pub ranking_stage_duration: HistogramVec,

    // Suggestion metrics
    pub suggestion_requests: CounterVec,
    pub suggestion_fallbacks: Counter,
    pub suggestion_cache_hits: Counter,
    pub suggestion_cache_misses: Counter,

    // Record store metrics
    pub records_appended: Counter,

    pub request_duration: HistogramVec,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let registry = Registry::new();

        let rank_requests = register_counter_vec_with_registry!(
            Opts::new("rank_requests_total", "Total ranking requests"),
            &["status"],
            registry
        )?;

        let ranking_stages = register_counter_vec_with_registry!(
            Opts::new("ranking_stages_total", "Ranking stages executed by outcome"),
            &["strategy", "status"],
            registry
        )?;

        let ranking_stage_duration = register_histogram_vec_with_registry!(
            HistogramOpts::new(
                "ranking_stage_duration_seconds",
                "Ranking stage duration in seconds"
            )
            .buckets(vec![0.00001, 0.0001, 0.001, 0.01, 0.1, 1.0]),
            &["strategy"],
            registry
        )?;

        let suggestion_requests = register_counter_vec_with_registry!(
            Opts::new("suggestion_requests_total", "Total suggestion requests"),
            &["status"],
            registry
        )?;

        let suggestion_fallbacks = register_counter_with_registry!(
            Opts::new("suggestion_fallbacks_total", "Suggestions served by the fallback generator"),
            registry
        )?;

        let suggestion_cache_hits = register_counter_with_registry!(
            Opts::new("suggestion_cache_hits_total", "Suggestion cache hits"),
            registry
        )?;

        let suggestion_cache_misses = register_counter_with_registry!(
            Opts::new("suggestion_cache_misses_total", "Suggestion cache misses"),
            registry
        )?;

        let records_appended = register_counter_with_registry!(
            Opts::new("records_appended_total", "Action records appended to the store"),
            registry
        )?;

        let request_duration = register_histogram_vec_with_registry!(
            "http_request_duration_seconds",
            "API request duration in seconds",
            &["endpoint"],
            registry
        )?;

        Ok(Self {
            registry,
            rank_requests,
            ranking_stages,
            ranking_stage_duration,
            suggestion_requests,
            suggestion_fallbacks,
            suggestion_cache_hits,
            suggestion_cache_misses,
            records_appended,
            request_duration,
        })
    }

    /// Get the metrics registry for exporting
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Record a ranking request
    pub fn record_rank(&self, success: bool) {
        let status = if success { "success" } else { "error" };
        self.rank_requests.with_label_values(&[status]).inc();
    }

    /// Record one pipeline stage
    pub fn record_ranking_stage(&self, strategy: &str, applied: bool, seconds: f64) {
        let status = if applied { "applied" } else { "failed" };
        self.ranking_stages.with_label_values(&[strategy, status]).inc();
        self.ranking_stage_duration
            .with_label_values(&[strategy])
            .observe(seconds);
    }

    /// Record a suggestion request
    pub fn record_suggestion(&self, success: bool) {
        let status = if success { "success" } else { "error" };
        self.suggestion_requests.with_label_values(&[status]).inc();
    }

    /// Record a suggestion cache lookup
    pub fn record_suggestion_cache(&self, hit: bool) {
        if hit {
            self.suggestion_cache_hits.inc();
        } else {
            self.suggestion_cache_misses.inc();
        }
    }

    /// Observe request latency for an endpoint
    pub fn observe_request(&self, endpoint: &str, seconds: f64) {
        self.request_duration
            .with_label_values(&[endpoint])
            .observe(seconds);
    }

    /// Export metrics in Prometheus text format
    pub fn export_prometheus(&self) -> String {
        use prometheus::Encoder;

        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();

        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer).unwrap_or_default();

        String::from_utf8(buffer).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_initialization() {
        let metrics = Metrics::new();
        assert!(metrics.is_ok());
    }

    #[test]
    fn test_record_ranking_stage() {
        let metrics = Metrics::new().unwrap();
        metrics.record_ranking_stage("aggregate_reward", true, 0.0001);
        metrics.record_ranking_stage("aggregate_reward", false, 0.0002);

        let value = metrics
            .ranking_stages
            .with_label_values(&["aggregate_reward", "failed"])
            .get();
        assert_eq!(value, 1.0);
    }

    #[test]
    fn test_export_contains_registered_metrics() {
        let metrics = Metrics::new().unwrap();
        metrics.record_rank(true);
        metrics.record_suggestion_cache(false);

        let text = metrics.export_prometheus();
        assert!(text.contains("rank_requests_total"));
        assert!(text.contains("suggestion_cache_misses_total"));
    }
}
