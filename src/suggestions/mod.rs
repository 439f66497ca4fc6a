//! Next-action suggestions
//!
//! Text generation over a user's raw history, guarded by a circuit breaker
//! with a pattern-based fallback and a fingerprinted TTL cache.

pub mod cache;
pub mod circuit_breaker;
pub mod generator;
pub mod service;

pub use cache::SuggestionCache;
pub use circuit_breaker::{BreakerState, CircuitBreaker, CircuitBreakerConfig};
pub use generator::{
    LlmSuggestionGenerator, PatternSuggestionGenerator, SuggestionError, SuggestionGenerator,
};
pub use service::{Suggestion, SuggestionService, SuggestionSource};
