//! HTTP handlers

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

use super::models::*;
use crate::config::RankingConfig;
use crate::error::Error;
use crate::metrics::METRICS;
use crate::ranking::{ActionRecord, RankOutcome, RankingPipeline, StrategyKind};
use crate::records::{RecordSource, UserPatterns};
use crate::suggestions::{SuggestionError, SuggestionService};

/// Upper bound on records accepted by the ad-hoc ranking endpoint
pub const MAX_RANK_RECORDS: usize = 10_000;

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub records: Arc<dyn RecordSource>,
    pub suggestions: Arc<SuggestionService>,
    pub ranking: Arc<RankingConfig>,
}

impl AppState {
    /// Pipeline for a request, falling back to configured strategies and seed
    fn pipeline(&self, kinds: Option<Vec<StrategyKind>>, seed: Option<u64>) -> RankingPipeline {
        let kinds = kinds.unwrap_or_else(|| self.ranking.strategies.clone());
        let pipeline = RankingPipeline::from_kinds(&kinds, self.ranking.monte_carlo_samples);

        match seed.or(self.ranking.seed) {
            Some(seed) => pipeline.with_seed(seed),
            None => pipeline,
        }
    }
}

fn validation_error(message: impl Into<String>) -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiError::new(error_codes::VALIDATION_ERROR, message)),
    )
}

fn store_error(e: Error) -> (StatusCode, Json<ApiError>) {
    match e {
        Error::Validation(msg) => validation_error(msg),
        other => {
            error!("Record store failure: {}", other);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiError::new(error_codes::INTERNAL_ERROR, other.to_string())),
            )
        }
    }
}

/// Rank a user's recent actions and suggest what to do next
///
/// GET /api/user-suggestions/:user_id
pub async fn get_user_suggestions(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(query): Query<SuggestionQuery>,
) -> ApiResult<Json<SuggestionResponse>> {
    let start = Instant::now();
    info!(user_id = %user_id, "Suggestion request");

    let kinds = match query.strategies.as_deref() {
        Some(list) => Some(StrategyKind::parse_list(list).map_err(|e| {
            METRICS.record_suggestion(false);
            validation_error(e)
        })?),
        None => None,
    };

    let history = state
        .records
        .recent_actions(&user_id, state.ranking.history_limit)
        .await
        .map_err(|e| {
            METRICS.record_suggestion(false);
            store_error(e)
        })?;

    if history.is_empty() {
        METRICS.record_suggestion(false);
        return Err((
            StatusCode::NOT_FOUND,
            Json(ApiError::new(
                error_codes::NOT_FOUND,
                "No recent user history found",
            )),
        ));
    }

    // Ranking works on its own copy; the generator sees the raw history
    let outcome = state.pipeline(kinds, query.seed).rank(history.clone());

    let suggestion = match state.suggestions.suggest(&user_id, &history).await {
        Ok(suggestion) => suggestion,
        Err(e) => {
            METRICS.record_suggestion(false);
            error!(user_id = %user_id, error = %e, "Suggestion generation failed");
            let status = match e {
                SuggestionError::EmptyHistory => StatusCode::NOT_FOUND,
                _ => StatusCode::BAD_GATEWAY,
            };
            return Err((
                status,
                Json(ApiError::new(
                    error_codes::UPSTREAM_ERROR,
                    format!("Error generating suggestions: {}", e),
                )),
            ));
        }
    };

    METRICS.record_suggestion(true);
    METRICS.observe_request("user_suggestions", start.elapsed().as_secs_f64());

    Ok(Json(SuggestionResponse {
        user_id,
        timestamp: Utc::now(),
        recent_actions_analyzed: history.len(),
        suggestions: suggestion.text,
        suggestion_source: suggestion.source,
        user_patterns: UserPatterns::from_history(&history),
        ranked_actions: outcome.records,
        stages: outcome.stages,
    }))
}

/// Rank caller-supplied records
///
/// POST /api/v1/rank
pub async fn rank_records(
    State(state): State<AppState>,
    Json(request): Json<RankRequest>,
) -> ApiResult<Json<RankOutcome>> {
    let start = Instant::now();
    info!("Rank request: {} records", request.records.len());

    if request.records.len() > MAX_RANK_RECORDS {
        METRICS.record_rank(false);
        return Err(validation_error(format!(
            "Cannot rank more than {} records",
            MAX_RANK_RECORDS
        )));
    }

    let outcome = state
        .pipeline(request.strategies, request.seed)
        .rank(request.records);

    METRICS.record_rank(true);
    METRICS.observe_request("rank", start.elapsed().as_secs_f64());

    Ok(Json(outcome))
}

/// Append a logged action
///
/// POST /api/v1/actions
pub async fn record_action(
    State(state): State<AppState>,
    Json(mut record): Json<ActionRecord>,
) -> ApiResult<(StatusCode, Json<RecordActionResponse>)> {
    if record.user_id.trim().is_empty() {
        return Err(validation_error("user_id cannot be empty"));
    }
    if record.agent_used.trim().is_empty() {
        return Err(validation_error("agent_used cannot be empty"));
    }
    if !(0.0..=5.0).contains(&record.feedback_score) {
        return Err(validation_error("feedback_score must be between 0.0 and 5.0"));
    }
    if let Some(reward) = record.reward {
        if !reward.is_finite() {
            return Err(validation_error("reward must be a finite number"));
        }
    }
    if record.session_id.is_empty() {
        record.session_id = uuid::Uuid::new_v4().to_string();
    }

    let response = RecordActionResponse {
        user_id: record.user_id.clone(),
        session_id: record.session_id.clone(),
        stored: true,
    };

    state.records.append(record).await.map_err(store_error)?;
    METRICS.records_appended.inc();

    Ok((StatusCode::CREATED, Json(response)))
}

/// List a user's stored actions, most recent first
///
/// GET /api/v1/users/:user_id/records
pub async fn get_user_records(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<UserRecordsResponse>> {
    let data = state
        .records
        .recent_actions(&user_id, state.ranking.history_limit)
        .await
        .map_err(store_error)?;

    Ok(Json(UserRecordsResponse {
        status: "success".to_string(),
        count: data.len(),
        data,
    }))
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let breaker = format!("{:?}", state.suggestions.breaker().state()).to_lowercase();

    match state.records.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "healthy".to_string(),
                error: None,
                breaker,
            }),
        ),
        Err(e) => {
            warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unhealthy".to_string(),
                    error: Some(e.to_string()),
                    breaker,
                }),
            )
        }
    }
}

/// GET /metrics
pub async fn metrics() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        METRICS.export_prometheus(),
    )
}
