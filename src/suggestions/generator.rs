//! Next-action suggestion generators

use crate::config::LlmConfig;
use crate::ranking::ActionRecord;
use crate::records::{format_history, UserPatterns};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Generator trait for different suggestion backends
#[async_trait]
pub trait SuggestionGenerator: Send + Sync {
    /// Produce natural-language suggestions from a raw action history
    async fn suggest(&self, history: &[ActionRecord]) -> Result<String, SuggestionError>;
}

/// Suggestion errors
#[derive(Debug, thiserror::Error)]
pub enum SuggestionError {
    #[error("Initialization error: {0}")]
    InitializationError(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Circuit breaker is open")]
    CircuitOpen,

    #[error("No history to base suggestions on")]
    EmptyHistory,

    #[error("Unknown error")]
    Unknown,
}

/// LLM-backed generator using an OpenAI-compatible API
pub struct LlmSuggestionGenerator {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<SecretString>,
    max_retries: usize,
    temperature: f32,
    max_tokens: usize,
}

impl LlmSuggestionGenerator {
    pub fn new(config: &LlmConfig) -> Result<Self, SuggestionError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| SuggestionError::InitializationError(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            max_retries: config.max_retries.max(1),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    fn build_prompt(&self, history: &[ActionRecord]) -> String {
        format!(
            "Based on the following user history, suggest the next 3 actions the user is \
            most likely to take. For each, give the task, the agent that should handle it, \
            a priority level and a one-sentence reason. Consider time of day, task \
            sequences, agent preferences, completion rates and feedback.\n\n{}",
            format_history(history)
        )
    }
}

#[async_trait]
impl SuggestionGenerator for LlmSuggestionGenerator {
    async fn suggest(&self, history: &[ActionRecord]) -> Result<String, SuggestionError> {
        if history.is_empty() {
            return Err(SuggestionError::EmptyHistory);
        }

        debug!("Requesting suggestions for {} actions", history.len());

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: "You analyze productivity-platform usage and recommend next steps in plain, direct language.".to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: self.build_prompt(history),
                },
            ],
            max_tokens: Some(self.max_tokens),
            temperature: Some(self.temperature),
        };

        let mut last_error = None;
        for attempt in 0..self.max_retries {
            if attempt > 0 {
                debug!("Retry attempt {} for suggestions", attempt);
                tokio::time::sleep(Duration::from_millis(100 * (1 << attempt))).await;
            }

            let mut req = self.client.post(&self.endpoint).json(&request);

            if let Some(ref api_key) = self.api_key {
                req = req.bearer_auth(api_key.expose_secret());
            }

            match req.send().await {
                Ok(response) => {
                    if !response.status().is_success() {
                        let status = response.status();
                        let body = response.text().await.unwrap_or_default();
                        last_error = Some(SuggestionError::ApiError(format!(
                            "HTTP {}: {}",
                            status, body
                        )));
                        continue;
                    }

                    match response.json::<ChatCompletionResponse>().await {
                        Ok(resp) => match resp.choices.into_iter().next() {
                            Some(choice) => return Ok(choice.message.content),
                            None => {
                                last_error = Some(SuggestionError::ApiError(
                                    "No choices in response".to_string(),
                                ));
                            }
                        },
                        Err(e) => {
                            last_error = Some(SuggestionError::ApiError(format!(
                                "Failed to parse response: {}",
                                e
                            )));
                        }
                    }
                }
                Err(e) => {
                    last_error = Some(SuggestionError::NetworkError(e.to_string()));
                }
            }
        }

        warn!("Suggestion request failed after {} attempts", self.max_retries);
        Err(last_error.unwrap_or(SuggestionError::Unknown))
    }
}

/// Offline generator that derives suggestions from usage patterns
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternSuggestionGenerator;

#[async_trait]
impl SuggestionGenerator for PatternSuggestionGenerator {
    async fn suggest(&self, history: &[ActionRecord]) -> Result<String, SuggestionError> {
        let patterns = UserPatterns::from_history(history).ok_or(SuggestionError::EmptyHistory)?;
        let latest = &history[0];

        let unfinished = history
            .iter()
            .find(|r| r.completion_status != crate::ranking::CompletionStatus::Completed);

        let mut lines = Vec::with_capacity(3);
        lines.push(format!(
            "1. Continue with {} using the {} ({} priority). It is the agent you rely on most.",
            latest.task_type, patterns.most_used_agent, patterns.common_priority.as_str()
        ));
        match unfinished {
            Some(action) => lines.push(format!(
                "2. Revisit \"{}\" with the {}. It is still marked {}.",
                action.task_type,
                action.agent_used,
                action.completion_status.as_str()
            )),
            None => lines.push(
                "2. Review this week's completed work. Everything recent is wrapped up.".to_string(),
            ),
        }
        lines.push(format!(
            "3. Share feedback on the {}. Your average rating is {:.1} out of 5.",
            patterns.most_used_agent, patterns.average_feedback
        ));

        Ok(lines.join("\n"))
    }
}

// OpenAI-compatible API types
#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}
