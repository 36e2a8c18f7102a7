//! Chat-completions client for offer messages

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::Deserialize;
use std::time::Duration;
use ureq::Agent;

use super::{MessageGenerator, MessageRequest};
use crate::error::{HaggleError, Result};

/// Environment variable holding the service API key
pub const API_KEY_ENV: &str = "HAGGLE_LLM_API_KEY";

/// Where and how to reach the message service
#[derive(Clone, Debug, PartialEq)]
pub struct LlmConfig {
    /// Full chat-completions URL
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    /// Transport-level timeout; the session applies its own bound on top
    pub request_timeout: Duration,
}

impl LlmConfig {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: None,
            request_timeout: Duration::from_secs(5),
        }
    }

    /// Pick up the API key from the environment, if set
    pub fn with_env_api_key(mut self) -> Self {
        self.api_key = std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

/// Message generator backed by an OpenAI-compatible endpoint
#[derive(Clone, Debug)]
pub struct HttpMessageGenerator {
    config: LlmConfig,
}

impl HttpMessageGenerator {
    pub fn new(config: LlmConfig) -> Result<Self> {
        if !config.endpoint.starts_with("http://") && !config.endpoint.starts_with("https://") {
            return Err(HaggleError::config(
                "llm.endpoint",
                format!("not an http(s) URL: {}", config.endpoint),
            ));
        }
        if config.model.trim().is_empty() {
            return Err(HaggleError::config("llm.model", "must not be empty"));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &LlmConfig {
        &self.config
    }

    fn build_prompt(request: &MessageRequest<'_>) -> (String, String) {
        let system = format!(
            "You are {}, negotiating as the {}. Style: {}. \
             Reply with one or two sentences proposing the given price. \
             Never mention any other price.",
            request.persona.name,
            request.party,
            request.persona.style
        );

        let mut user = format!("Product: {}\nHistory:\n", request.product);
        for offer in request.history {
            user.push_str(&format!("- round {}: {} offered {}\n", offer.round, offer.proposer, offer.price));
        }
        user.push_str(&format!("Your offer now: {}", request.price));

        (system, user)
    }
}

fn call_chat_completions(config: &LlmConfig, system: &str, user: &str) -> Result<String> {
    let agent_config = Agent::config_builder()
        .timeout_global(Some(config.request_timeout))
        .build();
    let agent: Agent = agent_config.into();

    let body = serde_json::json!({
        "model": config.model,
        "messages": [
            {"role": "system", "content": system},
            {"role": "user", "content": user},
        ],
        "max_tokens": 80,
    });

    let mut request = agent.post(&config.endpoint);
    if let Some(key) = &config.api_key {
        request = request.header("Authorization", format!("Bearer {}", key));
    }

    let response: ChatResponse = request.send_json(&body)?.body_mut().read_json()?;

    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or_else(|| HaggleError::ExternalService("empty completion".to_string()))
}

impl MessageGenerator for HttpMessageGenerator {
    fn generate_message<'a>(&'a self, request: MessageRequest<'a>) -> BoxFuture<'a, Result<String>> {
        let (system, user) = Self::build_prompt(&request);
        let config = self.config.clone();

        async move {
            tokio::task::spawn_blocking(move || call_chat_completions(&config, &system, &user))
                .await
                .map_err(|e| HaggleError::Internal(format!("message task failed: {}", e)))?
        }
        .boxed()
    }
}
