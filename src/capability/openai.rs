//! OpenAI-compatible chat completions as the text-generation capability

use crate::capability::{
    client::LlmClientConfig,
    response::{CapabilityError, Generation, OutputShape},
    TextGenerator,
};
use async_openai::{
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs, ResponseFormat,
    },
    Client,
};
use async_trait::async_trait;
use backoff::ExponentialBackoff;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Text generator backed by a chat-completions endpoint
pub struct OpenAiGenerator {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
    timeout_secs: u64,
}

impl OpenAiGenerator {
    /// Create a generator
    ///
    /// Rate-limited requests are retried with exponential backoff, bounded
    /// by `max_retry_elapsed_secs`.
    pub fn new(config: LlmClientConfig) -> Result<Self, CapabilityError> {
        let mut openai_config = OpenAIConfig::new();
        if let Some(api_base) = &config.api_base {
            openai_config = openai_config.with_api_base(api_base);
        }
        if let Some(api_key) = &config.api_key {
            openai_config = openai_config.with_api_key(api_key);
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                CapabilityError::Internal(format!("Failed to create HTTP client: {}", e))
            })?;

        let backoff = ExponentialBackoff {
            initial_interval: Duration::from_secs(1),
            max_interval: Duration::from_secs(30),
            multiplier: 2.0,
            max_elapsed_time: Some(Duration::from_secs(config.max_retry_elapsed_secs)),
            ..Default::default()
        };

        let client = Client::with_config(openai_config)
            .with_http_client(http_client)
            .with_backoff(backoff);

        Ok(Self {
            client,
            model: config.model,
            temperature: config.temperature,
            timeout_secs: config.timeout_secs,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    #[instrument(skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
    async fn generate(
        &self,
        prompt: &str,
        shape: Option<&OutputShape>,
    ) -> Result<Generation, CapabilityError> {
        let content = match shape {
            Some(shape) => format!("{}{}", prompt, shape.instructions()),
            None => prompt.to_string(),
        };

        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestUserMessageArgs::default()
                .content(content)
                .build()
                .map_err(|e| CapabilityError::Internal(e.to_string()))?
                .into(),
        ];

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder
            .model(&self.model)
            .messages(messages)
            .temperature(self.temperature);
        if shape.is_some() {
            builder.response_format(ResponseFormat::JsonObject);
        }
        let request = builder
            .build()
            .map_err(|e| CapabilityError::Internal(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| classify_error(e, self.timeout_secs))?;

        let text = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .unwrap_or_default();

        debug!("Model returned {} bytes", text.len());

        match shape {
            None => Ok(Generation::Text(text)),
            Some(shape) => {
                let value = parse_structured(&text, shape)?;
                Ok(Generation::Structured(value))
            }
        }
    }
}

/// Parse and validate a shaped response
///
/// Some OpenAI-compatible providers wrap JSON in a Markdown code fence even
/// in JSON mode; the fence is stripped before parsing.
pub fn parse_structured(text: &str, shape: &OutputShape) -> Result<Value, CapabilityError> {
    let body = strip_code_fence(text);
    if body.is_empty() {
        return Err(shape.non_conforming("empty response"));
    }

    let value: Value = serde_json::from_str(body)
        .map_err(|e| shape.non_conforming(format!("invalid JSON: {}", e)))?;
    shape.validate(&value)?;
    Ok(value)
}

fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the language tag on the opening line
    let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

fn classify_error(err: OpenAIError, timeout_secs: u64) -> CapabilityError {
    match err {
        OpenAIError::ApiError(api) => {
            let message = api.to_string();
            let lowered = message.to_lowercase();
            if lowered.contains("rate limit") || lowered.contains("rate_limit") {
                warn!("Rate limit persisted past retry budget: {}", message);
                CapabilityError::RateLimited(message)
            } else {
                CapabilityError::Api(message)
            }
        }
        OpenAIError::Reqwest(e) if e.is_timeout() => {
            CapabilityError::Timeout(timeout_secs.saturating_mul(1000))
        }
        other => CapabilityError::Api(other.to_string()),
    }
}
