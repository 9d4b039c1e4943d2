//! Text-generation client configuration

use crate::core::config::{ExecutionSettings, LlmSettings};

/// Configuration for the text-generation client
#[derive(Debug, Clone)]
pub struct LlmClientConfig {
    /// Chat model name
    pub model: String,

    /// OpenAI-compatible endpoint. Defaults to the OpenAI API when unset.
    pub api_base: Option<String>,

    /// API key. Read from `OPENAI_API_KEY` when unset.
    pub api_key: Option<String>,

    pub temperature: f32,

    /// Timeout for a single HTTP request in seconds
    pub timeout_secs: u64,

    /// Upper bound on time spent retrying rate-limited requests
    pub max_retry_elapsed_secs: u64,
}

impl Default for LlmClientConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            api_base: None,
            api_key: None,
            temperature: 0.8,
            timeout_secs: 120,
            max_retry_elapsed_secs: 60,
        }
    }
}

impl LlmClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the `llm` and `execution` settings sections
    pub fn from_settings(llm: &LlmSettings, execution: &ExecutionSettings) -> Self {
        Self {
            model: llm.model.clone(),
            api_base: llm.api_base.clone(),
            api_key: None,
            temperature: llm.temperature,
            timeout_secs: execution.call_timeout_secs,
            max_retry_elapsed_secs: llm.max_retry_elapsed_secs,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = Some(api_base.into());
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}
