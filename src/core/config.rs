//! Settings loaded from YAML and the environment

use crate::core::budget::{BudgetPolicy, InputBudget, TokenCounter, DEFAULT_ENCODING};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding `budget.max_input_tokens`
pub const TOKEN_LIMIT_ENV: &str = "LLM_TOKEN_LIMIT";

/// Environment variable overriding `budget.encoding`
pub const TOKEN_ENCODING_ENV: &str = "TOKEN_ENCODING";

/// Environment variable overriding `log_level`
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

/// Top-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub llm: LlmSettings,
    pub execution: ExecutionSettings,
    pub budget: BudgetSettings,
    pub transcript: TranscriptSettings,
    pub search: SearchSettings,
    pub prompts: PromptOverrides,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            llm: LlmSettings::default(),
            execution: ExecutionSettings::default(),
            budget: BudgetSettings::default(),
            transcript: TranscriptSettings::default(),
            search: SearchSettings::default(),
            prompts: PromptOverrides::default(),
            log_level: "info".to_string(),
        }
    }
}

/// Text-generation provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Chat model name
    pub model: String,

    /// OpenAI-compatible endpoint; the provider default when unset
    pub api_base: Option<String>,

    pub temperature: f32,

    /// Upper bound on time spent retrying rate-limited calls
    pub max_retry_elapsed_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            api_base: None,
            temperature: 0.8,
            max_retry_elapsed_secs: 60,
        }
    }
}

/// How stages are scheduled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategySetting {
    Sequential,
    #[default]
    Parallel,
    Limited,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionSettings {
    pub strategy: StrategySetting,

    /// Concurrency cap for the `limited` strategy
    pub max_concurrency: usize,

    /// Timeout applied to every external call
    pub call_timeout_secs: u64,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self {
            strategy: StrategySetting::Parallel,
            max_concurrency: 4,
            call_timeout_secs: 120,
        }
    }
}

impl ExecutionSettings {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetSettings {
    pub max_input_tokens: usize,
    pub policy: BudgetPolicy,

    /// BPE encoding (or model name) tokens are counted in
    pub encoding: String,
}

impl Default for BudgetSettings {
    fn default() -> Self {
        Self {
            max_input_tokens: 6000,
            policy: BudgetPolicy::Truncate,
            encoding: DEFAULT_ENCODING.to_string(),
        }
    }
}

impl BudgetSettings {
    pub fn to_budget(&self) -> InputBudget {
        InputBudget {
            max_tokens: self.max_input_tokens,
            policy: self.policy,
            counter: TokenCounter::new(&self.encoding),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptSettings {
    /// Preferred transcript languages, most preferred first
    pub languages: Vec<String>,
    pub preserve_formatting: bool,
}

impl Default for TranscriptSettings {
    fn default() -> Self {
        Self {
            languages: vec!["en".to_string()],
            preserve_formatting: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub max_results: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self { max_results: 5 }
    }
}

/// Replacement prompt templates; `{{ name }}` placeholders are substituted
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptOverrides {
    pub extract_video_id: Option<String>,
    pub summarize: Option<String>,
    pub questions: Option<String>,
    pub next_steps: Option<String>,
    pub keyword: Option<String>,
}

impl Settings {
    /// Default settings file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("video-digest").join("config.yaml"))
    }

    /// Load settings from an explicit file, the default file, or defaults
    ///
    /// Environment overrides are applied on top and the result is validated.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        Self::load_with(explicit, |key| std::env::var(key).ok())
    }

    /// [`Settings::load`] with a custom environment lookup
    pub fn load_with<F>(explicit: Option<&Path>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match Self::default_path().filter(|path| path.exists()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };

        settings.apply_env(lookup)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Invalid settings file {}", path.display()))
    }

    /// Parse settings from a YAML string; validation happens in [`Settings::load`]
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Apply overrides from environment-style lookups
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(limit) = lookup(TOKEN_LIMIT_ENV) {
            self.budget.max_input_tokens = limit.trim().parse().with_context(|| {
                format!("{} must be a positive integer, got '{}'", TOKEN_LIMIT_ENV, limit)
            })?;
        }

        if let Some(encoding) = lookup(TOKEN_ENCODING_ENV) {
            self.budget.encoding = encoding.trim().to_string();
        }

        if let Some(level) = lookup(LOG_LEVEL_ENV) {
            self.log_level = level.trim().to_lowercase();
        }

        Ok(())
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<()> {
        if self.execution.call_timeout_secs == 0 {
            anyhow::bail!("execution.call_timeout_secs must be greater than zero");
        }

        if self.execution.max_concurrency == 0 {
            anyhow::bail!("execution.max_concurrency must be greater than zero");
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            anyhow::bail!(
                "llm.temperature must be between 0 and 2, got {}",
                self.llm.temperature
            );
        }

        if self.llm.model.trim().is_empty() {
            anyhow::bail!("llm.model must not be empty");
        }

        if self.budget.max_input_tokens == 0 && self.budget.policy != BudgetPolicy::Off {
            anyhow::bail!("budget.max_input_tokens must be greater than zero");
        }

        if self.budget.encoding.trim().is_empty() {
            anyhow::bail!("budget.encoding must not be empty");
        }

        if self.search.max_results == 0 {
            anyhow::bail!("search.max_results must be greater than zero");
        }

        if self.transcript.languages.is_empty() {
            anyhow::bail!("transcript.languages must list at least one language");
        }

        const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
        if !LEVELS.contains(&self.log_level.as_str()) {
            anyhow::bail!("Unknown log level: {}", self.log_level);
        }

        Ok(())
    }
}
