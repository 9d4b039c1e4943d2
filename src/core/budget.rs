//! Input budget for prompts carrying transcript text

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tiktoken_rs::CoreBPE;
use tracing::{debug, warn};

/// Encoding used when none is configured
pub const DEFAULT_ENCODING: &str = "cl100k_base";

/// Characters per token when no encoding could be loaded
const CHARS_PER_TOKEN: usize = 4;

/// What to do when input exceeds the budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetPolicy {
    /// Cut the input down to the budget
    #[default]
    Truncate,
    /// Fail the stage
    Reject,
    /// Pass input through unchecked
    Off,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("input of {tokens} tokens exceeds the budget of {limit} tokens")]
pub struct BudgetExceeded {
    pub tokens: usize,
    pub limit: usize,
}

/// Counts tokens with a BPE encoding, approximating when none is loaded
#[derive(Clone)]
pub struct TokenCounter {
    encoding: Option<(String, Arc<CoreBPE>)>,
}

impl TokenCounter {
    /// Load `name` as an encoding, then as a model name, then fall back to
    /// the default encoding
    pub fn new(name: &str) -> Self {
        let loaded = load_encoding(name)
            .map(|bpe| (name.to_string(), bpe))
            .or_else(|| {
                tiktoken_rs::get_bpe_from_model(name)
                    .ok()
                    .map(|bpe| (name.to_string(), bpe))
            })
            .or_else(|| {
                warn!("Unknown token encoding '{}', using {}", name, DEFAULT_ENCODING);
                load_encoding(DEFAULT_ENCODING).map(|bpe| (DEFAULT_ENCODING.to_string(), bpe))
            });

        if loaded.is_none() {
            warn!("No token encoding available, approximating token counts");
        }

        Self {
            encoding: loaded.map(|(name, bpe)| (name, Arc::new(bpe))),
        }
    }

    /// ceil(chars / 4)
    pub fn approximate() -> Self {
        Self { encoding: None }
    }

    /// Name of the loaded encoding; `None` when approximating
    pub fn encoding(&self) -> Option<&str> {
        self.encoding.as_ref().map(|(name, _)| name.as_str())
    }

    pub fn count(&self, text: &str) -> usize {
        match &self.encoding {
            Some((_, bpe)) => bpe.encode_with_special_tokens(text).len(),
            None => text.chars().count().div_ceil(CHARS_PER_TOKEN),
        }
    }

    /// Longest prefix of `text` that fits in `max_tokens`
    fn truncate(&self, text: &str, max_tokens: usize) -> String {
        let Some((_, bpe)) = &self.encoding else {
            let max_chars = max_tokens.saturating_mul(CHARS_PER_TOKEN);
            // Cut on a char boundary
            let end = text
                .char_indices()
                .nth(max_chars)
                .map(|(idx, _)| idx)
                .unwrap_or(text.len());
            return text[..end].to_string();
        };

        let tokens = bpe.encode_with_special_tokens(text);
        let mut end = max_tokens.min(tokens.len());
        // A cut inside a multi-byte character does not decode
        while end > 0 {
            if let Ok(prefix) = bpe.decode(tokens[..end].to_vec()) {
                return prefix;
            }
            end -= 1;
        }
        String::new()
    }
}

impl Default for TokenCounter {
    fn default() -> Self {
        Self::new(DEFAULT_ENCODING)
    }
}

impl fmt::Debug for TokenCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCounter")
            .field("encoding", &self.encoding().unwrap_or("approximate"))
            .finish()
    }
}

fn load_encoding(name: &str) -> Option<CoreBPE> {
    let loaded = match name {
        "cl100k_base" => tiktoken_rs::cl100k_base(),
        "o200k_base" => tiktoken_rs::o200k_base(),
        "p50k_base" => tiktoken_rs::p50k_base(),
        "p50k_edit" => tiktoken_rs::p50k_edit(),
        "r50k_base" | "gpt2" => tiktoken_rs::r50k_base(),
        _ => return None,
    };
    loaded
        .map_err(|e| warn!("Failed to load token encoding {}: {}", name, e))
        .ok()
}

/// Token budget applied before a text-generation call
#[derive(Debug, Clone)]
pub struct InputBudget {
    pub max_tokens: usize,
    pub policy: BudgetPolicy,
    pub counter: TokenCounter,
}

impl InputBudget {
    pub fn new(max_tokens: usize, policy: BudgetPolicy) -> Self {
        Self {
            max_tokens,
            policy,
            counter: TokenCounter::default(),
        }
    }

    pub fn with_counter(mut self, counter: TokenCounter) -> Self {
        self.counter = counter;
        self
    }

    /// Fit `text` into the budget according to the policy
    pub fn fit<'a>(&self, text: &'a str) -> Result<Cow<'a, str>, BudgetExceeded> {
        if self.policy == BudgetPolicy::Off {
            return Ok(Cow::Borrowed(text));
        }

        let tokens = self.counter.count(text);
        debug!("Input of {} tokens, budget {}", tokens, self.max_tokens);
        if tokens <= self.max_tokens {
            return Ok(Cow::Borrowed(text));
        }

        match self.policy {
            BudgetPolicy::Reject => Err(BudgetExceeded {
                tokens,
                limit: self.max_tokens,
            }),
            _ => Ok(Cow::Owned(self.counter.truncate(text, self.max_tokens))),
        }
    }
}

impl Default for InputBudget {
    fn default() -> Self {
        Self::new(6000, BudgetPolicy::Truncate)
    }
}
