//! Capability request and response types

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

/// Error types for capability calls
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CapabilityError {
    #[error("API error: {0}")]
    Api(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// A shaped response could not be produced
    #[error("Response does not match `{shape}`: {reason}")]
    NonConforming { shape: String, reason: String },

    /// The requested resource does not exist (e.g. a video without captions)
    #[error("Not available: {0}")]
    NotAvailable(String),

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result of a text-generation call
#[derive(Debug, Clone, PartialEq)]
pub enum Generation {
    /// Free text
    Text(String),
    /// A JSON value already validated against the requested shape
    Structured(Value),
}

impl Generation {
    pub fn into_text(self) -> Option<String> {
        match self {
            Generation::Text(text) => Some(text),
            Generation::Structured(_) => None,
        }
    }

    pub fn into_structured(self) -> Option<Value> {
        match self {
            Generation::Structured(value) => Some(value),
            Generation::Text(_) => None,
        }
    }
}

/// Structured-output shape: a named JSON Schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputShape {
    pub name: &'static str,
    schema: Value,
}

impl OutputShape {
    /// `{ "video_id": string }`
    pub fn video_id() -> Self {
        Self::object(
            "ExtractVideoId",
            "video_id",
            json!({
                "type": "string",
                "description": "The id of the video",
            }),
        )
    }

    /// `{ "keyword": [string] }`
    pub fn keywords() -> Self {
        Self::object(
            "Keywords",
            "keyword",
            json!({
                "type": "array",
                "items": { "type": "string" },
                "description": "The most relevant search keywords",
            }),
        )
    }

    /// An object with a single required property
    fn object(name: &'static str, property: &str, property_schema: Value) -> Self {
        Self {
            name,
            schema: json!({
                "title": name,
                "type": "object",
                "properties": { property: property_schema },
                "required": [property],
            }),
        }
    }

    /// JSON Schema of the shape
    pub fn json_schema(&self) -> &Value {
        &self.schema
    }

    /// Instruction appended to prompts for shaped calls
    pub fn instructions(&self) -> String {
        format!(
            "\n\nRespond with a single JSON object matching this JSON Schema and nothing else:\n{}",
            self.schema
        )
    }

    /// Check that `value` conforms to the shape's schema
    pub fn validate(&self, value: &Value) -> Result<(), CapabilityError> {
        let validator = jsonschema::validator_for(&self.schema).map_err(|e| {
            CapabilityError::Internal(format!("invalid `{}` schema: {}", self.name, e))
        })?;

        let errors: Vec<String> = validator
            .iter_errors(value)
            .map(|e| e.to_string())
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(self.non_conforming(errors.join("; ")))
        }
    }

    pub fn non_conforming(&self, reason: impl Into<String>) -> CapabilityError {
        CapabilityError::NonConforming {
            shape: self.name.to_string(),
            reason: reason.into(),
        }
    }
}

/// One timed piece of a transcript
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSnippet {
    pub text: String,
    pub start: f64,
    pub duration: f64,
}

impl TranscriptSnippet {
    pub fn new(text: impl Into<String>, start: f64, duration: f64) -> Self {
        Self {
            text: text.into(),
            start,
            duration,
        }
    }
}
