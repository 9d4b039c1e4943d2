//! External capabilities the pipeline calls
//!
//! Each capability is a trait so stages can run against live services or
//! test doubles alike.

pub mod client;
pub mod openai;
pub mod response;
pub mod search;
pub mod transcript;

use async_trait::async_trait;
use std::sync::Arc;

pub use client::LlmClientConfig;
pub use openai::OpenAiGenerator;
pub use response::{CapabilityError, Generation, OutputShape, TranscriptSnippet};
pub use search::YoutubeSearch;
pub use transcript::YoutubeTranscripts;

/// Text generation, free or shaped
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a response to `prompt`
    ///
    /// With a shape, the result is [`Generation::Structured`] and already
    /// validated, or the call fails with [`CapabilityError::NonConforming`].
    async fn generate(
        &self,
        prompt: &str,
        shape: Option<&OutputShape>,
    ) -> Result<Generation, CapabilityError>;
}

/// Transcript retrieval
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Fetch the ordered snippets of a video's transcript
    async fn fetch(&self, video_id: &str) -> Result<Vec<TranscriptSnippet>, CapabilityError>;
}

/// Video search
#[async_trait]
pub trait VideoSearch: Send + Sync {
    /// Human-readable listing of videos matching the terms
    async fn search(&self, terms: &[String]) -> Result<String, CapabilityError>;
}

/// The capabilities a run needs
#[derive(Clone)]
pub struct Capabilities {
    pub generator: Arc<dyn TextGenerator>,
    pub transcripts: Arc<dyn TranscriptSource>,
    pub search: Arc<dyn VideoSearch>,
}

impl Capabilities {
    pub fn new(
        generator: impl TextGenerator + 'static,
        transcripts: impl TranscriptSource + 'static,
        search: impl VideoSearch + 'static,
    ) -> Self {
        Self {
            generator: Arc::new(generator),
            transcripts: Arc::new(transcripts),
            search: Arc::new(search),
        }
    }
}
