//! YouTube captions as the transcript-retrieval capability

use crate::capability::{
    response::{CapabilityError, TranscriptSnippet},
    TranscriptSource,
};
use crate::core::config::TranscriptSettings;
use async_trait::async_trait;
use tracing::{debug, instrument, warn};
use yt_transcript_rs::api::YouTubeTranscriptApi;

/// Transcript source reading YouTube caption tracks
pub struct YoutubeTranscripts {
    api: YouTubeTranscriptApi,
    languages: Vec<String>,
    preserve_formatting: bool,
}

impl YoutubeTranscripts {
    pub fn new(settings: &TranscriptSettings) -> Result<Self, CapabilityError> {
        // No cookies, proxy or custom HTTP client
        let api = YouTubeTranscriptApi::new(None, None, None).map_err(|e| {
            CapabilityError::Internal(format!("Failed to create transcript client: {}", e))
        })?;

        Ok(Self {
            api,
            languages: settings.languages.clone(),
            preserve_formatting: settings.preserve_formatting,
        })
    }
}

#[async_trait]
impl TranscriptSource for YoutubeTranscripts {
    #[instrument(skip(self))]
    async fn fetch(&self, video_id: &str) -> Result<Vec<TranscriptSnippet>, CapabilityError> {
        let languages: Vec<&str> = self.languages.iter().map(String::as_str).collect();

        let transcript = self
            .api
            .fetch_transcript(video_id, &languages, self.preserve_formatting)
            .await
            .map_err(|e| {
                warn!("No transcript for {}: {}", video_id, e);
                CapabilityError::NotAvailable(format!("{}: {}", video_id, e))
            })?;

        debug!(
            "Fetched {} snippets ({})",
            transcript.snippets.len(),
            transcript.language_code
        );

        Ok(transcript
            .snippets
            .into_iter()
            .map(|snippet| TranscriptSnippet::new(snippet.text, snippet.start, snippet.duration))
            .collect())
    }
}
