//! YouTube results page as the video-search capability

use crate::capability::{response::CapabilityError, VideoSearch};
use async_trait::async_trait;
use regex::Regex;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, instrument};

const RESULTS_URL: &str = "https://www.youtube.com/results";
const WATCH_URL: &str = "https://www.youtube.com/watch?v=";

/// Video search that scrapes the YouTube results page
pub struct YoutubeSearch {
    client: reqwest::Client,
    max_results: usize,
    video_id_regex: Regex,
}

impl YoutubeSearch {
    pub fn new(max_results: usize, timeout: Duration) -> Result<Self, CapabilityError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                CapabilityError::Internal(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            max_results,
            video_id_regex: video_id_regex()?,
        })
    }

    /// Collect distinct video ids from a results page, in page order
    pub fn extract_video_ids(&self, html: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        self.video_id_regex
            .captures_iter(html)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
            .filter(|id| seen.insert(id.clone()))
            .take(self.max_results)
            .collect()
    }
}

fn video_id_regex() -> Result<Regex, CapabilityError> {
    Regex::new(r#"(?:"videoId":"|/watch\?v=)([A-Za-z0-9_-]{11})"#)
        .map_err(|e| CapabilityError::Internal(format!("Invalid video id pattern: {}", e)))
}

/// Render ids as one watch URL per line
pub fn format_listing(ids: &[String]) -> String {
    ids.iter()
        .map(|id| format!("{}{}", WATCH_URL, id))
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl VideoSearch for YoutubeSearch {
    #[instrument(skip(self))]
    async fn search(&self, terms: &[String]) -> Result<String, CapabilityError> {
        let query = terms
            .iter()
            .map(|t| t.trim())
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if query.is_empty() {
            return Err(CapabilityError::NotAvailable("no search terms".to_string()));
        }

        let response = self
            .client
            .get(RESULTS_URL)
            .query(&[("search_query", query.as_str())])
            .send()
            .await
            .map_err(|e| CapabilityError::Api(format!("Search request failed: {}", e)))?
            .error_for_status()
            .map_err(|e| CapabilityError::Api(format!("Search request failed: {}", e)))?;

        let html = response
            .text()
            .await
            .map_err(|e| CapabilityError::Api(format!("Failed to read search results: {}", e)))?;

        let ids = self.extract_video_ids(&html);
        debug!("Search for '{}' found {} videos", query, ids.len());

        Ok(format_listing(&ids))
    }
}
