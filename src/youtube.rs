//! Client for the YouTube Data API `videos` endpoint.
//!
//! Only the handful of fields the catalog exposes are deserialized; anything
//! else in the upstream payload is ignored.

use std::io;

use serde::{Deserialize, Serialize};

use crate::config::AppConfig;

const LOOKUP_PARTS: &str = "snippet,contentDetails";

/// A video as returned to clients. Built fresh for every request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedVideo {
    pub video_id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub channel_title: String,
    pub published_at: String,
    pub thumbnail: String,
    pub duration: String,
}

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("video {0} not found")]
    NotFound(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("upstream returned HTTP {0}")]
    Status(u16),
    #[error("decoding upstream response: {0}")]
    Decode(String),
    #[error("upstream response for {video_id} is missing {field}")]
    MissingField {
        video_id: String,
        field: &'static str,
    },
}

/// Resolves one identifier into its enriched record.
pub trait VideoLookup: Send + Sync {
    fn fetch_video(&self, video_id: &str) -> Result<EnrichedVideo, LookupError>;
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    id: String,
    snippet: Snippet,
    content_details: ContentDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    title: String,
    #[serde(default)]
    description: Option<String>,
    channel_title: String,
    published_at: String,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    medium: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ContentDetails {
    duration: String,
}

impl VideoItem {
    fn into_enriched(self) -> Result<EnrichedVideo, LookupError> {
        let thumbnail = self
            .snippet
            .thumbnails
            .medium
            .map(|thumb| thumb.url)
            .ok_or_else(|| LookupError::MissingField {
                video_id: self.id.clone(),
                field: "snippet.thumbnails.medium",
            })?;

        Ok(EnrichedVideo {
            video_id: self.id,
            title: self.snippet.title,
            description: self.snippet.description,
            channel_title: self.snippet.channel_title,
            published_at: self.snippet.published_at,
            thumbnail,
            duration: self.content_details.duration,
        })
    }
}

/// Blocking HTTP client. One `ureq::Agent` is shared by every lookup so
/// connections get pooled; no timeouts beyond the agent defaults.
#[derive(Debug, Clone)]
pub struct YouTubeClient {
    agent: ureq::Agent,
    api_url: String,
    api_key: String,
}

impl YouTubeClient {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().build(),
            api_url: api_url.into(),
            api_key: api_key.into(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.youtube_api_url, &config.youtube_api_key)
    }
}

impl VideoLookup for YouTubeClient {
    fn fetch_video(&self, video_id: &str) -> Result<EnrichedVideo, LookupError> {
        let response = self
            .agent
            .get(&self.api_url)
            .query("part", LOOKUP_PARTS)
            .query("id", video_id)
            .query("key", &self.api_key)
            .call()
            .map_err(|err| match err {
                ureq::Error::Status(code, _) => LookupError::Status(code),
                ureq::Error::Transport(transport) => LookupError::Transport(transport.to_string()),
            })?;

        let body: VideoListResponse = response
            .into_json()
            .map_err(|err: io::Error| LookupError::Decode(err.to_string()))?;

        body.items
            .into_iter()
            .next()
            .ok_or_else(|| LookupError::NotFound(video_id.to_string()))?
            .into_enriched()
    }
}
