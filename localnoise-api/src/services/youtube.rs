//! YouTube Data API client
//!
//! Finds music videos for a band. The API key is optional: without one the
//! client returns empty results so the rest of the application keeps
//! working, matching how the map frontend treats videos as a bonus.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{decode_json, ProviderError, HTTP_TIMEOUT, USER_AGENT};

const YOUTUBE_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

/// YouTube's category id for Music
const MUSIC_CATEGORY_ID: &str = "10";

/// A band video as returned to the frontend
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BandVideo {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub channel_title: Option<String>,
    pub published_at: Option<String>,
    pub youtube_url: String,
    pub embed_url: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default = "Vec::new")]
    items: Vec<RawItem>,
}

#[derive(Debug, Deserialize)]
struct RawItem {
    id: RawItemId,
    snippet: Option<RawSnippet>,
}

#[derive(Debug, Deserialize)]
struct RawItemId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawSnippet {
    title: Option<String>,
    description: Option<String>,
    thumbnails: Option<RawThumbnails>,
    #[serde(rename = "channelTitle")]
    channel_title: Option<String>,
    #[serde(rename = "publishedAt")]
    published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawThumbnails {
    medium: Option<RawThumbnail>,
}

#[derive(Debug, Deserialize)]
struct RawThumbnail {
    url: String,
}

/// YouTube Data API client
pub struct YouTubeClient {
    http: reqwest::Client,
    api_key: Option<String>,
}

impl YouTubeClient {
    pub fn new(api_key: Option<String>) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;

        Ok(Self { http, api_key })
    }

    /// Search music videos for a band, ordered by view count
    pub async fn search_band_videos(
        &self,
        band_name: &str,
        max_results: usize,
    ) -> Result<Vec<BandVideo>, ProviderError> {
        let Some(api_key) = &self.api_key else {
            warn!("YouTube API key not configured; returning no videos");
            return Ok(Vec::new());
        };

        let query = format!("{} official music video", band_name);

        debug!(query = %query, "Searching YouTube videos");

        let response = self
            .http
            .get(format!("{}/search", YOUTUBE_BASE_URL))
            .query(&[
                ("part", "snippet"),
                ("q", query.as_str()),
                ("type", "video"),
                ("maxResults", &max_results.to_string()),
                ("videoCategoryId", MUSIC_CATEGORY_ID),
                ("order", "viewCount"),
                ("key", api_key),
            ])
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;

        let search: SearchResponse = decode_json(response).await?;

        Ok(search.items.into_iter().filter_map(map_video).collect())
    }

    /// The single most-viewed video for a band, or None
    pub async fn most_popular_video(
        &self,
        band_name: &str,
    ) -> Result<Option<BandVideo>, ProviderError> {
        let videos = self.search_band_videos(band_name, 1).await?;
        Ok(videos.into_iter().next())
    }
}

fn map_video(item: RawItem) -> Option<BandVideo> {
    let video_id = item.id.video_id?;
    let snippet = item.snippet;

    Some(BandVideo {
        youtube_url: format!("https://www.youtube.com/watch?v={}", video_id),
        embed_url: format!("https://www.youtube.com/embed/{}", video_id),
        title: snippet
            .as_ref()
            .and_then(|s| s.title.clone())
            .unwrap_or_default(),
        description: snippet.as_ref().and_then(|s| s.description.clone()),
        thumbnail: snippet
            .as_ref()
            .and_then(|s| s.thumbnails.as_ref())
            .and_then(|t| t.medium.as_ref())
            .map(|t| t.url.clone()),
        channel_title: snippet.as_ref().and_then(|s| s.channel_title.clone()),
        published_at: snippet.as_ref().and_then(|s| s.published_at.clone()),
        id: video_id,
    })
}
