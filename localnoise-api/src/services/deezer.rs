//! Deezer API client
//!
//! The free preview catalog: no credentials required. Used both for the
//! passthrough search endpoints and as the preview source of the track
//! resolution pipeline. Every track returned carries a playable preview
//! URL; entries without one are dropped at the mapping step.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{decode_json, ProviderError, HTTP_TIMEOUT, USER_AGENT};

const DEEZER_BASE_URL: &str = "https://api.deezer.com";

/// Artist as returned to the frontend
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewArtist {
    pub id: u64,
    pub name: String,
    pub picture: Option<String>,
    pub link: Option<String>,
}

/// Track with a guaranteed non-empty preview URL
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewTrack {
    pub id: u64,
    pub title: String,
    pub artist: String,
    /// Duration in seconds
    pub duration: u64,
    /// 30-second audio clip URL
    pub preview: String,
    pub album_title: Option<String>,
    pub album_cover: Option<String>,
    pub link: Option<String>,
}

/// Deezer search responses wrap results in a `data` array
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct RawArtist {
    id: u64,
    name: String,
    picture_medium: Option<String>,
    link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawTrack {
    id: u64,
    title: String,
    duration: Option<u64>,
    preview: Option<String>,
    artist: Option<RawTrackArtist>,
    album: Option<RawAlbum>,
    link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawTrackArtist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawAlbum {
    title: Option<String>,
    cover_medium: Option<String>,
}

/// Deezer API client
pub struct DeezerClient {
    http: reqwest::Client,
}

impl DeezerClient {
    pub fn new() -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;

        Ok(Self { http })
    }

    /// Search for the single best artist match, or None
    pub async fn search_artist(&self, name: &str) -> Result<Option<PreviewArtist>, ProviderError> {
        let url = format!("{}/search/artist", DEEZER_BASE_URL);

        debug!(query = %name, "Searching Deezer artist");

        let response = self
            .http
            .get(&url)
            .query(&[("q", name), ("limit", "1")])
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;

        let envelope: Envelope<RawArtist> = decode_json(response).await?;

        Ok(envelope.data.into_iter().next().map(|artist| PreviewArtist {
            id: artist.id,
            name: artist.name,
            picture: artist.picture_medium,
            link: artist.link,
        }))
    }

    /// Top tracks for an artist, provider-ranked, preview-bearing only
    pub async fn artist_top_tracks(
        &self,
        artist_id: u64,
        limit: usize,
    ) -> Result<Vec<PreviewTrack>, ProviderError> {
        let url = format!("{}/artist/{}/top", DEEZER_BASE_URL, artist_id);

        let response = self
            .http
            .get(&url)
            .query(&[("limit", limit.to_string())])
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;

        let envelope: Envelope<RawTrack> = decode_json(response).await?;

        Ok(envelope.data.into_iter().filter_map(map_track).collect())
    }

    /// Raw track search; candidates for the resolution pipeline's matching
    pub async fn search_tracks(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<PreviewTrack>, ProviderError> {
        let url = format!("{}/search/track", DEEZER_BASE_URL);

        debug!(query = %query, limit, "Searching Deezer tracks");

        let response = self
            .http
            .get(&url)
            .query(&[("q", query), ("limit", &limit.to_string())])
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;

        let envelope: Envelope<RawTrack> = decode_json(response).await?;

        Ok(envelope.data.into_iter().filter_map(map_track).collect())
    }

    /// Tracks for a band name, precision-first: resolve the artist, then
    /// take that artist's own top tracks. No artist match means no tracks;
    /// a loose track-name search would fabricate results for unknown bands.
    pub async fn search_tracks_for_band(
        &self,
        band_name: &str,
        limit: usize,
    ) -> Result<Vec<PreviewTrack>, ProviderError> {
        match self.search_artist(band_name).await? {
            Some(artist) => {
                let tracks = self.artist_top_tracks(artist.id, limit).await?;
                debug!(artist = %artist.name, count = tracks.len(), "Found Deezer tracks for band");
                Ok(tracks)
            }
            None => {
                debug!(band = %band_name, "No exact Deezer artist match");
                Ok(Vec::new())
            }
        }
    }
}

/// Keep only tracks with a playable preview
fn map_track(raw: RawTrack) -> Option<PreviewTrack> {
    let preview = raw.preview.filter(|p| !p.is_empty())?;

    Some(PreviewTrack {
        id: raw.id,
        title: raw.title,
        artist: raw.artist.map(|a| a.name).unwrap_or_default(),
        duration: raw.duration.unwrap_or(0),
        preview,
        album_title: raw.album.as_ref().and_then(|a| a.title.clone()),
        album_cover: raw.album.as_ref().and_then(|a| a.cover_medium.clone()),
        link: raw.link,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_without_preview_are_dropped() {
        let raw = RawTrack {
            id: 1,
            title: "Kawasaki Backflip".to_string(),
            duration: Some(183),
            preview: None,
            artist: Some(RawTrackArtist {
                name: "Dogleg".to_string(),
            }),
            album: None,
            link: None,
        };
        assert!(map_track(raw).is_none());

        let raw_empty = RawTrack {
            id: 2,
            title: "Fox".to_string(),
            duration: Some(201),
            preview: Some(String::new()),
            artist: None,
            album: None,
            link: None,
        };
        assert!(map_track(raw_empty).is_none());
    }

    #[test]
    fn preview_bearing_track_maps_fully() {
        let raw = RawTrack {
            id: 3,
            title: "Bueno".to_string(),
            duration: Some(150),
            preview: Some("https://cdn.example/preview.mp3".to_string()),
            artist: Some(RawTrackArtist {
                name: "Dogleg".to_string(),
            }),
            album: Some(RawAlbum {
                title: Some("Melee".to_string()),
                cover_medium: Some("https://cdn.example/cover.jpg".to_string()),
            }),
            link: Some("https://www.deezer.com/track/3".to_string()),
        };

        let track = map_track(raw).expect("should map");
        assert_eq!(track.artist, "Dogleg");
        assert_eq!(track.duration, 150);
        assert_eq!(track.album_title.as_deref(), Some("Melee"));
    }

    #[test]
    fn envelope_tolerates_missing_data_field() {
        let envelope: Envelope<RawArtist> = serde_json::from_str("{}").expect("should parse");
        assert!(envelope.data.is_empty());
    }
}
