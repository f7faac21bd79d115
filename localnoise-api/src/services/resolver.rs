//! Track resolution pipeline
//!
//! Produces up to `limit` playable preview tracks for a band. Two paths:
//!
//! - **Hybrid**: when the band is linked to a catalog artist id, take the
//!   authoritative catalog's ranked top tracks and attach a preview to
//!   each by searching the preview provider with "<artist> <title>" and
//!   loose-matching the candidates. Keeps the catalog's ranking and
//!   popularity scores.
//! - **Direct**: otherwise (or when the hybrid path fails or comes back
//!   empty), resolve the band name to the preview provider's best artist
//!   match and take that artist's own top tracks. No artist match means no
//!   tracks; a loose track-name search would happily invent results for a
//!   garage band that shares a word with a chart hit.
//!
//! Provider failures are absorbed: a failed sub-lookup shrinks the result,
//! a failed path falls through to the next one, and an empty list is a
//! valid outcome, not an error.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::deezer::{DeezerClient, PreviewArtist, PreviewTrack};
use super::matching::loosely_equal;
use super::spotify::{CatalogTrack, SpotifyClient};
use super::ProviderError;

/// Default number of tracks a resolution returns
pub const DEFAULT_TRACK_LIMIT: usize = 5;

/// Candidates requested from the preview provider per ranked track
const PREVIEW_CANDIDATES: usize = 10;

/// Ranked top-track listing capability of the authoritative catalog
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn ranked_top_tracks(
        &self,
        artist_id: &str,
        limit: usize,
    ) -> Result<Vec<CatalogTrack>, ProviderError>;
}

/// Preview-audio capability of the free catalog
#[async_trait]
pub trait PreviewSource: Send + Sync {
    async fn best_artist(&self, name: &str) -> Result<Option<PreviewArtist>, ProviderError>;

    async fn artist_top_tracks(
        &self,
        artist_id: u64,
        limit: usize,
    ) -> Result<Vec<PreviewTrack>, ProviderError>;

    async fn search_tracks(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<PreviewTrack>, ProviderError>;
}

#[async_trait]
impl CatalogSource for SpotifyClient {
    async fn ranked_top_tracks(
        &self,
        artist_id: &str,
        limit: usize,
    ) -> Result<Vec<CatalogTrack>, ProviderError> {
        let mut tracks = self.artist_top_tracks(artist_id, None).await?;
        tracks.truncate(limit);
        Ok(tracks)
    }
}

#[async_trait]
impl PreviewSource for DeezerClient {
    async fn best_artist(&self, name: &str) -> Result<Option<PreviewArtist>, ProviderError> {
        self.search_artist(name).await
    }

    async fn artist_top_tracks(
        &self,
        artist_id: u64,
        limit: usize,
    ) -> Result<Vec<PreviewTrack>, ProviderError> {
        DeezerClient::artist_top_tracks(self, artist_id, limit).await
    }

    async fn search_tracks(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<PreviewTrack>, ProviderError> {
        DeezerClient::search_tracks(self, query, limit).await
    }
}

/// A playable track produced by resolution; never persisted
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedTrack {
    pub id: String,
    pub title: String,
    pub artist_name: String,
    pub duration_seconds: u64,
    /// Always present: tracks without a preview are filtered out
    pub preview_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub album_art: Option<String>,
    /// Link to the authoritative catalog page, when the hybrid path ran
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_catalog_url: Option<String>,
    /// Ranking hint carried over from the authoritative catalog
    #[serde(skip_serializing_if = "Option::is_none")]
    pub popularity: Option<u32>,
}

/// Which path satisfied the request; call metadata, not track data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    Hybrid,
    DeezerDirect,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Hybrid => "hybrid",
            Strategy::DeezerDirect => "deezer-direct",
        }
    }
}

/// Resolution outcome: the tracks plus the strategy that produced them
#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
    pub tracks: Vec<ResolvedTrack>,
    pub strategy: Strategy,
}

/// Track resolution pipeline over injected catalog capabilities
#[derive(Clone)]
pub struct TrackResolver {
    catalog: Arc<dyn CatalogSource>,
    previews: Arc<dyn PreviewSource>,
}

impl TrackResolver {
    pub fn new(catalog: Arc<dyn CatalogSource>, previews: Arc<dyn PreviewSource>) -> Self {
        Self { catalog, previews }
    }

    /// Resolve up to `limit` preview tracks for a band
    pub async fn resolve(
        &self,
        band_name: &str,
        catalog_artist_id: Option<&str>,
        limit: usize,
    ) -> Resolution {
        if let Some(artist_id) = catalog_artist_id {
            match self.resolve_hybrid(band_name, artist_id, limit).await {
                Ok(tracks) if !tracks.is_empty() => {
                    info!(
                        band = %band_name,
                        count = tracks.len(),
                        strategy = Strategy::Hybrid.as_str(),
                        "Resolved tracks"
                    );
                    return Resolution {
                        tracks,
                        strategy: Strategy::Hybrid,
                    };
                }
                Ok(_) => {
                    debug!(band = %band_name, "Hybrid path yielded no tracks; falling back")
                }
                Err(e) => {
                    warn!(band = %band_name, error = %e, "Hybrid path failed; falling back")
                }
            }
        }

        let tracks = self.resolve_direct(band_name, limit).await;
        info!(
            band = %band_name,
            count = tracks.len(),
            strategy = Strategy::DeezerDirect.as_str(),
            "Resolved tracks"
        );
        Resolution {
            tracks,
            strategy: Strategy::DeezerDirect,
        }
    }

    /// Hybrid path: authoritative ranking fused with preview lookups
    async fn resolve_hybrid(
        &self,
        band_name: &str,
        artist_id: &str,
        limit: usize,
    ) -> Result<Vec<ResolvedTrack>, ProviderError> {
        let ranked = self.catalog.ranked_top_tracks(artist_id, limit).await?;
        if ranked.is_empty() {
            return Ok(Vec::new());
        }

        // Per-track preview lookups fan out concurrently; join_all keeps
        // the ranked order regardless of completion order
        let lookups = ranked
            .iter()
            .map(|track| self.find_preview(band_name, track));
        let matched = join_all(lookups).await;

        Ok(matched.into_iter().flatten().collect())
    }

    /// Find a preview-bearing candidate matching one ranked track
    async fn find_preview(
        &self,
        band_name: &str,
        track: &CatalogTrack,
    ) -> Option<ResolvedTrack> {
        let query = format!("{} {}", band_name, track.name);

        let candidates = match self.previews.search_tracks(&query, PREVIEW_CANDIDATES).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(track = %track.name, error = %e, "Preview search failed; dropping track");
                return None;
            }
        };

        candidates
            .into_iter()
            .find(|candidate| {
                !candidate.preview.is_empty()
                    && loosely_equal(&candidate.artist, band_name)
                    && loosely_equal(&candidate.title, &track.name)
            })
            .map(|candidate| ResolvedTrack {
                id: candidate.id.to_string(),
                title: candidate.title,
                artist_name: candidate.artist,
                duration_seconds: candidate.duration,
                preview_url: candidate.preview,
                album_art: candidate.album_cover,
                source_catalog_url: track.spotify_url.clone(),
                popularity: track.popularity,
            })
    }

    /// Direct path: preview provider's own artist match and ranking
    pub(crate) async fn resolve_direct(&self, band_name: &str, limit: usize) -> Vec<ResolvedTrack> {
        let artist = match self.previews.best_artist(band_name).await {
            Ok(Some(artist)) => artist,
            Ok(None) => {
                debug!(band = %band_name, "No preview-provider artist match");
                return Vec::new();
            }
            Err(e) => {
                warn!(band = %band_name, error = %e, "Preview artist search failed");
                return Vec::new();
            }
        };

        match self.previews.artist_top_tracks(artist.id, limit).await {
            Ok(tracks) => tracks
                .into_iter()
                .filter(|track| !track.preview.is_empty())
                .map(|track| ResolvedTrack {
                    id: track.id.to_string(),
                    title: track.title,
                    artist_name: track.artist,
                    duration_seconds: track.duration,
                    preview_url: track.preview,
                    album_art: track.album_cover,
                    source_catalog_url: None,
                    popularity: None,
                })
                .collect(),
            Err(e) => {
                warn!(band = %band_name, error = %e, "Preview top-track fetch failed");
                Vec::new()
            }
        }
    }
}
