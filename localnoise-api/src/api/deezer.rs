//! Preview-catalog endpoints, including hybrid track resolution
//!
//! The hybrid endpoint is what band popups call: given the band name and
//! its optional catalog artist id, it returns playable preview tracks and
//! reports which path produced them.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult};
use crate::services::deezer::{PreviewArtist, PreviewTrack};
use crate::services::resolver::{ResolvedTrack, Strategy, DEFAULT_TRACK_LIMIT};
use crate::AppState;

const MAX_TRACK_LIMIT: usize = 25;

#[derive(Debug, Deserialize)]
pub struct ArtistSearchParams {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TrackSearchParams {
    pub q: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct TopTracksParams {
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HybridParams {
    pub name: Option<String>,
    pub spotify_id: Option<String>,
    pub limit: Option<usize>,
}

/// Hybrid resolution response; `source` is call metadata, not track data
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HybridResponse {
    pub tracks: Vec<ResolvedTrack>,
    pub source: Strategy,
}

/// GET /api/deezer/search/artist?q=
pub async fn search_artist(
    State(state): State<AppState>,
    Query(params): Query<ArtistSearchParams>,
) -> ApiResult<Json<PreviewArtist>> {
    let query = require_query(params.q)?;

    let artist = state
        .deezer
        .search_artist(&query)
        .await?
        .ok_or_else(|| ApiError::NotFound("No matching artist found".to_string()))?;

    Ok(Json(artist))
}

/// GET /api/deezer/search/tracks?q=&limit=
///
/// Precision-first: the band name is resolved to an artist before any
/// tracks are returned, so unknown bands yield an empty list rather than
/// whatever a loose track search happens to hit.
pub async fn search_tracks(
    State(state): State<AppState>,
    Query(params): Query<TrackSearchParams>,
) -> ApiResult<Json<Vec<PreviewTrack>>> {
    let query = require_query(params.q)?;
    let limit = clamp_limit(params.limit);

    let tracks = state.deezer.search_tracks_for_band(&query, limit).await?;
    Ok(Json(tracks))
}

/// GET /api/deezer/artists/:id/top-tracks?limit=
pub async fn artist_top_tracks(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Query(params): Query<TopTracksParams>,
) -> ApiResult<Json<Vec<PreviewTrack>>> {
    let limit = clamp_limit(params.limit);

    let tracks = state.deezer.artist_top_tracks(id, limit).await?;
    Ok(Json(tracks))
}

/// GET /api/deezer/hybrid/tracks?name=&spotifyId=&limit=
///
/// Never errors on provider failure: exhausted strategies produce an empty
/// track list, which the frontend shows as "no previews available".
pub async fn hybrid_tracks(
    State(state): State<AppState>,
    Query(params): Query<HybridParams>,
) -> ApiResult<Json<HybridResponse>> {
    let name = require_query(params.name)?;
    let limit = clamp_limit(params.limit);

    let resolution = state
        .resolver
        .resolve(&name, params.spotify_id.as_deref(), limit)
        .await;

    Ok(Json(HybridResponse {
        tracks: resolution.tracks,
        source: resolution.strategy,
    }))
}

fn require_query(value: Option<String>) -> ApiResult<String> {
    let value = value.unwrap_or_default();
    let value = value.trim();
    if value.is_empty() {
        return Err(ApiError::BadRequest("Missing search query".to_string()));
    }
    Ok(value.to_string())
}

fn clamp_limit(limit: Option<usize>) -> usize {
    limit.unwrap_or(DEFAULT_TRACK_LIMIT).clamp(1, MAX_TRACK_LIMIT)
}
