//! Authoritative-catalog passthrough endpoints
//!
//! Used by the band form: search for an artist (or paste a Spotify URL) to
//! link a band to its catalog record, and preview the catalog's top tracks.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::services::spotify::{CatalogArtist, CatalogTrack};
use crate::AppState;

const DEFAULT_SEARCH_LIMIT: usize = 10;
const MAX_SEARCH_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct SearchByUrlParams {
    pub url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TopTracksParams {
    pub market: Option<String>,
}

/// GET /api/spotify/search?q=&limit=
pub async fn search_artists(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<Vec<CatalogArtist>>> {
    let query = params.q.unwrap_or_default();
    let query = query.trim();
    if query.is_empty() {
        return Err(ApiError::BadRequest("Missing search query".to_string()));
    }

    let limit = params
        .limit
        .unwrap_or(DEFAULT_SEARCH_LIMIT)
        .clamp(1, MAX_SEARCH_LIMIT);

    let artists = state.spotify.search_artists(query, limit).await?;
    Ok(Json(artists))
}

/// GET /api/spotify/search-by-url?url=
///
/// Resolves a pasted artist URL (web or spotify: URI) to the artist record.
pub async fn search_by_url(
    State(state): State<AppState>,
    Query(params): Query<SearchByUrlParams>,
) -> ApiResult<Json<CatalogArtist>> {
    let url = params.url.unwrap_or_default();
    let url = url.trim();
    if url.is_empty() {
        return Err(ApiError::BadRequest("Missing url parameter".to_string()));
    }

    let artist = state
        .spotify
        .get_artist_by_url(url)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Not a Spotify artist URL".to_string()))?;

    Ok(Json(artist))
}

/// GET /api/spotify/artists/:id
pub async fn get_artist(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<CatalogArtist>> {
    let artist = state.spotify.get_artist(&id).await?;
    Ok(Json(artist))
}

/// GET /api/spotify/artists/:id/top-tracks?market=
pub async fn artist_top_tracks(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(params): Query<TopTracksParams>,
) -> ApiResult<Json<Vec<CatalogTrack>>> {
    let tracks = state
        .spotify
        .artist_top_tracks(&id, params.market.as_deref())
        .await?;
    Ok(Json(tracks))
}
