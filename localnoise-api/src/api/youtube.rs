//! Video-catalog endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::services::youtube::BandVideo;
use crate::AppState;

const DEFAULT_VIDEO_LIMIT: usize = 5;
const MAX_VIDEO_LIMIT: usize = 25;

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    pub limit: Option<usize>,
}

/// GET /api/youtube/search?q=&limit=
pub async fn search_videos(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<Vec<BandVideo>>> {
    let query = params.q.unwrap_or_default();
    let query = query.trim();
    if query.is_empty() {
        return Err(ApiError::BadRequest("Missing search query".to_string()));
    }

    let limit = params
        .limit
        .unwrap_or(DEFAULT_VIDEO_LIMIT)
        .clamp(1, MAX_VIDEO_LIMIT);

    let videos = state.youtube.search_band_videos(query, limit).await?;
    Ok(Json(videos))
}

/// GET /api/youtube/popular/:bandName
pub async fn popular_video(
    State(state): State<AppState>,
    Path(band_name): Path<String>,
) -> ApiResult<Json<BandVideo>> {
    let video = state
        .youtube
        .most_popular_video(&band_name)
        .await?
        .ok_or_else(|| ApiError::NotFound("No videos found for this band".to_string()))?;

    Ok(Json(video))
}
