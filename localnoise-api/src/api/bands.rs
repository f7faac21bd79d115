//! Band CRUD handlers
//!
//! Listing and search are public; create, update and delete require a
//! bearer token, and update/delete additionally require ownership. Band
//! creation runs the marker placement check before persisting, so a lookup
//! failure there aborts the request instead of storing an unchecked point.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use localnoise_common::db::BandWithContributor;

use crate::api::auth::AuthUser;
use crate::db;
use crate::db::bands::{BandFilter, NewBand};
use crate::error::{ApiError, ApiResult};
use crate::services::placement;
use crate::AppState;

/// Default and maximum page sizes for the band listing
const DEFAULT_PAGE_SIZE: i64 = 100;
const MAX_PAGE_SIZE: i64 = 500;

/// Search queries shorter than this are rejected
const MIN_SEARCH_LEN: usize = 2;

/// Search results are capped regardless of matches
const MAX_SEARCH_RESULTS: i64 = 50;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub genre: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse {
    pub bands: Vec<BandWithContributor>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBandRequest {
    pub name: String,
    pub city: String,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
    pub genre: Option<String>,
    pub description: Option<String>,
    pub year_formed: Option<i64>,
    pub website: Option<String>,
    pub spotify_url: Option<String>,
    pub spotify_id: Option<String>,
    pub spotify_image_url: Option<String>,
    pub youtube_url: Option<String>,
    pub instagram_url: Option<String>,
    pub twitter_url: Option<String>,
    pub tiktok_url: Option<String>,
}

/// Partial update; absent fields are left unchanged
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBandRequest {
    pub name: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub genre: Option<String>,
    pub description: Option<String>,
    pub year_formed: Option<i64>,
    pub website: Option<String>,
    pub spotify_url: Option<String>,
    pub spotify_id: Option<String>,
    pub spotify_image_url: Option<String>,
    pub youtube_url: Option<String>,
    pub instagram_url: Option<String>,
    pub twitter_url: Option<String>,
    pub tiktok_url: Option<String>,
    pub is_active: Option<bool>,
}

/// GET /api/bands
pub async fn list_bands(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<ListResponse>> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = params.offset.unwrap_or(0).max(0);

    let filter = BandFilter {
        genre: params.genre,
        country: params.country,
        city: params.city,
        limit,
        offset,
    };

    let (bands, total) = db::bands::list_bands(&state.db, &filter).await?;

    Ok(Json(ListResponse {
        bands,
        total,
        limit,
        offset,
    }))
}

/// GET /api/bands/search?q=
pub async fn search_bands(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<Vec<BandWithContributor>>> {
    let query = params.q.unwrap_or_default();
    let query = query.trim();

    if query.len() < MIN_SEARCH_LEN {
        return Err(ApiError::BadRequest(format!(
            "Search query must be at least {} characters",
            MIN_SEARCH_LEN
        )));
    }

    let bands = db::bands::search_bands(&state.db, query, MAX_SEARCH_RESULTS).await?;
    Ok(Json(bands))
}

/// GET /api/bands/:id
pub async fn get_band(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<BandWithContributor>> {
    let id = parse_band_id(&id)?;

    let band = db::bands::get_band(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Band not found".to_string()))?;

    Ok(Json(band))
}

/// POST /api/bands (requires auth)
pub async fn create_band(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(request): Json<CreateBandRequest>,
) -> ApiResult<(StatusCode, Json<BandWithContributor>)> {
    let name = request.name.trim();
    let city = request.city.trim();
    let country = request.country.trim();

    if name.is_empty() || city.is_empty() || country.is_empty() {
        return Err(ApiError::BadRequest(
            "Name, city and country are required".to_string(),
        ));
    }

    // Placement validates the coordinates, then nudges the point away from
    // existing markers in the same city. A storage failure propagates and
    // aborts creation.
    let (latitude, longitude) =
        placement::place_band(&state.db, city, request.latitude, request.longitude).await?;

    let band = NewBand {
        id: Uuid::new_v4(),
        name: name.to_string(),
        city: city.to_string(),
        country: country.to_string(),
        latitude,
        longitude,
        genre: request.genre,
        description: request.description,
        year_formed: request.year_formed,
        website: request.website,
        spotify_url: request.spotify_url,
        is_verified: request.spotify_id.is_some(),
        spotify_id: request.spotify_id,
        spotify_image_url: request.spotify_image_url,
        youtube_url: request.youtube_url,
        instagram_url: request.instagram_url,
        twitter_url: request.twitter_url,
        tiktok_url: request.tiktok_url,
        added_by: user_id,
    };

    db::bands::insert_band(&state.db, &band).await?;

    info!(band = %band.name, city = %band.city, "Created band");

    let created = db::bands::get_band(&state.db, band.id)
        .await?
        .ok_or_else(|| ApiError::Internal("Band vanished after insert".to_string()))?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /api/bands/:id (requires auth + ownership)
pub async fn update_band(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(id): Path<String>,
    Json(request): Json<UpdateBandRequest>,
) -> ApiResult<Json<BandWithContributor>> {
    let id = parse_band_id(&id)?;

    let existing = db::bands::get_band(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Band not found".to_string()))?;

    if existing.band.added_by != user_id {
        return Err(ApiError::Forbidden(
            "Only the user who added a band can edit it".to_string(),
        ));
    }

    let mut band = existing.band;

    // Coordinates change together or not at all; edits keep the submitted
    // point as-is (placement only runs at creation)
    match (request.latitude, request.longitude) {
        (Some(lat), Some(lon)) => {
            placement::validate_coordinates(lat, lon)?;
            band.latitude = lat;
            band.longitude = lon;
        }
        (None, None) => {}
        _ => {
            return Err(ApiError::BadRequest(
                "Latitude and longitude must be updated together".to_string(),
            ))
        }
    }

    if let Some(name) = request.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(ApiError::BadRequest("Name cannot be empty".to_string()));
        }
        band.name = name;
    }
    if let Some(city) = request.city {
        band.city = city.trim().to_string();
    }
    if let Some(country) = request.country {
        band.country = country.trim().to_string();
    }
    if let Some(genre) = request.genre {
        band.genre = Some(genre);
    }
    if let Some(description) = request.description {
        band.description = Some(description);
    }
    if let Some(year_formed) = request.year_formed {
        band.year_formed = Some(year_formed);
    }
    if let Some(website) = request.website {
        band.website = Some(website);
    }
    if let Some(spotify_url) = request.spotify_url {
        band.spotify_url = Some(spotify_url);
    }
    if let Some(spotify_id) = request.spotify_id {
        band.spotify_id = Some(spotify_id);
        band.is_verified = true;
    }
    if let Some(spotify_image_url) = request.spotify_image_url {
        band.spotify_image_url = Some(spotify_image_url);
    }
    if let Some(youtube_url) = request.youtube_url {
        band.youtube_url = Some(youtube_url);
    }
    if let Some(instagram_url) = request.instagram_url {
        band.instagram_url = Some(instagram_url);
    }
    if let Some(twitter_url) = request.twitter_url {
        band.twitter_url = Some(twitter_url);
    }
    if let Some(tiktok_url) = request.tiktok_url {
        band.tiktok_url = Some(tiktok_url);
    }
    if let Some(is_active) = request.is_active {
        band.is_active = is_active;
    }

    db::bands::update_band(&state.db, &band).await?;

    let updated = db::bands::get_band(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::Internal("Band vanished after update".to_string()))?;

    Ok(Json(updated))
}

/// DELETE /api/bands/:id (requires auth + ownership)
pub async fn delete_band(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<serde_json::Value>> {
    let id = parse_band_id(&id)?;

    let existing = db::bands::get_band(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Band not found".to_string()))?;

    if existing.band.added_by != user_id {
        return Err(ApiError::Forbidden(
            "Only the user who added a band can delete it".to_string(),
        ));
    }

    db::bands::delete_band(&state.db, id).await?;

    info!(band = %existing.band.name, "Deleted band");

    Ok(Json(json!({ "message": "Band deleted" })))
}

fn parse_band_id(id: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(id).map_err(|_| ApiError::BadRequest("Invalid band id".to_string()))
}
