//! localnoise-api library - LocalNoise backend service
//!
//! REST API for the band map: band CRUD with marker placement, account
//! auth, and the external catalog surfaces (Spotify, Deezer, YouTube)
//! including hybrid track resolution.

use std::sync::Arc;

use anyhow::Context;
use axum::http::{header, HeaderValue, Method};
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use localnoise_common::Config;

pub mod api;
pub mod db;
pub mod error;
pub mod services;

use services::resolver::{CatalogSource, PreviewSource};
use services::{DeezerClient, SpotifyClient, TrackResolver, YouTubeClient};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Resolved runtime configuration
    pub config: Arc<Config>,
    /// Authoritative catalog client (owns the cached token)
    pub spotify: Arc<SpotifyClient>,
    /// Free preview catalog client
    pub deezer: Arc<DeezerClient>,
    /// Video catalog client
    pub youtube: Arc<YouTubeClient>,
    /// Track resolution pipeline over the two catalog clients
    pub resolver: TrackResolver,
    /// Startup timestamp for health reporting
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    /// Create application state: one instance of each provider client,
    /// shared by every request.
    pub fn new(db: SqlitePool, config: Config) -> anyhow::Result<Self> {
        let spotify = Arc::new(
            SpotifyClient::new(
                config.spotify_client_id.clone(),
                config.spotify_client_secret.clone(),
                config.spotify_market.clone(),
            )
            .context("Failed to build Spotify client")?,
        );
        let deezer =
            Arc::new(DeezerClient::new().context("Failed to build Deezer client")?);
        let youtube = Arc::new(
            YouTubeClient::new(config.youtube_api_key.clone())
                .context("Failed to build YouTube client")?,
        );

        let resolver = TrackResolver::new(
            spotify.clone() as Arc<dyn CatalogSource>,
            deezer.clone() as Arc<dyn PreviewSource>,
        );

        Ok(Self {
            db,
            config: Arc::new(config),
            spotify,
            deezer,
            youtube,
            resolver,
            startup_time: Utc::now(),
        })
    }
}

/// Build application router
///
/// Mutating band routes and the profile endpoint require a bearer token;
/// everything else is public.
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/api/auth/profile", get(api::auth::profile))
        .route("/api/bands", post(api::bands::create_band))
        .route(
            "/api/bands/:id",
            axum::routing::put(api::bands::update_band).delete(api::bands::delete_band),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth_middleware,
        ));

    let public = Router::new()
        .route("/api/auth/register", post(api::auth::register))
        .route("/api/auth/login", post(api::auth::login))
        .route("/api/bands", get(api::bands::list_bands))
        .route("/api/bands/search", get(api::bands::search_bands))
        .route("/api/bands/:id", get(api::bands::get_band))
        .route("/api/spotify/search", get(api::spotify::search_artists))
        .route("/api/spotify/search-by-url", get(api::spotify::search_by_url))
        .route("/api/spotify/artists/:id", get(api::spotify::get_artist))
        .route(
            "/api/spotify/artists/:id/top-tracks",
            get(api::spotify::artist_top_tracks),
        )
        .route("/api/deezer/search/artist", get(api::deezer::search_artist))
        .route("/api/deezer/search/tracks", get(api::deezer::search_tracks))
        .route(
            "/api/deezer/artists/:id/top-tracks",
            get(api::deezer::artist_top_tracks),
        )
        .route("/api/deezer/hybrid/tracks", get(api::deezer::hybrid_tracks))
        .route("/api/youtube/search", get(api::youtube::search_videos))
        .route(
            "/api/youtube/popular/:band_name",
            get(api::youtube::popular_video),
        )
        .merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS restricted to the configured frontend origins
fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}
