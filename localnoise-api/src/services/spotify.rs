//! Spotify API client
//!
//! The authoritative catalog: ranked top-track listings, artist metadata,
//! and popularity scores. Uses the client-credentials flow; the exchanged
//! bearer token is cached on the client and refreshed lazily once its
//! safety-margined lifetime runs out. The one client instance is shared
//! process-wide through `AppState`, so all requests reuse the same token.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::{decode_json, ProviderError, HTTP_TIMEOUT, USER_AGENT};

const SPOTIFY_API_BASE_URL: &str = "https://api.spotify.com/v1";
const SPOTIFY_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// Refresh this many seconds before the declared expiry, so a token never
/// lapses mid-request
const TOKEN_SAFETY_MARGIN_SECS: u64 = 300;

/// Artist URL forms users paste in: web URLs (with optional /intl-xx/
/// segment and query params) and spotify: URIs
static ARTIST_URL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)spotify\.com/(?:intl-[a-z]{2}/)?artist/([a-zA-Z0-9]+)").unwrap()
});
static ARTIST_URI_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"spotify:artist:([a-zA-Z0-9]+)").unwrap());

/// Extract a Spotify artist id from a pasted URL or URI
pub fn extract_artist_id(url: &str) -> Option<String> {
    ARTIST_URL_PATTERN
        .captures(url)
        .or_else(|| ARTIST_URI_PATTERN.captures(url))
        .map(|caps| caps[1].to_string())
}

/// Artist metadata as returned to the frontend
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogArtist {
    pub id: String,
    pub name: String,
    pub genres: Vec<String>,
    pub popularity: Option<u32>,
    pub followers: Option<u64>,
    pub image_url: Option<String>,
    pub spotify_url: Option<String>,
}

/// Ranked top track; preview_url is usually null (Spotify withdrew most
/// previews), which is why resolution pairs these with Deezer
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogTrack {
    pub id: String,
    pub name: String,
    pub preview_url: Option<String>,
    pub album_name: Option<String>,
    pub album_image: Option<String>,
    pub duration_ms: u64,
    pub spotify_url: Option<String>,
    pub popularity: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    artists: ArtistPage,
}

#[derive(Debug, Deserialize)]
struct ArtistPage {
    #[serde(default = "Vec::new")]
    items: Vec<RawArtist>,
}

#[derive(Debug, Deserialize)]
struct RawArtist {
    id: String,
    name: String,
    #[serde(default = "Vec::new")]
    genres: Vec<String>,
    popularity: Option<u32>,
    followers: Option<RawFollowers>,
    #[serde(default = "Vec::new")]
    images: Vec<RawImage>,
    external_urls: Option<RawExternalUrls>,
}

#[derive(Debug, Deserialize)]
struct RawFollowers {
    total: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct RawImage {
    url: String,
}

#[derive(Debug, Deserialize)]
struct RawExternalUrls {
    spotify: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TopTracksResponse {
    #[serde(default = "Vec::new")]
    tracks: Vec<RawTrack>,
}

#[derive(Debug, Deserialize)]
struct RawTrack {
    id: String,
    name: String,
    preview_url: Option<String>,
    album: Option<RawAlbum>,
    duration_ms: Option<u64>,
    external_urls: Option<RawExternalUrls>,
    popularity: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawAlbum {
    name: Option<String>,
    #[serde(default = "Vec::new")]
    images: Vec<RawImage>,
}

/// Cached bearer token with its refresh deadline
#[derive(Debug, Clone)]
struct CachedToken {
    token: String,
    expires_at: Instant,
}

impl CachedToken {
    /// Deadline = now + declared lifetime - safety margin
    fn fresh(token: String, expires_in_secs: u64, now: Instant) -> Self {
        let usable = expires_in_secs.saturating_sub(TOKEN_SAFETY_MARGIN_SECS);
        Self {
            token,
            expires_at: now + Duration::from_secs(usable),
        }
    }

    fn is_valid(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Spotify API client with cached client-credentials token
pub struct SpotifyClient {
    http: reqwest::Client,
    client_id: Option<String>,
    client_secret: Option<String>,
    market: String,
    token: Mutex<Option<CachedToken>>,
}

impl SpotifyClient {
    pub fn new(
        client_id: Option<String>,
        client_secret: Option<String>,
        market: String,
    ) -> Result<Self, ProviderError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;

        Ok(Self {
            http,
            client_id,
            client_secret,
            market,
            token: Mutex::new(None),
        })
    }

    /// Market used for top-track lookups when the caller gives none
    pub fn default_market(&self) -> &str {
        &self.market
    }

    /// Return the cached token, exchanging credentials when absent or past
    /// its deadline. The lock is held across the exchange, so concurrent
    /// callers refresh once and share the result.
    async fn access_token(&self) -> Result<String, ProviderError> {
        let mut cached = self.token.lock().await;

        if let Some(token) = cached.as_ref() {
            if token.is_valid(Instant::now()) {
                return Ok(token.token.clone());
            }
        }

        let fresh = self.exchange_credentials().await?;
        let token = fresh.token.clone();
        *cached = Some(fresh);
        Ok(token)
    }

    /// Drop the cached token; the next call performs a fresh exchange
    pub async fn invalidate_token(&self) {
        *self.token.lock().await = None;
    }

    async fn exchange_credentials(&self) -> Result<CachedToken, ProviderError> {
        let (client_id, client_secret) = match (&self.client_id, &self.client_secret) {
            (Some(id), Some(secret)) => (id, secret),
            _ => {
                return Err(ProviderError::AuthenticationFailed(
                    "Spotify credentials not configured".to_string(),
                ))
            }
        };

        let response = self
            .http
            .post(SPOTIFY_TOKEN_URL)
            .basic_auth(client_id, Some(client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| ProviderError::AuthenticationFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::AuthenticationFailed(format!(
                "token exchange returned HTTP {}: {}",
                status.as_u16(),
                body
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        info!(
            expires_in = token.expires_in,
            "Obtained Spotify access token"
        );

        Ok(CachedToken::fresh(
            token.access_token,
            token.expires_in,
            Instant::now(),
        ))
    }

    /// Search artists by name
    pub async fn search_artists(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<CatalogArtist>, ProviderError> {
        let token = self.access_token().await?;

        debug!(query = %query, limit, "Searching Spotify artists");

        let response = self
            .http
            .get(format!("{}/search", SPOTIFY_API_BASE_URL))
            .bearer_auth(&token)
            .query(&[("q", query), ("type", "artist"), ("limit", &limit.to_string())])
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;

        let search: SearchResponse = decode_json(response).await?;

        Ok(search.artists.items.into_iter().map(map_artist).collect())
    }

    /// Full artist record by id
    pub async fn get_artist(&self, artist_id: &str) -> Result<CatalogArtist, ProviderError> {
        let token = self.access_token().await?;

        let response = self
            .http
            .get(format!("{}/artists/{}", SPOTIFY_API_BASE_URL, artist_id))
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;

        let artist: RawArtist = decode_json(response).await?;

        Ok(map_artist(artist))
    }

    /// Artist record resolved from a pasted URL, when the URL parses
    pub async fn get_artist_by_url(
        &self,
        url: &str,
    ) -> Result<Option<CatalogArtist>, ProviderError> {
        match extract_artist_id(url) {
            Some(artist_id) => self.get_artist(&artist_id).await.map(Some),
            None => Ok(None),
        }
    }

    /// An artist's top tracks, ranked by the catalog, market-scoped
    pub async fn artist_top_tracks(
        &self,
        artist_id: &str,
        market: Option<&str>,
    ) -> Result<Vec<CatalogTrack>, ProviderError> {
        let token = self.access_token().await?;
        let market = market.unwrap_or(&self.market);

        debug!(artist_id = %artist_id, market = %market, "Fetching Spotify top tracks");

        let response = self
            .http
            .get(format!(
                "{}/artists/{}/top-tracks",
                SPOTIFY_API_BASE_URL, artist_id
            ))
            .bearer_auth(&token)
            .query(&[("market", market)])
            .send()
            .await
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;

        let top: TopTracksResponse = decode_json(response).await?;

        Ok(top.tracks.into_iter().map(map_track).collect())
    }
}

fn map_artist(raw: RawArtist) -> CatalogArtist {
    CatalogArtist {
        image_url: raw.images.first().map(|i| i.url.clone()),
        spotify_url: raw.external_urls.and_then(|u| u.spotify),
        id: raw.id,
        name: raw.name,
        genres: raw.genres,
        popularity: raw.popularity,
        followers: raw.followers.and_then(|f| f.total),
    }
}

fn map_track(raw: RawTrack) -> CatalogTrack {
    CatalogTrack {
        album_name: raw.album.as_ref().and_then(|a| a.name.clone()),
        album_image: raw
            .album
            .as_ref()
            .and_then(|a| a.images.first().map(|i| i.url.clone())),
        spotify_url: raw.external_urls.and_then(|u| u.spotify),
        id: raw.id,
        name: raw.name,
        preview_url: raw.preview_url,
        duration_ms: raw.duration_ms.unwrap_or(0),
        popularity: raw.popularity,
    }
}
