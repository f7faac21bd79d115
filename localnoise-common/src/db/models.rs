//! Persisted models
//!
//! JSON field names are camelCase to match the wire format the map
//! frontend consumes.

use serde::Serialize;
use uuid::Uuid;

/// A band pinned on the map
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Band {
    pub id: Uuid,
    pub name: String,
    pub city: String,
    pub country: String,
    /// Always within [-90, 90]; may differ from the submitted value when
    /// placement nudged the marker away from an existing band
    pub latitude: f64,
    /// Always within [-180, 180]
    pub longitude: f64,
    pub genre: Option<String>,
    pub description: Option<String>,
    pub year_formed: Option<i64>,
    pub website: Option<String>,
    pub spotify_url: Option<String>,
    /// Authoritative catalog artist id; enables hybrid track resolution
    pub spotify_id: Option<String>,
    pub spotify_image_url: Option<String>,
    /// True only when linked to a catalog artist record (spotify_id set)
    pub is_verified: bool,
    pub youtube_url: Option<String>,
    pub instagram_url: Option<String>,
    pub twitter_url: Option<String>,
    pub tiktok_url: Option<String>,
    pub is_active: bool,
    /// User who created the entry; authorizes edit/delete
    pub added_by: Uuid,
    pub created_at: String,
    pub updated_at: String,
}

/// Public projection of the user who added a band
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Contributor {
    pub id: Uuid,
    pub username: String,
}

/// Band with its contributor embedded, as returned by the API
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BandWithContributor {
    #[serde(flatten)]
    pub band: Band,
    pub contributor: Option<Contributor>,
}

/// A registered account
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub city: Option<String>,
    pub country: Option<String>,
    pub profile_photo: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// User fields safe to expose over the API
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub city: Option<String>,
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_photo: Option<String>,
}

impl User {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            city: self.city.clone(),
            country: self.country.clone(),
            profile_photo: self.profile_photo.clone(),
        }
    }
}
