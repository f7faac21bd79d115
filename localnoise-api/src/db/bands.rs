//! Band database operations
//!
//! Bands are listed with their contributor's public profile joined in, so
//! the map popup can credit whoever added the entry.

use localnoise_common::db::{Band, BandWithContributor, Contributor};
use localnoise_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Fields supplied when creating a band; id and coordinates are final
/// (placement has already run), timestamps come from the database.
#[derive(Debug, Clone)]
pub struct NewBand {
    pub id: Uuid,
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
    pub is_verified: bool,
    pub youtube_url: Option<String>,
    pub instagram_url: Option<String>,
    pub twitter_url: Option<String>,
    pub tiktok_url: Option<String>,
    pub added_by: Uuid,
}

/// Optional filters for the band listing
#[derive(Debug, Clone, Default)]
pub struct BandFilter {
    pub genre: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

const BAND_COLUMNS: &str = r#"
    b.id, b.name, b.city, b.country, b.latitude, b.longitude,
    b.genre, b.description, b.year_formed, b.website,
    b.spotify_url, b.spotify_id, b.spotify_image_url, b.is_verified,
    b.youtube_url, b.instagram_url, b.twitter_url, b.tiktok_url,
    b.is_active, b.added_by, b.created_at, b.updated_at,
    u.username AS contributor_username
"#;

/// Insert a new band
pub async fn insert_band(pool: &SqlitePool, band: &NewBand) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO bands (
            id, name, city, country, latitude, longitude,
            genre, description, year_formed, website,
            spotify_url, spotify_id, spotify_image_url, is_verified,
            youtube_url, instagram_url, twitter_url, tiktok_url,
            is_active, added_by, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 1, ?,
                  CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(band.id.to_string())
    .bind(&band.name)
    .bind(&band.city)
    .bind(&band.country)
    .bind(band.latitude)
    .bind(band.longitude)
    .bind(&band.genre)
    .bind(&band.description)
    .bind(band.year_formed)
    .bind(&band.website)
    .bind(&band.spotify_url)
    .bind(&band.spotify_id)
    .bind(&band.spotify_image_url)
    .bind(band.is_verified as i64)
    .bind(&band.youtube_url)
    .bind(&band.instagram_url)
    .bind(&band.twitter_url)
    .bind(&band.tiktok_url)
    .bind(band.added_by.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

/// Load one band with its contributor
pub async fn get_band(pool: &SqlitePool, id: Uuid) -> Result<Option<BandWithContributor>> {
    let row = sqlx::query(&format!(
        r#"
        SELECT {BAND_COLUMNS}
        FROM bands b
        LEFT JOIN users u ON u.id = b.added_by
        WHERE b.id = ?
        "#
    ))
    .bind(id.to_string())
    .fetch_optional(pool)
    .await?;

    row.map(|row| band_with_contributor_from_row(&row)).transpose()
}

/// List active bands with optional genre/country/city filters
///
/// Returns the page of rows plus the total count matching the filters, so
/// the frontend can page.
pub async fn list_bands(
    pool: &SqlitePool,
    filter: &BandFilter,
) -> Result<(Vec<BandWithContributor>, i64)> {
    let mut conditions = vec!["b.is_active = 1".to_string()];
    let mut binds: Vec<String> = Vec::new();

    if let Some(genre) = &filter.genre {
        conditions.push("lower(b.genre) = lower(?)".to_string());
        binds.push(genre.clone());
    }
    if let Some(country) = &filter.country {
        conditions.push("lower(b.country) = lower(?)".to_string());
        binds.push(country.clone());
    }
    if let Some(city) = &filter.city {
        conditions.push("lower(b.city) = lower(?)".to_string());
        binds.push(city.clone());
    }

    let where_clause = conditions.join(" AND ");

    let count_sql = format!("SELECT COUNT(*) AS total FROM bands b WHERE {where_clause}");
    let mut count_query = sqlx::query(&count_sql);
    for bind in &binds {
        count_query = count_query.bind(bind);
    }
    let total: i64 = count_query.fetch_one(pool).await?.get("total");

    let page_sql = format!(
        r#"
        SELECT {BAND_COLUMNS}
        FROM bands b
        LEFT JOIN users u ON u.id = b.added_by
        WHERE {where_clause}
        ORDER BY b.created_at DESC
        LIMIT ? OFFSET ?
        "#
    );
    let mut page_query = sqlx::query(&page_sql);
    for bind in &binds {
        page_query = page_query.bind(bind);
    }
    let rows = page_query
        .bind(filter.limit)
        .bind(filter.offset)
        .fetch_all(pool)
        .await?;

    let bands = rows
        .iter()
        .map(band_with_contributor_from_row)
        .collect::<Result<Vec<_>>>()?;

    Ok((bands, total))
}

/// Free-text search over name, city, country and genre
pub async fn search_bands(
    pool: &SqlitePool,
    query: &str,
    limit: i64,
) -> Result<Vec<BandWithContributor>> {
    let pattern = format!("%{}%", query.to_lowercase());

    let rows = sqlx::query(&format!(
        r#"
        SELECT {BAND_COLUMNS}
        FROM bands b
        LEFT JOIN users u ON u.id = b.added_by
        WHERE b.is_active = 1
          AND (lower(b.name) LIKE ?
               OR lower(b.city) LIKE ?
               OR lower(b.country) LIKE ?
               OR lower(COALESCE(b.genre, '')) LIKE ?)
        ORDER BY b.name
        LIMIT ?
        "#
    ))
    .bind(&pattern)
    .bind(&pattern)
    .bind(&pattern)
    .bind(&pattern)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.iter().map(band_with_contributor_from_row).collect()
}

/// Active bands in a city within a latitude/longitude window
///
/// This is the neighbor lookup behind marker placement; city match is
/// exact, the window is a plain bounding box.
pub async fn find_bands_near(
    pool: &SqlitePool,
    city: &str,
    lat_min: f64,
    lat_max: f64,
    lon_min: f64,
    lon_max: f64,
) -> Result<Vec<Band>> {
    let rows = sqlx::query(
        r#"
        SELECT b.id, b.name, b.city, b.country, b.latitude, b.longitude,
               b.genre, b.description, b.year_formed, b.website,
               b.spotify_url, b.spotify_id, b.spotify_image_url, b.is_verified,
               b.youtube_url, b.instagram_url, b.twitter_url, b.tiktok_url,
               b.is_active, b.added_by, b.created_at, b.updated_at
        FROM bands b
        WHERE b.is_active = 1
          AND b.city = ?
          AND b.latitude BETWEEN ? AND ?
          AND b.longitude BETWEEN ? AND ?
        "#,
    )
    .bind(city)
    .bind(lat_min)
    .bind(lat_max)
    .bind(lon_min)
    .bind(lon_max)
    .fetch_all(pool)
    .await?;

    rows.iter().map(band_from_row).collect()
}

/// Write back a band's mutable fields
///
/// The handler loads the band, merges the request into it, and persists the
/// whole row; updated_at is refreshed here.
pub async fn update_band(pool: &SqlitePool, band: &Band) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE bands SET
            name = ?, city = ?, country = ?, latitude = ?, longitude = ?,
            genre = ?, description = ?, year_formed = ?, website = ?,
            spotify_url = ?, spotify_id = ?, spotify_image_url = ?,
            is_verified = ?, youtube_url = ?, instagram_url = ?,
            twitter_url = ?, tiktok_url = ?, is_active = ?,
            updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(&band.name)
    .bind(&band.city)
    .bind(&band.country)
    .bind(band.latitude)
    .bind(band.longitude)
    .bind(&band.genre)
    .bind(&band.description)
    .bind(band.year_formed)
    .bind(&band.website)
    .bind(&band.spotify_url)
    .bind(&band.spotify_id)
    .bind(&band.spotify_image_url)
    .bind(band.is_verified as i64)
    .bind(&band.youtube_url)
    .bind(&band.instagram_url)
    .bind(&band.twitter_url)
    .bind(&band.tiktok_url)
    .bind(band.is_active as i64)
    .bind(band.id.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

/// Hard-delete a band; returns the number of rows removed
pub async fn delete_band(pool: &SqlitePool, id: Uuid) -> Result<u64> {
    let result = sqlx::query("DELETE FROM bands WHERE id = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

fn band_from_row(row: &SqliteRow) -> Result<Band> {
    let id: String = row.get("id");
    let added_by: String = row.get("added_by");

    Ok(Band {
        id: parse_uuid(&id)?,
        name: row.get("name"),
        city: row.get("city"),
        country: row.get("country"),
        latitude: row.get("latitude"),
        longitude: row.get("longitude"),
        genre: row.get("genre"),
        description: row.get("description"),
        year_formed: row.get("year_formed"),
        website: row.get("website"),
        spotify_url: row.get("spotify_url"),
        spotify_id: row.get("spotify_id"),
        spotify_image_url: row.get("spotify_image_url"),
        is_verified: row.get::<i64, _>("is_verified") != 0,
        youtube_url: row.get("youtube_url"),
        instagram_url: row.get("instagram_url"),
        twitter_url: row.get("twitter_url"),
        tiktok_url: row.get("tiktok_url"),
        is_active: row.get::<i64, _>("is_active") != 0,
        added_by: parse_uuid(&added_by)?,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn band_with_contributor_from_row(row: &SqliteRow) -> Result<BandWithContributor> {
    let band = band_from_row(row)?;
    let contributor = row
        .get::<Option<String>, _>("contributor_username")
        .map(|username| Contributor {
            id: band.added_by,
            username,
        });

    Ok(BandWithContributor { band, contributor })
}

fn parse_uuid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| Error::Internal(format!("Invalid UUID in database: {}", e)))
}
