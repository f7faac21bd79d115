//! Configuration loading for the LocalNoise backend
//!
//! Resolution priority, highest first:
//! 1. Command-line argument
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default
//!
//! Provider credentials warn when they are present in more than one source,
//! since a stale file value shadowed by an environment variable is a common
//! misconfiguration.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default market used when the authoritative catalog asks for a locale
pub const DEFAULT_MARKET: &str = "US";

/// Resolved runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Bind host for the HTTP server
    pub host: String,
    /// Bind port for the HTTP server
    pub port: u16,
    /// SQLite database file path
    pub database_path: PathBuf,
    /// Origins allowed by the CORS layer (the map frontend)
    pub allowed_origins: Vec<String>,
    /// Secret used to sign bearer tokens
    pub jwt_secret: String,
    /// Bearer token lifetime in hours
    pub token_ttl_hours: i64,
    /// Authoritative catalog application credentials
    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<String>,
    /// ISO country code for top-track lookups
    pub spotify_market: String,
    /// Video catalog API key (optional; search degrades to empty without it)
    pub youtube_api_key: Option<String>,
}

/// Command-line overrides applied on top of env/file resolution
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub port: Option<u16>,
    pub database_path: Option<PathBuf>,
}

/// Raw TOML file shape; every field optional so partial files work
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub server: FileServerConfig,
    #[serde(default)]
    pub database: FileDatabaseConfig,
    #[serde(default)]
    pub cors: FileCorsConfig,
    #[serde(default)]
    pub auth: FileAuthConfig,
    #[serde(default)]
    pub spotify: FileSpotifyConfig,
    #[serde(default)]
    pub youtube: FileYoutubeConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileDatabaseConfig {
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileCorsConfig {
    pub allowed_origins: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileAuthConfig {
    pub jwt_secret: Option<String>,
    pub token_ttl_hours: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileSpotifyConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub market: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileYoutubeConfig {
    pub api_key: Option<String>,
}

impl Config {
    /// Load configuration with the standard resolution priority
    pub fn load(overrides: &ConfigOverrides) -> Result<Config> {
        let file = match locate_config_file(overrides.config_path.as_deref()) {
            Some(path) => {
                info!("Loading config file: {}", path.display());
                parse_config_file(&path)?
            }
            None => FileConfig::default(),
        };

        let host = env_string("LOCALNOISE_HOST")
            .or(file.server.host)
            .unwrap_or_else(|| "127.0.0.1".to_string());

        let port = overrides
            .port
            .or_else(|| env_parse("LOCALNOISE_PORT"))
            .or(file.server.port)
            .unwrap_or(5000);

        let database_path = overrides
            .database_path
            .clone()
            .or_else(|| env_string("LOCALNOISE_DATABASE").map(PathBuf::from))
            .or(file.database.path)
            .unwrap_or_else(default_database_path);

        let allowed_origins = env_string("LOCALNOISE_FRONTEND_ORIGINS")
            .map(|s| s.split(',').map(|o| o.trim().to_string()).collect())
            .or(file.cors.allowed_origins)
            .unwrap_or_else(|| vec!["http://localhost:5173".to_string()]);

        let jwt_secret = match env_string("LOCALNOISE_JWT_SECRET").or(file.auth.jwt_secret) {
            Some(secret) => secret,
            None => {
                warn!("No JWT secret configured; using development default. Do not run this in production.");
                "localnoise-dev-secret".to_string()
            }
        };

        let token_ttl_hours = env_parse("LOCALNOISE_TOKEN_TTL_HOURS")
            .or(file.auth.token_ttl_hours)
            .unwrap_or(24);

        let spotify_client_id = resolve_credential(
            "Spotify client id",
            "SPOTIFY_CLIENT_ID",
            file.spotify.client_id,
        );
        let spotify_client_secret = resolve_credential(
            "Spotify client secret",
            "SPOTIFY_CLIENT_SECRET",
            file.spotify.client_secret,
        );
        let spotify_market = env_string("SPOTIFY_MARKET")
            .or(file.spotify.market)
            .unwrap_or_else(|| DEFAULT_MARKET.to_string());

        let youtube_api_key =
            resolve_credential("YouTube API key", "YOUTUBE_API_KEY", file.youtube.api_key);

        if spotify_client_id.is_none() || spotify_client_secret.is_none() {
            warn!("Spotify credentials not configured; catalog lookups will fall back to preview-provider search");
        }

        Ok(Config {
            host,
            port,
            database_path,
            allowed_origins,
            jwt_secret,
            token_ttl_hours,
            spotify_client_id,
            spotify_client_secret,
            spotify_market,
            youtube_api_key,
        })
    }
}

/// Resolve a secret that may come from env or the config file.
///
/// Env wins; a value in both places gets a warning so a stale file entry
/// is visible in the logs.
fn resolve_credential(label: &str, env_var: &str, file_value: Option<String>) -> Option<String> {
    let env_value = env_string(env_var);

    match (&env_value, &file_value) {
        (Some(_), Some(_)) => {
            warn!(
                "{} found in both environment ({}) and config file. Using environment value.",
                label, env_var
            );
        }
        (Some(_), None) => info!("{} loaded from environment variable", label),
        (None, Some(_)) => info!("{} loaded from config file", label),
        (None, None) => {}
    }

    env_value.or(file_value)
}

/// Find the config file to load, if any
///
/// Explicit path → LOCALNOISE_CONFIG → ~/.config/localnoise/config.toml →
/// ./localnoise.toml. A missing explicit path is an error; missing implicit
/// locations just mean "no file".
fn locate_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Some(path) = env_string("LOCALNOISE_CONFIG") {
        return Some(PathBuf::from(path));
    }

    if let Some(dir) = dirs::config_dir() {
        let path = dir.join("localnoise").join("config.toml");
        if path.exists() {
            return Some(path);
        }
    }

    let local = PathBuf::from("localnoise.toml");
    if local.exists() {
        return Some(local);
    }

    None
}

fn parse_config_file(path: &Path) -> Result<FileConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Default database location: OS data dir, falling back to the working directory
fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("localnoise").join("localnoise.db"))
        .unwrap_or_else(|| PathBuf::from("localnoise.db"))
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    env_string(name).and_then(|v| v.parse().ok())
}
