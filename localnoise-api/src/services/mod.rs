//! External catalog clients and the band-facing services built on them
//!
//! Each provider wrapper is a stateless, constructible service owning its
//! own `reqwest::Client`; one instance of each is created at startup and
//! shared through `AppState`.

pub mod deezer;
pub mod matching;
pub mod placement;
pub mod resolver;
pub mod spotify;
pub mod youtube;

pub use deezer::DeezerClient;
pub use resolver::TrackResolver;
pub use spotify::SpotifyClient;
pub use youtube::YouTubeClient;

use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

pub(crate) const USER_AGENT: &str = "LocalNoise/0.1.0 (band map backend)";

/// Bound on every external call; a hung provider is treated as a failure
pub(crate) const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from external catalog providers
///
/// The track resolution pipeline absorbs all of these into fallback
/// attempts; only the direct passthrough endpoints surface them to the
/// caller.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Credential exchange with the provider failed
    #[error("Provider authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Network failure, timeout, or non-success HTTP status
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    /// Response arrived but could not be decoded
    #[error("Unexpected provider response: {0}")]
    InvalidResponse(String),
}

/// Check status and decode a JSON body, mapping failures uniformly
pub(crate) async fn decode_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ProviderError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::Unavailable(format!(
            "HTTP {}: {}",
            status.as_u16(),
            body
        )));
    }

    response
        .json()
        .await
        .map_err(|e| ProviderError::InvalidResponse(e.to_string()))
}
