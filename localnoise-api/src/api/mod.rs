//! HTTP API handlers for the LocalNoise backend

pub mod auth;
pub mod bands;
pub mod deezer;
pub mod health;
pub mod spotify;
pub mod youtube;

pub use auth::auth_middleware;
pub use health::health_routes;
