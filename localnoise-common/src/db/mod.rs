//! Database access layer shared across the LocalNoise backend

pub mod init;
pub mod models;

pub use init::init_database;
pub use models::{Band, BandWithContributor, Contributor, User, UserProfile};
