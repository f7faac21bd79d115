//! Database operations for the LocalNoise API

pub mod bands;
pub mod users;
