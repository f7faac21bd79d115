//! Marker placement for new bands
//!
//! Several bands in one rehearsal space is common, and bit-identical
//! coordinates stack their map markers into a single unclickable pin. On
//! creation, the submitted point is checked against existing active bands
//! in the same city within a ±0.001° window (roughly 200 m at the
//! equator; the box narrows toward the poles and that is accepted). With
//! `n` neighbors present the point is pushed ~20 m per neighbor along a
//! rotating direction, so successive bands fan out instead of stacking.
//!
//! The adjustment is a pure function of the submitted point and the
//! neighbor count: no randomness, and the same snapshot always produces
//! the same result. A single pass only: the adjusted point is not
//! re-checked against further bands.

use localnoise_common::{Error, Result};
use sqlx::SqlitePool;
use tracing::debug;

use crate::db;

/// Half-width of the neighbor search window, in degrees
pub const NEARBY_WINDOW_DEGREES: f64 = 0.001;

/// Offset magnitude per neighboring band (~20 m)
const OFFSET_STEP_DEGREES: f64 = 0.0002;

/// Direction advances by this much per neighbor, counter-clockwise from east
const ANGLE_STEP_DEGREES: f64 = 60.0;

/// Reject out-of-range or non-finite coordinates before any lookup runs
pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<()> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(Error::InvalidCoordinates(format!(
            "latitude {} outside [-90, 90]",
            latitude
        )));
    }
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(Error::InvalidCoordinates(format!(
            "longitude {} outside [-180, 180]",
            longitude
        )));
    }
    Ok(())
}

/// Apply the radial offset for `neighbors` colliding bands
///
/// Offset magnitude is `0.0002 * neighbors` degrees at an angle of
/// `(neighbors * 60) mod 360` degrees. Zero neighbors returns the point
/// unchanged.
pub fn offset_for_neighbors(latitude: f64, longitude: f64, neighbors: usize) -> (f64, f64) {
    if neighbors == 0 {
        return (latitude, longitude);
    }

    let offset = OFFSET_STEP_DEGREES * neighbors as f64;
    let angle = ((neighbors as f64 * ANGLE_STEP_DEGREES) % 360.0).to_radians();

    (
        latitude + offset * angle.cos(),
        longitude + offset * angle.sin(),
    )
}

/// Compute the stored coordinates for a band about to be created
///
/// Counts existing active bands in the same city within the window and
/// offsets accordingly. A failed lookup propagates: band creation must
/// abort rather than persist an unchecked point.
///
/// The count and the caller's subsequent insert are not serialized per
/// city, so two simultaneous creations can observe the same neighbor
/// count and land on the same offset. Accepted at this catalog's write
/// rate.
pub async fn place_band(
    pool: &SqlitePool,
    city: &str,
    latitude: f64,
    longitude: f64,
) -> Result<(f64, f64)> {
    validate_coordinates(latitude, longitude)?;

    let nearby = db::bands::find_bands_near(
        pool,
        city,
        latitude - NEARBY_WINDOW_DEGREES,
        latitude + NEARBY_WINDOW_DEGREES,
        longitude - NEARBY_WINDOW_DEGREES,
        longitude + NEARBY_WINDOW_DEGREES,
    )
    .await?;

    let neighbors = nearby.len();
    if neighbors > 0 {
        debug!(
            city = %city,
            neighbors,
            "Nudging new band away from existing markers"
        );
    }

    Ok(offset_for_neighbors(latitude, longitude, neighbors))
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-12;

    #[test]
    fn zero_neighbors_is_identity() {
        let (lat, lon) = offset_for_neighbors(42.3314, -83.0458, 0);
        assert_eq!(lat, 42.3314);
        assert_eq!(lon, -83.0458);
    }

    #[test]
    fn one_neighbor_offsets_at_sixty_degrees() {
        let (lat, lon) = offset_for_neighbors(-34.6037, -58.3816, 1);

        // offset 0.0002 at 60°: Δlat = 0.0001, Δlon ≈ 0.0001732
        assert!((lat - (-34.6037 + 0.0001)).abs() < EPSILON);
        assert!((lon - (-58.3816 + 0.0002 * 60f64.to_radians().sin())).abs() < EPSILON);
        assert!((lon - (-58.3816 + 0.000_173_205_080_756_887_7)).abs() < 1e-9);
    }

    #[test]
    fn offset_magnitude_and_angle_reconstruct() {
        for neighbors in 1..=12usize {
            let (lat, lon) = offset_for_neighbors(10.0, 20.0, neighbors);
            let (dlat, dlon) = (lat - 10.0, lon - 20.0);

            let magnitude = (dlat * dlat + dlon * dlon).sqrt();
            assert!(
                (magnitude - 0.0002 * neighbors as f64).abs() < EPSILON,
                "magnitude off for n={}",
                neighbors
            );

            let expected_angle = ((neighbors as f64 * 60.0) % 360.0).to_radians();
            let angle = dlon.atan2(dlat).rem_euclid(std::f64::consts::TAU);
            assert!(
                (angle - expected_angle).abs() < 1e-9,
                "angle off for n={}",
                neighbors
            );
        }
    }

    #[test]
    fn six_neighbors_wraps_back_to_east_axis() {
        // (6 * 60) mod 360 = 0°: the whole offset lands on the cos term
        let (lat, lon) = offset_for_neighbors(0.0, 0.0, 6);
        assert!((lat - 0.0012).abs() < EPSILON);
        assert!(lon.abs() < EPSILON);
    }

    #[test]
    fn offset_is_deterministic() {
        let a = offset_for_neighbors(51.5074, -0.1278, 3);
        let b = offset_for_neighbors(51.5074, -0.1278, 3);
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert!(validate_coordinates(90.1, 0.0).is_err());
        assert!(validate_coordinates(-90.1, 0.0).is_err());
        assert!(validate_coordinates(0.0, 180.1).is_err());
        assert!(validate_coordinates(0.0, -180.1).is_err());
        assert!(validate_coordinates(f64::NAN, 0.0).is_err());
        assert!(validate_coordinates(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn accepts_boundary_coordinates() {
        assert!(validate_coordinates(90.0, 180.0).is_ok());
        assert!(validate_coordinates(-90.0, -180.0).is_ok());
        assert!(validate_coordinates(0.0, 0.0).is_ok());
    }
}
