//! Geographic coordinates and unit-sphere directions.
//!
//! Latitude is measured from the equator toward `+Z`, longitude from `+X`
//! toward `+Y`. Both are in radians.

use std::f64::consts::{FRAC_PI_2, PI};

use glam::DVec3;

use crate::error::{MapError, Result};

/// Southern latitude bound.
pub const MIN_LAT: f64 = -FRAC_PI_2;
/// Northern latitude bound.
pub const MAX_LAT: f64 = FRAC_PI_2;
/// Western longitude bound.
pub const MIN_LON: f64 = -PI;
/// Eastern longitude bound.
pub const MAX_LON: f64 = PI;

/// Reject latitudes/longitudes outside the closed geographic domain.
pub fn check_geo(lat: f64, lon: f64) -> Result<()> {
    if !(MIN_LAT..=MAX_LAT).contains(&lat) {
        return Err(MapError::out_of_range("latitude", lat));
    }
    if !(MIN_LON..=MAX_LON).contains(&lon) {
        return Err(MapError::out_of_range("longitude", lon));
    }
    Ok(())
}

/// Reject directions that do not identify a point on the sphere.
///
/// Directions need not be normalized, but they must be finite and non-zero.
pub fn check_direction(dir: DVec3) -> Result<()> {
    if !dir.is_finite() {
        return Err(MapError::out_of_range("direction component", f64::NAN));
    }
    let len = dir.length();
    if len < 1e-300 {
        return Err(MapError::out_of_range("direction length", len));
    }
    Ok(())
}

/// Unit direction for a latitude/longitude pair.
///
/// `x = cos(lat)cos(lon)`, `y = cos(lat)sin(lon)`, `z = sin(lat)`.
pub fn direction_from_geo(lat: f64, lon: f64) -> Result<DVec3> {
    check_geo(lat, lon)?;
    let (sin_lat, cos_lat) = lat.sin_cos();
    let (sin_lon, cos_lon) = lon.sin_cos();
    Ok(DVec3::new(cos_lat * cos_lon, cos_lat * sin_lon, sin_lat))
}

/// Latitude/longitude of a direction. The direction need not be unit length.
///
/// Longitude uses `atan2`, so every quadrant and `x = 0` are handled. At the
/// poles longitude is undefined; `atan2(0, 0)` yields `0` there, which callers
/// must not rely on.
#[must_use]
pub fn geo_from_direction(dir: DVec3) -> (f64, f64) {
    let horizontal = (dir.x * dir.x + dir.y * dir.y).sqrt();
    let lat = dir.z.atan2(horizontal);
    let lon = dir.y.atan2(dir.x);
    (lat, lon)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-12;

    #[test]
    fn test_meridian_vector_is_origin() {
        let (lat, lon) = geo_from_direction(DVec3::X);
        assert_eq!(lat, 0.0);
        assert_eq!(lon, 0.0);
    }

    #[test]
    fn test_45_lon_vector() {
        let (lat, lon) = geo_from_direction(DVec3::new(1.0, 1.0, 0.0));
        assert_eq!(lat, 0.0);
        assert!((lon - 45f64.to_radians()).abs() < EPSILON);
    }

    #[test]
    fn test_negative_y_is_minus_90_lon() {
        let (lat, lon) = geo_from_direction(DVec3::NEG_Y);
        assert_eq!(lat, 0.0);
        assert!((lon + FRAC_PI_2).abs() < EPSILON);
    }

    #[test]
    fn test_negative_x_quadrants() {
        // A one-argument atan would fold these onto the +X hemisphere.
        let (_, lon) = geo_from_direction(DVec3::new(-1.0, 1.0, 0.0));
        assert!((lon - 135f64.to_radians()).abs() < EPSILON);
        let (_, lon) = geo_from_direction(DVec3::new(-1.0, -1.0, 0.0));
        assert!((lon + 135f64.to_radians()).abs() < EPSILON);
        let (_, lon) = geo_from_direction(DVec3::new(0.0, 2.0, 0.0));
        assert!((lon - FRAC_PI_2).abs() < EPSILON);
    }

    #[test]
    fn test_latitude_conversion() {
        let (lat, _) = geo_from_direction(DVec3::new(1.0, 0.0, 1.0));
        assert!((lat - 45f64.to_radians()).abs() < EPSILON);
    }

    #[test]
    fn test_longitude_converts_to_equal_xy() {
        let v = direction_from_geo(0.0, 45f64.to_radians()).unwrap();
        assert!((v.x - v.y).abs() < EPSILON);
    }

    #[test]
    fn test_latitude_converts_to_equal_xz() {
        let v = direction_from_geo(45f64.to_radians(), 0.0).unwrap();
        assert!((v.x - v.z).abs() < EPSILON);
    }

    #[test]
    fn test_direction_is_unit_length() {
        for lat_deg in (-90..=90).step_by(15) {
            for lon_deg in (-180..=180).step_by(30) {
                let v = direction_from_geo(
                    f64::from(lat_deg).to_radians(),
                    f64::from(lon_deg).to_radians(),
                )
                .unwrap();
                assert!((v.length() - 1.0).abs() < EPSILON);
            }
        }
    }

    #[test]
    fn test_roundtrip_away_from_poles() {
        for lat_deg in (-85..=85).step_by(5) {
            for lon_deg in (-175..=175).step_by(5) {
                let lat = f64::from(lat_deg).to_radians();
                let lon = f64::from(lon_deg).to_radians();
                let (lat2, lon2) = geo_from_direction(direction_from_geo(lat, lon).unwrap());
                assert!((lat - lat2).abs() < 1e-10, "lat drift at ({lat_deg}, {lon_deg})");
                assert!((lon - lon2).abs() < 1e-10, "lon drift at ({lat_deg}, {lon_deg})");
            }
        }
    }

    #[test]
    fn test_poles_keep_latitude() {
        // Longitude is undefined at the poles; only latitude survives.
        let (lat, _) = geo_from_direction(direction_from_geo(MAX_LAT, 1.0).unwrap());
        assert!((lat - MAX_LAT).abs() < 1e-10);
        let (lat, _) = geo_from_direction(direction_from_geo(MIN_LAT, -2.0).unwrap());
        assert!((lat - MIN_LAT).abs() < 1e-10);
    }

    #[test]
    fn test_bounds_are_inclusive() {
        assert!(direction_from_geo(MAX_LAT, MAX_LON).is_ok());
        assert!(direction_from_geo(MIN_LAT, MIN_LON).is_ok());
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert!(matches!(
            direction_from_geo(2.0, 0.0),
            Err(MapError::OutOfRange { what: "latitude", .. })
        ));
        assert!(matches!(
            direction_from_geo(0.0, -3.5),
            Err(MapError::OutOfRange { what: "longitude", .. })
        ));
        assert!(direction_from_geo(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_degenerate_directions_rejected() {
        assert!(check_direction(DVec3::ZERO).is_err());
        assert!(check_direction(DVec3::new(f64::INFINITY, 0.0, 0.0)).is_err());
        assert!(check_direction(DVec3::new(0.0, 0.0, 3.0)).is_ok());
    }
}
