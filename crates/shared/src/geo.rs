//! Geographic point type and coordinate helpers.

use geo::{HaversineDistance, Point};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Number of decimal places kept for stored coordinates.
pub const COORDINATE_PRECISION: i32 = 8;

const SCALE: f64 = 100_000_000.0;

/// Distance (in units of the last kept decimal place) under which a scaled value
/// is considered to already sit on the precision grid.
const GRID_SNAP: f64 = 1e-3;

/// Meters in a statute mile, used to convert earthdistance results.
pub const METERS_PER_MILE: f64 = 1609.344;

/// A position on the globe.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, Validate)]
pub struct GeoPoint {
    #[validate(custom(function = "crate::validation::validate_longitude"))]
    pub longitude: f64,
    #[validate(custom(function = "crate::validation::validate_latitude"))]
    pub latitude: f64,
}

impl GeoPoint {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            longitude,
            latitude,
        }
    }

    /// Returns the point with both axes truncated to [`COORDINATE_PRECISION`] decimals.
    pub fn truncate(self) -> Self {
        Self {
            longitude: truncate_coordinate(self.longitude),
            latitude: truncate_coordinate(self.latitude),
        }
    }

    /// Whether both axes are inside their valid ranges (bounds inclusive).
    pub fn is_valid(&self) -> bool {
        (-180.0..=180.0).contains(&self.longitude) && (-90.0..=90.0).contains(&self.latitude)
    }

    /// Great-circle distance to `other` in meters.
    pub fn haversine_distance(&self, other: &GeoPoint) -> f64 {
        let a = Point::new(self.longitude, self.latitude);
        let b = Point::new(other.longitude, other.latitude);
        a.haversine_distance(&b)
    }
}

/// Truncates a coordinate toward zero to [`COORDINATE_PRECISION`] decimal places.
///
/// Values that already lie on the precision grid (up to float noise) are kept there,
/// so truncating twice gives the same result as truncating once. The result is
/// never further from zero than the input.
pub fn truncate_coordinate(value: f64) -> f64 {
    let scaled = value * SCALE;
    let nearest = scaled.round();
    let steps = if (scaled - nearest).abs() < GRID_SNAP {
        nearest
    } else {
        scaled.trunc()
    };

    let truncated = steps / SCALE;
    if truncated.abs() > value.abs() {
        // Snapped up from just below a grid point.
        scaled.trunc() / SCALE
    } else {
        truncated
    }
}
