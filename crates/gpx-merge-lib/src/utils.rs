//! Utility functions for coordinate projection and planar geometry

use crate::Point;
use geo::Coord;

/// Mean Earth radius in meters
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Precomputed constant: meters per degree along a great circle
const METERS_PER_DEGREE: f64 = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;

/// Equirectangular projection around a reference point, in meters
///
/// Accurate to well below GPS noise over the extent of a typical track segment. Longitude
/// differences are wrapped so segments crossing the antimeridian stay contiguous.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocalProjection {
    origin_latitude: f64,
    origin_longitude: f64,
    /// Scale of one degree of longitude relative to one degree of latitude
    longitude_scale: f64,
}

impl LocalProjection {
    pub fn new(origin_latitude: f64, origin_longitude: f64) -> Self {
        Self {
            origin_latitude,
            origin_longitude,
            longitude_scale: origin_latitude.to_radians().cos(),
        }
    }

    /// Projection centred on the mean latitude of `points`, anchored at the first longitude
    ///
    /// Returns `None` for an empty slice.
    pub fn for_points(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let mean_latitude = points.iter().map(|p| p.latitude).sum::<f64>() / points.len() as f64;
        Some(Self::new(mean_latitude, first.longitude))
    }

    /// Project WGS84 degrees into planar meters (x east, y north)
    #[inline(always)]
    pub fn project(&self, latitude: f64, longitude: f64) -> Coord<f64> {
        let dlon = wrap_longitude(longitude - self.origin_longitude);
        Coord {
            x: dlon * self.longitude_scale * METERS_PER_DEGREE,
            y: (latitude - self.origin_latitude) * METERS_PER_DEGREE,
        }
    }

    #[inline(always)]
    pub fn project_point(&self, point: &Point) -> Coord<f64> {
        self.project(point.latitude, point.longitude)
    }
}

/// Normalize a longitude difference into [-180, 180)
#[inline(always)]
pub fn wrap_longitude(delta: f64) -> f64 {
    (delta + 180.0).rem_euclid(360.0) - 180.0
}

/// Perpendicular distance from `p` to the infinite line through `a` and `b`
///
/// Falls back to the distance from `a` when the two line points coincide.
#[inline]
pub fn distance_to_line(p: Coord<f64>, a: Coord<f64>, b: Coord<f64>) -> f64 {
    let ab = b - a;
    let ap = p - a;
    let length = ab.x.hypot(ab.y);
    if length <= f64::EPSILON {
        return ap.x.hypot(ap.y);
    }
    (ab.x * ap.y - ab.y * ap.x).abs() / length
}
