//! Douglas-Peucker simplification of track segments
//!
//! Points are projected into a local planar frame in meters (see
//! [`LocalProjection`](crate::utils::LocalProjection)), so the tolerance is a real ground
//! distance. Elevation does not take part in the distance metric.

use crate::utils::{LocalProjection, distance_to_line};
use crate::{Document, MergeError, Point, Result, Segment};
use geo::Coord;

/// Tolerance used when simplification is requested without an explicit distance
pub const DEFAULT_TOLERANCE_METERS: f64 = 10.0;

/// Simplification setting of a merge
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Tolerance {
    /// Leave every point in place
    #[default]
    Disabled,
    /// Simplify with [`DEFAULT_TOLERANCE_METERS`]
    Default,
    /// Simplify with an explicit maximum deviation in meters
    Meters(f64),
}

impl Tolerance {
    /// Explicit tolerance, rejecting negative and non-finite values
    pub fn meters(value: f64) -> Result<Self> {
        if !value.is_finite() || value < 0.0 {
            return Err(MergeError::InvalidArguments(format!(
                "simplification tolerance must be a non-negative distance, got {value}"
            )));
        }
        Ok(Tolerance::Meters(value))
    }

    /// Build from the optional-value `-d` flag: absent, bare or with a distance
    pub fn from_flag(flag: Option<Option<f64>>) -> Result<Self> {
        match flag {
            None => Ok(Tolerance::Disabled),
            Some(None) => Ok(Tolerance::Default),
            Some(Some(value)) => Tolerance::meters(value),
        }
    }

    /// Distance in meters, or `None` when disabled
    pub fn resolve(&self) -> Option<f64> {
        match self {
            Tolerance::Disabled => None,
            Tolerance::Default => Some(DEFAULT_TOLERANCE_METERS),
            Tolerance::Meters(value) => Some(*value),
        }
    }
}

impl std::fmt::Display for Tolerance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tolerance::Disabled => write!(f, "disabled"),
            Tolerance::Default => write!(f, "default ({DEFAULT_TOLERANCE_METERS} m)"),
            Tolerance::Meters(value) => write!(f, "{value} m"),
        }
    }
}

/// Indices of the points kept by Douglas-Peucker reduction
///
/// The result is strictly increasing, starts at 0 and ends at `points.len() - 1`. Inputs with
/// fewer than three points, or a tolerance of zero, are returned whole.
pub fn simplify_indices(points: &[Point], tolerance: f64) -> Vec<usize> {
    let n = points.len();
    let Some(projection) = LocalProjection::for_points(points) else {
        return Vec::new();
    };
    if n < 3 || tolerance <= 0.0 {
        return (0..n).collect();
    }

    let coords: Vec<Coord<f64>> = points.iter().map(|p| projection.project_point(p)).collect();

    let mut keep = vec![false; n];
    keep[0] = true;
    keep[n - 1] = true;

    // Pending (start, end) spans; equivalent to recursing on both halves
    let mut spans = vec![(0, n - 1)];
    while let Some((start, end)) = spans.pop() {
        if end <= start + 1 {
            continue;
        }

        let (a, b) = (coords[start], coords[end]);
        let mut max_index = start;
        let mut max_distance = -1.0;
        for (i, &c) in coords.iter().enumerate().take(end).skip(start + 1) {
            let d = distance_to_line(c, a, b);
            if d > max_distance {
                max_distance = d;
                max_index = i;
            }
        }

        if max_distance > tolerance {
            keep[max_index] = true;
            spans.push((max_index, end));
            spans.push((start, max_index));
        }
    }

    keep.iter()
        .enumerate()
        .filter_map(|(i, &kept)| kept.then_some(i))
        .collect()
}

/// Simplified copy of a point sequence
pub fn simplify_points(points: &[Point], tolerance: f64) -> Vec<Point> {
    simplify_indices(points, tolerance)
        .into_iter()
        .map(|i| points[i].clone())
        .collect()
}

/// Simplify a segment in place, returning how many points were removed
pub fn simplify_segment(segment: &mut Segment, tolerance: f64) -> usize {
    let before = segment.points.len();
    let indices = simplify_indices(&segment.points, tolerance);
    if indices.len() == before {
        return 0;
    }

    let mut kept = indices.into_iter().peekable();
    let points = std::mem::take(&mut segment.points);
    segment.points = points
        .into_iter()
        .enumerate()
        .filter_map(|(i, p)| {
            if kept.peek() == Some(&i) {
                kept.next();
                Some(p)
            } else {
                None
            }
        })
        .collect();
    before - segment.points.len()
}

/// Simplify every segment of a document, returning how many points were removed
pub fn simplify_document(document: &mut Document, tolerance: Tolerance) -> usize {
    #[cfg(feature = "profiling")]
    profiling::scope!("simplify::simplify_document");

    let Some(meters) = tolerance.resolve() else {
        return 0;
    };
    tracing::debug!("Simplifying points with maximum distance: {tolerance}");

    let removed: usize = document
        .tracks
        .iter_mut()
        .flat_map(|t| t.segments.iter_mut())
        .map(|s| simplify_segment(s, meters))
        .sum();
    tracing::debug!("Simplification removed {removed} points");
    removed
}
