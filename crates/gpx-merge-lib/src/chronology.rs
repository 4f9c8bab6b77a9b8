//! Chronological ordering of flattened track points

use crate::Point;

/// Keep only timestamped points and order them by time
///
/// The sort is stable: points sharing a timestamp stay in the order they were flattened in.
pub fn merge_chronological(points: Vec<Point>) -> Vec<Point> {
    #[cfg(feature = "profiling")]
    profiling::scope!("chronology::merge_chronological");

    let total = points.len();
    let mut timed: Vec<Point> = points.into_iter().filter(|p| p.time.is_some()).collect();
    timed.sort_by_key(|p| p.time);

    let dropped = total - timed.len();
    if dropped > 0 {
        tracing::debug!("Dropped {dropped} points without timestamp");
    }
    timed
}
