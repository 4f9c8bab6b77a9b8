//! Flattening of loaded documents at a chosen granularity
//!
//! The granularity is always carried explicitly as a [`Granularity`] tag and the flattened
//! result as a [`MergeData`] variant, so downstream stages never guess from the data shape.

use crate::{Document, MergeError, Point, Result, Segment, Track, merge_chronological};

/// Level at which input documents are flattened and merged
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Granularity {
    /// Merge all points into one segment, ordered by time
    #[default]
    Points,
    /// Concatenate segments into one track, in document order
    Segments,
    /// Concatenate whole tracks, in document order
    Tracks,
}

impl Granularity {
    /// Granularity selected by the `-s` (segments) and `-t` (tracks) switches
    ///
    /// Both switches together are rejected instead of silently preferring one.
    pub fn from_flags(segments: bool, tracks: bool) -> Result<Self> {
        match (segments, tracks) {
            (true, true) => Err(MergeError::InvalidArguments(
                "segment and track merging are mutually exclusive".to_string(),
            )),
            (true, false) => Ok(Granularity::Segments),
            (false, true) => Ok(Granularity::Tracks),
            (false, false) => Ok(Granularity::Points),
        }
    }
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Granularity::Points => "points",
            Granularity::Segments => "segments",
            Granularity::Tracks => "tracks",
        };
        f.write_str(name)
    }
}

/// Flattened merge input, tagged with its granularity
#[derive(Clone, Debug, PartialEq)]
pub enum MergeData {
    Points(Vec<Point>),
    Segments(Vec<Segment>),
    Tracks(Vec<Track>),
}

impl MergeData {
    pub fn granularity(&self) -> Granularity {
        match self {
            MergeData::Points(_) => Granularity::Points,
            MergeData::Segments(_) => Granularity::Segments,
            MergeData::Tracks(_) => Granularity::Tracks,
        }
    }

    /// Number of top-level elements (points, segments or tracks)
    pub fn len(&self) -> usize {
        match self {
            MergeData::Points(points) => points.len(),
            MergeData::Segments(segments) => segments.len(),
            MergeData::Tracks(tracks) => tracks.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// All tracks of all documents, in input order
pub fn flatten_tracks(documents: Vec<Document>) -> Vec<Track> {
    let tracks: Vec<Track> = documents.into_iter().flat_map(|d| d.tracks).collect();
    tracing::debug!("Loaded a total of {} tracks", tracks.len());
    tracks
}

/// All segments of all tracks of all documents, in input order
pub fn flatten_segments(documents: Vec<Document>) -> Vec<Segment> {
    let segments: Vec<Segment> = flatten_tracks(documents)
        .into_iter()
        .flat_map(|t| t.segments)
        .collect();
    tracing::debug!("Loaded a total of {} segments", segments.len());
    segments
}

/// All points of all segments of all documents, in input order
pub fn flatten_points(documents: Vec<Document>) -> Vec<Point> {
    let points: Vec<Point> = flatten_segments(documents)
        .into_iter()
        .flat_map(|s| s.points)
        .collect();
    tracing::debug!("Loaded a total of {} points", points.len());
    points
}

/// Flatten documents at the given granularity
///
/// Point granularity additionally applies [`merge_chronological`]; segments and tracks keep
/// document order.
pub fn flatten(documents: Vec<Document>, granularity: Granularity) -> MergeData {
    #[cfg(feature = "profiling")]
    profiling::scope!("flatten::flatten");

    match granularity {
        Granularity::Points => MergeData::Points(merge_chronological(flatten_points(documents))),
        Granularity::Segments => MergeData::Segments(flatten_segments(documents)),
        Granularity::Tracks => MergeData::Tracks(flatten_tracks(documents)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Namespaces;
    use chrono::{TimeZone, Utc};

    fn point(lat: f64, second: Option<u32>) -> Point {
        let p = Point::new(lat, 0.0);
        match second {
            Some(s) => p.with_time(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, s).unwrap()),
            None => p,
        }
    }

    fn create_test_documents() -> Vec<Document> {
        let first = Document::new(
            Namespaces::new(),
            vec![
                Track::new(
                    Some("a".to_string()),
                    vec![
                        Segment::new(vec![point(1.0, Some(40)), point(2.0, None)]),
                        Segment::new(vec![point(3.0, Some(10))]),
                    ],
                ),
                Track::new(Some("b".to_string()), vec![Segment::new(vec![point(4.0, Some(30))])]),
            ],
        );
        let second = Document::new(
            Namespaces::new(),
            vec![Track::new(
                Some("c".to_string()),
                vec![Segment::new(vec![point(5.0, Some(20))])],
            )],
        );
        vec![first, second]
    }

    #[test]
    fn test_flatten_tracks_order() {
        let tracks = flatten_tracks(create_test_documents());
        let names: Vec<_> = tracks.iter().map(|t| t.name.clone().unwrap()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_flatten_segments_order() {
        let segments = flatten_segments(create_test_documents());
        let sizes: Vec<usize> = segments.iter().map(Segment::len).collect();
        assert_eq!(sizes, vec![2, 1, 1, 1]);
        assert_eq!(segments[3].points[0].latitude, 5.0);
    }

    #[test]
    fn test_flatten_points_keeps_document_order() {
        let points = flatten_points(create_test_documents());
        let lats: Vec<f64> = points.iter().map(|p| p.latitude).collect();
        assert_eq!(lats, vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_flatten_points_granularity_is_chronological() {
        let data = flatten(create_test_documents(), Granularity::Points);
        assert_eq!(data.granularity(), Granularity::Points);

        let MergeData::Points(points) = data else {
            panic!("expected points");
        };
        let lats: Vec<f64> = points.iter().map(|p| p.latitude).collect();
        assert_eq!(lats, vec![3.0, 5.0, 4.0, 1.0]);
    }

    #[test]
    fn test_flatten_segments_granularity_keeps_timeless_points() {
        let data = flatten(create_test_documents(), Granularity::Segments);
        let MergeData::Segments(segments) = data else {
            panic!("expected segments");
        };
        assert!(segments[0].points[1].time.is_none());
    }

    #[test]
    fn test_flatten_empty_input() {
        for granularity in [Granularity::Points, Granularity::Segments, Granularity::Tracks] {
            let data = flatten(Vec::new(), granularity);
            assert!(data.is_empty());
            assert_eq!(data.granularity(), granularity);
        }
    }

    #[test]
    fn test_granularity_from_flags() {
        assert_eq!(Granularity::from_flags(false, false).unwrap(), Granularity::Points);
        assert_eq!(Granularity::from_flags(true, false).unwrap(), Granularity::Segments);
        assert_eq!(Granularity::from_flags(false, true).unwrap(), Granularity::Tracks);
        assert!(matches!(
            Granularity::from_flags(true, true),
            Err(MergeError::InvalidArguments(_))
        ));
    }

    #[test]
    fn test_granularity_display() {
        assert_eq!(Granularity::default().to_string(), "points");
        assert_eq!(Granularity::Tracks.to_string(), "tracks");
    }
}
