//! In-memory GPX document model
//!
//! A [`Document`] owns its tracks, tracks own their segments and segments own their points.
//! Only the parts of GPX the merge pipeline works with are modelled; point extensions are
//! carried through as raw XML.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Default namespace of GPX 1.1 documents, always declared on output
pub const GPX_NAMESPACE: &str = "http://www.topografix.com/GPX/1/1";

/// A single geographic sample of a track
#[derive(Clone, Debug, PartialEq)]
pub struct Point {
    /// Latitude in degrees (WGS84)
    pub latitude: f64,
    /// Longitude in degrees (WGS84)
    pub longitude: f64,
    /// Elevation in meters
    pub elevation: Option<f64>,
    /// Recording time, normalized to UTC
    pub time: Option<DateTime<Utc>>,
    /// Raw inner XML of the point's `<extensions>` element
    pub extensions: Option<String>,
}

impl Point {
    /// Create a point with only coordinates set
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            elevation: None,
            time: None,
            extensions: None,
        }
    }

    pub fn with_elevation(mut self, elevation: f64) -> Self {
        self.elevation = Some(elevation);
        self
    }

    pub fn with_time(mut self, time: DateTime<Utc>) -> Self {
        self.time = Some(time);
        self
    }

    pub fn with_extensions(mut self, extensions: impl Into<String>) -> Self {
        self.extensions = Some(extensions.into());
        self
    }
}

/// A contiguous run of points in path order
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Segment {
    pub points: Vec<Point>,
}

impl Segment {
    pub fn new(points: Vec<Point>) -> Self {
        Self { points }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// A named, ordered collection of segments
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Track {
    pub name: Option<String>,
    pub segments: Vec<Segment>,
}

impl Track {
    pub fn new(name: Option<String>, segments: Vec<Segment>) -> Self {
        Self { name, segments }
    }

    /// Total number of points across all segments
    pub fn total_points(&self) -> usize {
        self.segments.iter().map(Segment::len).sum()
    }
}

/// Prefixed namespace declarations (`xmlns:prefix="uri"`) of a GPX root element
///
/// Iteration order is sorted by prefix so serialized output is deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Namespaces(BTreeMap<String, String>);

impl Namespaces {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a prefix, replacing any previous URI bound to it
    pub fn insert(&mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Option<String> {
        self.0.insert(prefix.into(), uri.into())
    }

    pub fn get(&self, prefix: &str) -> Option<&str> {
        self.0.get(prefix).map(String::as_str)
    }

    /// Union with another map; declarations from `other` win on conflicts
    pub fn extend(&mut self, other: &Namespaces) {
        for (prefix, uri) in &other.0 {
            if let Some(previous) = self.0.insert(prefix.clone(), uri.clone()) {
                if &previous != uri {
                    tracing::debug!("Namespace prefix {prefix} rebound from {previous} to {uri}");
                }
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(p, u)| (p.as_str(), u.as_str()))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A parsed or assembled GPX document
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Document {
    pub namespaces: Namespaces,
    pub tracks: Vec<Track>,
}

impl Document {
    pub fn new(namespaces: Namespaces, tracks: Vec<Track>) -> Self {
        Self { namespaces, tracks }
    }

    /// Total number of segments across all tracks
    pub fn total_segments(&self) -> usize {
        self.tracks.iter().map(|t| t.segments.len()).sum()
    }

    /// Total number of points across all tracks and segments
    pub fn total_points(&self) -> usize {
        self.tracks.iter().map(Track::total_points).sum()
    }

    /// Iterate over every point in document order
    pub fn points(&self) -> impl Iterator<Item = &Point> {
        self.tracks
            .iter()
            .flat_map(|t| t.segments.iter())
            .flat_map(|s| s.points.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_document() -> Document {
        let first = Segment::new(vec![Point::new(51.5, -0.12), Point::new(51.6, -0.13)]);
        let second = Segment::new(vec![Point::new(40.4, -3.7)]);
        Document::new(
            Namespaces::new(),
            vec![
                Track::new(Some("a".to_string()), vec![first, second]),
                Track::new(None, vec![Segment::default()]),
            ],
        )
    }

    #[test]
    fn test_document_counts() {
        let doc = create_test_document();
        assert_eq!(doc.tracks.len(), 2);
        assert_eq!(doc.total_segments(), 3);
        assert_eq!(doc.total_points(), 3);
        assert_eq!(doc.tracks[0].total_points(), 3);
    }

    #[test]
    fn test_points_in_document_order() {
        let doc = create_test_document();
        let lats: Vec<f64> = doc.points().map(|p| p.latitude).collect();
        assert_eq!(lats, vec![51.5, 51.6, 40.4]);
    }

    #[test]
    fn test_namespaces_extend_later_wins() {
        let mut base = Namespaces::new();
        base.insert("gpxtpx", "http://old");
        base.insert("xsi", "http://www.w3.org/2001/XMLSchema-instance");

        let mut other = Namespaces::new();
        other.insert("gpxtpx", "http://new");
        other.insert("ns3", "http://ns3");

        base.extend(&other);
        assert_eq!(base.len(), 3);
        assert_eq!(base.get("gpxtpx"), Some("http://new"));
        assert_eq!(base.get("ns3"), Some("http://ns3"));
    }

    #[test]
    fn test_namespaces_iterate_sorted() {
        let mut ns = Namespaces::new();
        ns.insert("z", "http://z");
        ns.insert("a", "http://a");
        let prefixes: Vec<&str> = ns.iter().map(|(p, _)| p).collect();
        assert_eq!(prefixes, vec!["a", "z"]);
    }

    #[test]
    fn test_point_builders() {
        let point = Point::new(1.0, 2.0)
            .with_elevation(3.0)
            .with_extensions("<hr>120</hr>");
        assert_eq!(point.elevation, Some(3.0));
        assert_eq!(point.extensions.as_deref(), Some("<hr>120</hr>"));
        assert!(point.time.is_none());
    }
}
