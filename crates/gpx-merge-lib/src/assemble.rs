//! Reconstruction of a single output document from flattened data

use crate::{Document, MergeData, Namespaces, Segment, Track};
use std::path::Path;

/// Build the output document
///
/// The namespace map is the union of `namespaces` in iteration order, later declarations
/// winning. Points and segments are wrapped in one synthesized track called `name`; tracks
/// pass through unchanged.
pub fn assemble<'a>(
    data: MergeData,
    name: &str,
    namespaces: impl IntoIterator<Item = &'a Namespaces>,
) -> Document {
    let mut merged_namespaces = Namespaces::new();
    for ns in namespaces {
        merged_namespaces.extend(ns);
    }

    let tracks = match data {
        MergeData::Tracks(tracks) => {
            tracing::debug!("Generating GPX with {} tracks", tracks.len());
            tracks
        }
        MergeData::Segments(segments) => {
            tracing::debug!("Generating GPX with {} segments", segments.len());
            vec![Track::new(Some(name.to_string()), segments)]
        }
        MergeData::Points(points) => {
            tracing::debug!("Generating GPX with {} points", points.len());
            vec![Track::new(Some(name.to_string()), vec![Segment::new(points)])]
        }
    };

    Document::new(merged_namespaces, tracks)
}

/// Track name for an output path: its file name without extension
pub fn track_name(target: &Path) -> String {
    target
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Point;

    fn namespaces(pairs: &[(&str, &str)]) -> Namespaces {
        let mut ns = Namespaces::new();
        for (prefix, uri) in pairs {
            ns.insert(*prefix, *uri);
        }
        ns
    }

    #[test]
    fn test_assemble_points() {
        let points = vec![Point::new(1.0, 2.0), Point::new(3.0, 4.0)];
        let doc = assemble(MergeData::Points(points.clone()), "merged", Vec::<&Namespaces>::new());

        assert_eq!(doc.tracks.len(), 1);
        assert_eq!(doc.tracks[0].name.as_deref(), Some("merged"));
        assert_eq!(doc.tracks[0].segments.len(), 1);
        assert_eq!(doc.tracks[0].segments[0].points, points);
    }

    #[test]
    fn test_assemble_segments() {
        let segments = vec![
            Segment::new(vec![Point::new(1.0, 2.0)]),
            Segment::new(vec![Point::new(3.0, 4.0)]),
        ];
        let doc = assemble(MergeData::Segments(segments.clone()), "ride", Vec::<&Namespaces>::new());

        assert_eq!(doc.tracks.len(), 1);
        assert_eq!(doc.tracks[0].name.as_deref(), Some("ride"));
        assert_eq!(doc.tracks[0].segments, segments);
    }

    #[test]
    fn test_assemble_tracks_pass_through() {
        let tracks = vec![
            Track::new(Some("a".to_string()), vec![]),
            Track::new(None, vec![Segment::default()]),
        ];
        let doc = assemble(MergeData::Tracks(tracks.clone()), "ignored", Vec::<&Namespaces>::new());
        assert_eq!(doc.tracks, tracks);
    }

    #[test]
    fn test_assemble_empty_inputs() {
        let doc = assemble(MergeData::Points(Vec::new()), "merged", Vec::<&Namespaces>::new());
        assert_eq!(doc.tracks.len(), 1);
        assert_eq!(doc.total_points(), 0);

        let doc = assemble(MergeData::Segments(Vec::new()), "merged", Vec::<&Namespaces>::new());
        assert_eq!(doc.tracks.len(), 1);
        assert_eq!(doc.total_segments(), 0);

        let doc = assemble(MergeData::Tracks(Vec::new()), "merged", Vec::<&Namespaces>::new());
        assert!(doc.tracks.is_empty());
    }

    #[test]
    fn test_assemble_unions_namespaces() {
        let first = namespaces(&[("gpxtpx", "http://tpx/v1"), ("xsi", "http://xsi")]);
        let second = namespaces(&[("gpxtpx", "http://tpx/v2"), ("gpxx", "http://gpxx")]);
        let doc = assemble(MergeData::Points(Vec::new()), "merged", [&first, &second]);

        assert_eq!(doc.namespaces.len(), 3);
        assert_eq!(doc.namespaces.get("gpxtpx"), Some("http://tpx/v2"));
        assert_eq!(doc.namespaces.get("xsi"), Some("http://xsi"));
    }

    #[test]
    fn test_track_name() {
        assert_eq!(track_name(Path::new("/tmp/out/holiday.gpx")), "holiday");
        assert_eq!(track_name(Path::new("merged.gpx")), "merged");
        assert_eq!(track_name(Path::new("archive.tar.gpx")), "archive.tar");
    }
}
