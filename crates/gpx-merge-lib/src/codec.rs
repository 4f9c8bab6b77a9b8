//! GPX parsing and serialization
//!
//! Parsing is tolerant: only `trk`/`trkseg`/`trkpt` and the point children the merge cares
//! about are interpreted, everything else (waypoints, routes, metadata) is skipped. Elements
//! are matched by local name so prefixed GPX elements are accepted too.
//!
//! Serialization produces GPX 1.1 that [`parse`] reads back without loss for coordinates,
//! elevation and time.

use crate::{Document, GPX_NAMESPACE, MergeError, Namespaces, Point, Result, Segment, Track};
use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::io::{Read, Write};

/// Value of the `creator` attribute on written documents
pub const CREATOR: &str = "gpx-merger";

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Timestamp layouts accepted besides RFC 3339, interpreted as UTC
const NAIVE_TIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// ISO 8601 layouts with a numeric offset, colon optional (`+0100` or `+01:00`)
const OFFSET_TIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];

type XmlReader<'a> = Reader<&'a [u8]>;

/// Read a GPX document from any reader
///
/// The input is buffered completely before parsing.
pub fn read<R: Read>(mut reader: R) -> Result<Document> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    parse(&bytes)
}

/// Parse a GPX document from raw bytes
///
/// # Errors
/// - `MergeError::Xml` / `MergeError::XmlAttribute` for malformed XML
/// - `MergeError::InvalidGpx` when the root element is not `gpx`, a track point lacks valid
///   coordinates or the document ends prematurely
pub fn parse(bytes: &[u8]) -> Result<Document> {
    #[cfg(feature = "profiling")]
    profiling::scope!("codec::parse");

    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let mut reader = Reader::from_reader(bytes);
    reader.trim_text(true);

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"gpx" => {
                let namespaces = read_namespaces(&e)?;
                let tracks = read_tracks(&mut reader)?;
                return Ok(Document::new(namespaces, tracks));
            }
            Event::Empty(e) if e.local_name().as_ref() == b"gpx" => {
                return Ok(Document::new(read_namespaces(&e)?, Vec::new()));
            }
            Event::Start(e) | Event::Empty(e) => {
                return Err(MergeError::InvalidGpx(format!(
                    "unexpected root element <{}>",
                    String::from_utf8_lossy(e.name().as_ref())
                )));
            }
            Event::Eof => {
                return Err(MergeError::InvalidGpx(
                    "missing <gpx> root element".to_string(),
                ));
            }
            _ => {}
        }
    }
}

/// Collect the `xmlns:prefix` declarations of the root element
fn read_namespaces(root: &BytesStart) -> Result<Namespaces> {
    let mut namespaces = Namespaces::new();
    for attr in root.attributes() {
        let attr = attr?;
        if let Some(prefix) = attr.key.as_ref().strip_prefix(b"xmlns:") {
            let uri = attr.unescape_value()?;
            namespaces.insert(String::from_utf8_lossy(prefix), uri.into_owned());
        }
    }
    Ok(namespaces)
}

fn read_tracks(reader: &mut XmlReader) -> Result<Vec<Track>> {
    let mut tracks = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"trk" => tracks.push(read_track(reader)?),
                _ => skip_element(reader, &e)?,
            },
            Event::Empty(e) if e.local_name().as_ref() == b"trk" => tracks.push(Track::default()),
            Event::End(_) => return Ok(tracks),
            Event::Eof => return Err(unexpected_eof("gpx")),
            _ => {}
        }
    }
}

fn read_track(reader: &mut XmlReader) -> Result<Track> {
    let mut track = Track::default();
    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"name" => track.name = Some(read_text(reader, &e)?),
                b"trkseg" => track.segments.push(read_segment(reader)?),
                _ => skip_element(reader, &e)?,
            },
            Event::Empty(e) if e.local_name().as_ref() == b"trkseg" => {
                track.segments.push(Segment::default());
            }
            Event::End(_) => return Ok(track),
            Event::Eof => return Err(unexpected_eof("trk")),
            _ => {}
        }
    }
}

fn read_segment(reader: &mut XmlReader) -> Result<Segment> {
    let mut segment = Segment::default();
    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"trkpt" => segment.points.push(read_point(reader, &e)?),
                _ => skip_element(reader, &e)?,
            },
            Event::Empty(e) if e.local_name().as_ref() == b"trkpt" => {
                let (latitude, longitude) = read_coordinates(&e)?;
                segment.points.push(Point::new(latitude, longitude));
            }
            Event::End(_) => return Ok(segment),
            Event::Eof => return Err(unexpected_eof("trkseg")),
            _ => {}
        }
    }
}

fn read_point(reader: &mut XmlReader, start: &BytesStart) -> Result<Point> {
    let (latitude, longitude) = read_coordinates(start)?;
    let mut point = Point::new(latitude, longitude);
    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"ele" => point.elevation = parse_elevation(&read_text(reader, &e)?),
                b"time" => point.time = parse_time(&read_text(reader, &e)?),
                b"extensions" => {
                    let raw = reader.read_text(e.name())?;
                    let raw = raw.trim();
                    if !raw.is_empty() {
                        point.extensions = Some(raw.to_string());
                    }
                }
                _ => skip_element(reader, &e)?,
            },
            Event::End(_) => return Ok(point),
            Event::Eof => return Err(unexpected_eof("trkpt")),
            _ => {}
        }
    }
}

fn read_coordinates(start: &BytesStart) -> Result<(f64, f64)> {
    let mut latitude = None;
    let mut longitude = None;
    for attr in start.attributes() {
        let attr = attr?;
        match attr.key.local_name().as_ref() {
            b"lat" => latitude = Some(parse_coordinate("lat", &attr.unescape_value()?)?),
            b"lon" => longitude = Some(parse_coordinate("lon", &attr.unescape_value()?)?),
            _ => {}
        }
    }

    match (latitude, longitude) {
        (Some(latitude), Some(longitude)) => Ok((latitude, longitude)),
        _ => Err(MergeError::InvalidGpx(
            "track point without lat/lon attributes".to_string(),
        )),
    }
}

fn parse_coordinate(name: &str, value: &str) -> Result<f64> {
    match value.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(MergeError::InvalidGpx(format!(
            "invalid {name} attribute {value:?}"
        ))),
    }
}

fn parse_elevation(text: &str) -> Option<f64> {
    match text.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => {
            tracing::warn!("Ignoring malformed elevation {text:?}");
            None
        }
    }
}

/// Parse a GPX timestamp, normalizing it to UTC
///
/// Returns `None` (and logs a warning) for values that are not a recognizable timestamp,
/// the point is then treated as timeless.
pub fn parse_time(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if let Ok(time) = DateTime::parse_from_rfc3339(text) {
        return Some(time.with_timezone(&Utc));
    }
    for format in OFFSET_TIME_FORMATS {
        if let Ok(time) = DateTime::parse_from_str(text, format) {
            return Some(time.with_timezone(&Utc));
        }
    }
    for format in NAIVE_TIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }
    tracing::warn!("Ignoring malformed timestamp {text:?}");
    None
}

/// Format a timestamp as ISO-8601 UTC, with sub-second digits only when present
pub fn format_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Text content of a simple element, unescaped and trimmed
fn read_text(reader: &mut XmlReader, start: &BytesStart) -> Result<String> {
    let raw = reader.read_text(start.name())?;
    let raw = raw.trim();
    if let Some(cdata) = raw
        .strip_prefix("<![CDATA[")
        .and_then(|s| s.strip_suffix("]]>"))
    {
        return Ok(cdata.to_string());
    }
    let text = quick_xml::escape::unescape(raw).map_err(quick_xml::Error::from)?;
    Ok(text.into_owned())
}

fn skip_element(reader: &mut XmlReader, start: &BytesStart) -> Result<()> {
    reader.read_to_end(start.name())?;
    Ok(())
}

fn unexpected_eof(element: &str) -> MergeError {
    MergeError::InvalidGpx(format!("document ended inside <{element}>"))
}

/// Serialize a document into an in-memory buffer
pub fn serialize(document: &Document) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    write(document, &mut buffer)?;
    Ok(buffer)
}

/// Write a document as indented GPX 1.1 XML
pub fn write<W: Write>(document: &Document, writer: W) -> Result<()> {
    #[cfg(feature = "profiling")]
    profiling::scope!("codec::write");

    let mut xml = Writer::new_with_indent(writer, b' ', 2);
    xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut root = BytesStart::new("gpx");
    root.push_attribute(("version", "1.1"));
    root.push_attribute(("creator", CREATOR));
    root.push_attribute(("xmlns", GPX_NAMESPACE));
    for (prefix, uri) in document.namespaces.iter() {
        let key = format!("xmlns:{prefix}");
        root.push_attribute((key.as_str(), uri));
    }
    xml.write_event(Event::Start(root))?;

    for track in &document.tracks {
        write_track(&mut xml, track)?;
    }

    xml.write_event(Event::End(BytesEnd::new("gpx")))?;
    Ok(())
}

fn write_track<W: Write>(xml: &mut Writer<W>, track: &Track) -> Result<()> {
    xml.write_event(Event::Start(BytesStart::new("trk")))?;
    if let Some(name) = &track.name {
        xml.create_element("name")
            .write_text_content(BytesText::new(name))?;
    }
    for segment in &track.segments {
        xml.write_event(Event::Start(BytesStart::new("trkseg")))?;
        for point in &segment.points {
            write_point(xml, point)?;
        }
        xml.write_event(Event::End(BytesEnd::new("trkseg")))?;
    }
    xml.write_event(Event::End(BytesEnd::new("trk")))?;
    Ok(())
}

fn write_point<W: Write>(xml: &mut Writer<W>, point: &Point) -> Result<()> {
    let latitude = point.latitude.to_string();
    let longitude = point.longitude.to_string();
    let mut start = BytesStart::new("trkpt");
    start.push_attribute(("lat", latitude.as_str()));
    start.push_attribute(("lon", longitude.as_str()));
    xml.write_event(Event::Start(start))?;

    // GPX schema order: ele, time, ..., extensions
    if let Some(elevation) = point.elevation {
        xml.create_element("ele")
            .write_text_content(BytesText::new(&elevation.to_string()))?;
    }
    if let Some(time) = &point.time {
        xml.create_element("time")
            .write_text_content(BytesText::new(&format_time(time)))?;
    }
    if let Some(extensions) = &point.extensions {
        xml.write_event(Event::Start(BytesStart::new("extensions")))?;
        xml.write_event(Event::Text(BytesText::from_escaped(extensions.as_str())))?;
        xml.write_event(Event::End(BytesEnd::new("extensions")))?;
    }

    xml.write_event(Event::End(BytesEnd::new("trkpt")))?;
    Ok(())
}
