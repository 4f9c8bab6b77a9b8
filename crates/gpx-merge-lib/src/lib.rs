//! GPX Merge Library - Core Pipeline for Merging GPX Track Files
//!
//! This library loads any number of GPX files, flattens their contents at the requested
//! granularity, orders points chronologically, optionally simplifies the result and writes
//! a single well-formed GPX document back out.
//!
//! # Architecture
//!
//! - **[`Document`]**: In-memory GPX tree (tracks, segments, points, namespaces)
//! - **[`codec`]**: GPX/XML parsing and serialization
//! - **[`flatten`]**: Extraction of points, segments or tracks across documents
//! - **[`merge_chronological`]**: Stable time ordering of flattened points
//! - **[`simplify`]**: Douglas-Peucker reduction with a metric tolerance
//! - **[`assemble`]**: Reconstruction of a single output document
//! - **[`resolve_target`]**: Output path derivation
//! - **[`Merger`]**: High-level driver tying the pipeline to the filesystem
//!
//! # Pipeline
//!
//! ```text
//! files ─▶ codec::parse ─▶ flatten ─▶ merge_chronological ─▶ assemble ─▶ simplify ─▶ codec::write
//! ```

mod assemble;
mod chronology;
pub mod codec;
mod flatten;
mod merger;
mod model;
pub mod simplify;
mod target;
pub mod utils;

// Public API exports
pub use assemble::{assemble, track_name};
pub use chronology::merge_chronological;
pub use flatten::{Granularity, MergeData, flatten, flatten_points, flatten_segments, flatten_tracks};
pub use merger::{LoadReport, MergeConfig, MergeOutcome, Merger, load_documents};
pub use model::{Document, GPX_NAMESPACE, Namespaces, Point, Segment, Track};
pub use simplify::{DEFAULT_TOLERANCE_METERS, Tolerance};
pub use target::{GPX_EXTENSION, resolve_target};

use std::path::PathBuf;

/// Error types for the merge pipeline
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    #[error("XML parsing error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("XML attribute error: {0}")]
    XmlAttribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("Invalid GPX: {0}")]
    InvalidGpx(String),

    #[error("Input {path:?} unreadable: {source}")]
    InputUnreadable {
        path: PathBuf,
        #[source]
        source: Box<MergeError>,
    },

    #[error("Failed to write output {path:?}: {source}")]
    OutputWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("No input files given")]
    NoInputs,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MergeError>;
