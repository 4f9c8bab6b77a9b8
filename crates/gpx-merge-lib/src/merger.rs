//! Merger - Top-level driver for loading, merging and writing GPX files
//!
//! This module provides the high-level API: load many GPX files in parallel, run the merge
//! pipeline according to a [`MergeConfig`], and write the result to disk atomically.

use crate::simplify::simplify_document;
use crate::{
    Document, Granularity, MergeError, Namespaces, Result, Tolerance, assemble, codec, flatten,
    resolve_target, track_name,
};

use rayon::prelude::*;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Configuration for a merge run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeConfig {
    /// Level at which inputs are merged
    pub granularity: Granularity,
    /// Douglas-Peucker tolerance applied to the output segments
    pub tolerance: Tolerance,
    /// Requested output file, directory or bare name
    pub target: Option<PathBuf>,
}

impl MergeConfig {
    /// Configuration from the segment/track switches, rejecting both at once
    pub fn new(
        segments: bool,
        tracks: bool,
        tolerance: Tolerance,
        target: Option<PathBuf>,
    ) -> Result<Self> {
        Ok(Self {
            granularity: Granularity::from_flags(segments, tracks)?,
            tolerance,
            target,
        })
    }
}

/// Result of loading a set of input files
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Successfully parsed documents, in input order
    pub documents: Vec<Document>,
    /// Paths of the successfully parsed documents
    pub loaded: Vec<PathBuf>,
    /// One `MergeError::InputUnreadable` per skipped input
    pub skipped: Vec<MergeError>,
}

/// Summary of a completed merge run
#[derive(Debug)]
pub struct MergeOutcome {
    /// Path the merged document was written to
    pub target: PathBuf,
    /// Inputs that contributed to the output
    pub loaded: Vec<PathBuf>,
    /// Inputs that were skipped, as `MergeError::InputUnreadable`
    pub skipped: Vec<MergeError>,
    /// Number of tracks in the written document
    pub tracks: usize,
    /// Number of segments in the written document
    pub segments: usize,
    /// Number of points in the written document
    pub points: usize,
    /// Number of points removed by simplification
    pub simplified_away: usize,
}

/// Load GPX files in parallel
///
/// Unreadable or unparseable files are skipped and recorded in [`LoadReport::skipped`];
/// the order of the loaded documents follows the order of `paths`.
pub fn load_documents<P: AsRef<Path> + Sync>(paths: &[P]) -> LoadReport {
    #[cfg(feature = "profiling")]
    profiling::scope!("merger::load_documents");

    let results: Vec<(PathBuf, Result<Document>)> = paths
        .par_iter()
        .map(|path| {
            let path = path.as_ref();
            (path.to_path_buf(), load_document(path))
        })
        .collect();

    let mut report = LoadReport::default();
    for (path, result) in results {
        match result {
            Ok(document) => {
                tracing::debug!("Loaded {}", path.display());
                report.documents.push(document);
                report.loaded.push(path);
            }
            Err(source) => {
                tracing::warn!("Skipping {}: {source}", path.display());
                report.skipped.push(MergeError::InputUnreadable {
                    path,
                    source: Box::new(source),
                });
            }
        }
    }

    tracing::debug!("Loaded a total of {} files", report.documents.len());
    report
}

fn load_document(path: &Path) -> Result<Document> {
    let bytes = std::fs::read(path)?;
    codec::parse(&bytes)
}

/// Runs the merge pipeline for one configuration
#[derive(Debug, Clone, Default)]
pub struct Merger {
    config: MergeConfig,
}

#[cfg_attr(feature = "profiling", profiling::all_functions)]
impl Merger {
    pub fn new(config: MergeConfig) -> Self {
        Self { config }
    }

    #[inline]
    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// Merge already loaded documents into one output document named `name`
    ///
    /// Flattens at the configured granularity, assembles and finally simplifies every
    /// output segment.
    pub fn merge(&self, documents: Vec<Document>, name: &str) -> Document {
        self.merge_counting(documents, name).0
    }

    fn merge_counting(&self, documents: Vec<Document>, name: &str) -> (Document, usize) {
        let namespaces: Vec<Namespaces> = documents.iter().map(|d| d.namespaces.clone()).collect();
        let data = flatten(documents, self.config.granularity);
        let mut document = assemble(data, name, &namespaces);
        let removed = simplify_document(&mut document, self.config.tolerance);
        (document, removed)
    }

    /// Load `inputs`, merge them and write the result to the resolved target
    ///
    /// Per-file failures are skipped and reported in the outcome. Fails with
    /// `MergeError::NoInputs` when `inputs` is empty and `MergeError::OutputWrite` when the
    /// target cannot be written; in that case no partial file is left behind.
    pub fn run<P: AsRef<Path> + Sync>(&self, inputs: &[P]) -> Result<MergeOutcome> {
        tracing::info!("Start new merge process ({} granularity)", self.config.granularity);
        if inputs.is_empty() {
            return Err(MergeError::NoInputs);
        }

        let report = load_documents(inputs);
        if report.documents.is_empty() {
            tracing::warn!("None of the {} input files could be loaded", inputs.len());
        }

        let target = resolve_target(inputs, self.config.target.as_deref())?;
        let name = track_name(&target);

        let (document, simplified_away) = self.merge_counting(report.documents, &name);

        let bytes = codec::serialize(&document)?;
        tracing::debug!("Saving {}", target.display());
        write_atomically(&target, &bytes)?;
        tracing::debug!("Done saving");

        let outcome = MergeOutcome {
            target,
            loaded: report.loaded,
            skipped: report.skipped,
            tracks: document.tracks.len(),
            segments: document.total_segments(),
            points: document.total_points(),
            simplified_away,
        };
        tracing::info!(
            "Finish: {} points in {} tracks written to {}",
            outcome.points,
            outcome.tracks,
            outcome.target.display()
        );
        Ok(outcome)
    }
}

/// Write `bytes` to `target` through a temporary file in the same directory
fn write_atomically(target: &Path, bytes: &[u8]) -> Result<()> {
    let output_error = |source: std::io::Error| MergeError::OutputWrite {
        path: target.to_path_buf(),
        source,
    };

    let directory = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = tempfile::NamedTempFile::new_in(directory).map_err(output_error)?;
    file.write_all(bytes).map_err(output_error)?;
    file.flush().map_err(output_error)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o644))
            .map_err(output_error)?;
    }

    file.persist(target).map_err(|e| output_error(e.error))?;
    Ok(())
}
