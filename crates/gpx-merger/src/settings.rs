use clap::Parser;
use gpx_merge_lib::{MergeConfig, Result, Tolerance};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
/// GPX Merger - Merge many GPX files into one, by points, segments or tracks
pub struct Settings {
    /// GPX files to merge
    #[clap(value_name = "FILE")]
    pub input_files: Vec<PathBuf>,

    /// Output file, directory or name (defaults to merged.gpx next to the first input)
    #[clap(short = 'o', long, value_name = "TARGET")]
    pub output: Option<PathBuf>,

    /// Merge whole segments instead of points
    #[clap(short = 's', long)]
    pub segments: bool,

    /// Merge whole tracks instead of points
    #[clap(short = 't', long)]
    pub tracks: bool,

    /// Simplify the merged segments, optionally with a tolerance in meters (default 10)
    #[clap(short = 'd', long = "simplify", value_name = "METERS", num_args = 0..=1)]
    pub simplify: Option<Option<f64>>,

    /// Also write plain logs to this file
    #[clap(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

impl Settings {
    /// Merge configuration described by these settings
    ///
    /// Fails with `MergeError::InvalidArguments` on conflicting granularity switches or a
    /// negative tolerance.
    pub fn merge_config(&self) -> Result<MergeConfig> {
        MergeConfig::new(
            self.segments,
            self.tracks,
            Tolerance::from_flag(self.simplify)?,
            self.output.clone(),
        )
    }
}
