//! Output path resolution

use crate::{MergeError, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Extension carried by every output file
pub const GPX_EXTENSION: &str = ".gpx";

/// File name used when the target names no file of its own
const DEFAULT_FILE_NAME: &str = "merged";

/// Derive the output path from the inputs and an optional requested target
///
/// - an existing file is used as is;
/// - an existing directory receives `merged.gpx`;
/// - any other value is a name (or path) relative to the directory of the first input;
/// - no target at all means `merged.gpx` next to the first input.
///
/// The result always ends in `.gpx`. The suffix check ignores letter case, so `TRACK.GPX`
/// is kept as is rather than becoming `TRACK.GPX.gpx`. Fails with `MergeError::NoInputs`
/// when the first input's directory is needed but there are no inputs.
pub fn resolve_target<P: AsRef<Path>>(inputs: &[P], requested: Option<&Path>) -> Result<PathBuf> {
    let requested = requested.filter(|p| !p.as_os_str().is_empty());

    let target = match requested {
        Some(path) if path.is_file() => path.to_path_buf(),
        Some(path) if path.is_dir() => path.join(DEFAULT_FILE_NAME),
        requested => {
            let first = inputs.first().ok_or(MergeError::NoInputs)?;
            let directory = first.as_ref().parent().unwrap_or_else(|| Path::new(""));
            directory.join(requested.unwrap_or_else(|| Path::new(DEFAULT_FILE_NAME)))
        }
    };

    let target = with_gpx_extension(target);
    tracing::debug!("Write result to: {}", target.display());
    Ok(target)
}

/// Append `.gpx` unless the path already ends with it (in any letter case)
fn with_gpx_extension(path: PathBuf) -> PathBuf {
    let has_extension = path
        .to_str()
        .map(|s| s.to_ascii_lowercase().ends_with(GPX_EXTENSION))
        .unwrap_or_else(|| path.extension().is_some_and(|e| e.eq_ignore_ascii_case("gpx")));
    if has_extension {
        return path;
    }

    let mut name: OsString = path.into_os_string();
    name.push(GPX_EXTENSION);
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("ride.gpx");
        std::fs::write(&input, "<gpx/>").unwrap();
        (dir, input)
    }

    #[test]
    fn test_default_target_next_to_first_input() {
        let (dir, input) = setup();
        let target = resolve_target(&[input], None).unwrap();
        assert_eq!(target, dir.path().join("merged.gpx"));
    }

    #[test]
    fn test_existing_directory_target() {
        let (_dir, input) = setup();
        let out = tempfile::tempdir().unwrap();
        let target = resolve_target(&[input], Some(out.path())).unwrap();
        assert_eq!(target, out.path().join("merged.gpx"));
    }

    #[test]
    fn test_existing_file_target() {
        let (dir, input) = setup();
        let existing = dir.path().join("existing.gpx");
        std::fs::write(&existing, "").unwrap();
        let target = resolve_target(&[input], Some(&existing)).unwrap();
        assert_eq!(target, existing);
    }

    #[test]
    fn test_existing_file_without_extension_gets_one() {
        let (dir, input) = setup();
        let existing = dir.path().join("existing");
        std::fs::write(&existing, "").unwrap();
        let target = resolve_target(&[input], Some(&existing)).unwrap();
        assert_eq!(target, dir.path().join("existing.gpx"));
    }

    #[test]
    fn test_bare_name_relative_to_first_input() {
        let (dir, input) = setup();
        let target = resolve_target(&[input.clone()], Some(Path::new("holiday"))).unwrap();
        assert_eq!(target, dir.path().join("holiday.gpx"));

        let target = resolve_target(&[input], Some(Path::new("holiday.gpx"))).unwrap();
        assert_eq!(target, dir.path().join("holiday.gpx"));
    }

    #[test]
    fn test_absolute_new_path_kept() {
        let (_dir, input) = setup();
        let out = tempfile::tempdir().unwrap();
        let requested = out.path().join("new-file");
        let target = resolve_target(&[input], Some(&requested)).unwrap();
        assert_eq!(target, out.path().join("new-file.gpx"));
    }

    #[test]
    fn test_extension_not_doubled() {
        let (_dir, input) = setup();
        let once = resolve_target(&[input.clone()], None).unwrap();
        let twice = resolve_target(&[input], Some(&once)).unwrap();
        assert_eq!(once, twice);
        assert!(!twice.to_string_lossy().ends_with(".gpx.gpx"));

        assert_eq!(
            with_gpx_extension(PathBuf::from("TRACK.GPX")),
            PathBuf::from("TRACK.GPX")
        );
    }

    #[test]
    fn test_uppercase_extension_kept() {
        let (dir, input) = setup();
        let target = resolve_target(&[input], Some(Path::new("TRACK.GPX"))).unwrap();
        assert_eq!(target, dir.path().join("TRACK.GPX"));
    }

    #[test]
    fn test_input_without_directory() {
        let target = resolve_target(&["ride.gpx"], None).unwrap();
        assert_eq!(target, PathBuf::from("merged.gpx"));
    }

    #[test]
    fn test_empty_target_treated_as_unset() {
        let (dir, input) = setup();
        let target = resolve_target(&[input], Some(Path::new(""))).unwrap();
        assert_eq!(target, dir.path().join("merged.gpx"));
    }

    #[test]
    fn test_no_inputs() {
        let none: [&Path; 0] = [];
        assert!(matches!(resolve_target(&none, None), Err(MergeError::NoInputs)));

        let out = tempfile::tempdir().unwrap();
        let target = resolve_target(&none, Some(out.path())).unwrap();
        assert_eq!(target, out.path().join("merged.gpx"));
    }
}
