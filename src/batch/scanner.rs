//! Input enumeration
//!
//! Expands a mixed list of file and directory paths into a deterministic,
//! sorted list of candidate audio files. Missing paths are collected, not
//! fatal; every one of them still appears in the final report.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Extensions accepted as input (case-insensitive match)
const SUPPORTED_EXTENSIONS: [&str; 4] = ["wav", "mp3", "flac", "ogg"];

/// Result of input enumeration
#[derive(Debug, Default)]
pub struct Scan {
    /// Candidate audio files, sorted
    pub files: Vec<PathBuf>,
    /// Input paths that do not exist
    pub missing: Vec<PathBuf>,
}

/// True if the path carries a supported audio extension
pub fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let lower = e.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.contains(&lower.as_str())
        })
        .unwrap_or(false)
}

/// Expand input paths into candidate audio files
///
/// Directories are walked to depth 1, or fully when `recursive` is set.
/// Files listed explicitly are still subject to the extension filter.
/// The result is sorted and deduplicated for run-to-run determinism.
pub fn scan_inputs(paths: &[PathBuf], recursive: bool) -> Scan {
    let mut scan = Scan::default();

    for path in paths {
        if !path.exists() {
            log::warn!("input path does not exist: {}", path.display());
            scan.missing.push(path.clone());
            continue;
        }

        if path.is_file() {
            if is_supported(path) {
                scan.files.push(path.clone());
            } else {
                log::warn!("skipping unsupported file: {}", path.display());
            }
            continue;
        }

        let max_depth = if recursive { usize::MAX } else { 1 };
        for entry in WalkDir::new(path)
            .max_depth(max_depth)
            .follow_links(false)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if entry.file_type().is_file() && is_supported(entry.path()) {
                scan.files.push(entry.path().to_path_buf());
            }
        }
    }

    scan.files.sort();
    scan.files.dedup();

    log::info!(
        "enumerated {} audio files ({} missing inputs)",
        scan.files.len(),
        scan.missing.len()
    );

    scan
}
