//! Directory scanning.
//!
//! Relative paths are reported the way a browser directory picker reports
//! them: they start with the selected directory's own name, so a run stored
//! at `<dir>/<title>/<timestamp>/model.ckpt.meta` becomes
//! `"<dirname>/<title>/<timestamp>/model.ckpt.meta"`.

use std::fs;
use std::io::BufRead;
use std::path::{Component, Path, PathBuf};

use modelsift_engine::{FileDescriptor, ModelRecord};
use walkdir::WalkDir;

use crate::error::ScanError;

/// Epoch counter the checkpoint writer keeps next to the marker file when
/// the marker name does not end in `.meta`.
pub const DEFAULT_EPOCH_FILENAME: &str = "model.ckpt.epoch";

/// Files found under one selected directory.
#[derive(Debug, Clone)]
pub struct ScanResult {
    /// Directory that relative paths are resolved against (the parent of the
    /// selected directory).
    pub base: PathBuf,
    pub files: Vec<FileDescriptor>,
}

/// Walk `root` recursively, sorted by file name so results are stable
/// across platforms. Unreadable entries are skipped with a warning.
pub fn scan_directory(root: &Path) -> Result<ScanResult, ScanError> {
    if !root.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }
    let root = root.canonicalize().map_err(|e| ScanError::io(root, e))?;
    let root_name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let base = root.parent().map(Path::to_path_buf).unwrap_or_else(|| root.clone());

    let mut files = Vec::new();
    for entry in WalkDir::new(&root).follow_links(false).sort_by_file_name() {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                log::warn!("skipping unreadable entry: {e}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(&root) else {
            continue;
        };
        let rel = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        files.push(FileDescriptor::from_relative_path(format!("{root_name}/{rel}")));
    }

    log::debug!("scanned {}: {} files", root.display(), files.len());
    Ok(ScanResult { base, files })
}

/// Read one path per line, e.g. the output of
/// `find models -name model.ckpt.meta`, relative to `base`.
///
/// Blank lines are skipped, `.` segments are dropped and backslashes are
/// treated as separators. Absolute lines are made relative to `base`; a line
/// outside `base` or one with a `..` segment is an error.
pub fn read_path_list<R: BufRead>(reader: R, base: &Path) -> Result<Vec<FileDescriptor>, ScanError> {
    let mut files = Vec::new();
    for line in reader.lines() {
        let line = line.map_err(|e| ScanError::io("<path list>", e))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let normalized = line.replace('\\', "/");
        let relative = relative_to_base(&normalized, base)?;
        if relative.is_empty() {
            continue;
        }
        files.push(FileDescriptor::from_relative_path(relative));
    }
    Ok(files)
}

fn relative_to_base(line: &str, base: &Path) -> Result<String, ScanError> {
    let outside = || ScanError::OutsideBase {
        line: line.to_string(),
        base: base.to_path_buf(),
    };
    let path = Path::new(line);
    let relative = if path.is_absolute() {
        strip_base(path, base).ok_or_else(outside)?
    } else {
        path.to_path_buf()
    };

    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(segment) => segments.push(segment.to_string_lossy().into_owned()),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(outside())
            }
        }
    }
    Ok(segments.join("/"))
}

/// `path` below `base`, retried on canonical forms so symlinked temp or
/// home directories still match.
fn strip_base(path: &Path, base: &Path) -> Option<PathBuf> {
    if let Ok(rel) = path.strip_prefix(base) {
        return Some(rel.to_path_buf());
    }
    let path = path.canonicalize().ok()?;
    let base = base.canonicalize().ok()?;
    path.strip_prefix(&base).ok().map(Path::to_path_buf)
}

/// Sibling epoch file for a marker: `model.ckpt.meta` → `model.ckpt.epoch`.
pub fn epoch_filename_for(marker_filename: &str) -> String {
    match marker_filename.strip_suffix(".meta") {
        Some(stem) => format!("{stem}.epoch"),
        None => DEFAULT_EPOCH_FILENAME.to_string(),
    }
}

/// Next epoch recorded for a run, if the writer left a readable counter.
pub fn read_epoch(base: &Path, record: &ModelRecord, marker_filename: &str) -> Option<u64> {
    let marker = base.join(record.path());
    let path = marker.parent()?.join(epoch_filename_for(marker_filename));
    let contents = fs::read_to_string(&path).ok()?;
    match contents.trim().parse() {
        Ok(epoch) => Some(epoch),
        Err(_) => {
            log::warn!("ignoring malformed epoch file {}", path.display());
            None
        }
    }
}
