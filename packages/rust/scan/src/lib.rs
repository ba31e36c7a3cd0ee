//! File-list and file-set resolution.
//!
//! The append pipeline does not walk the filesystem itself; it asks a
//! [`ScanEngine`] for the ordered files of each declared group. [`FsScanner`]
//! is the filesystem-backed engine used by the CLI.

mod filelist;
mod fileset;

use std::path::PathBuf;

use appendix_shared::{FileListSpec, FileSetSpec, Result};

pub use fileset::DEFAULT_EXCLUDES;

/// Files produced by one file-list or file-set, relative to `base_dir`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScannedGroup {
    /// Directory the relative names are resolved against.
    pub base_dir: PathBuf,
    /// Relative file names, in the order the group yields them.
    pub files: Vec<PathBuf>,
}

/// Resolves group declarations into concrete, ordered file names.
///
/// A returned error is a per-group failure: the caller logs it and treats the
/// group as contributing zero files.
pub trait ScanEngine {
    /// Files named by a file-list, in declaration order.
    fn list_files(&self, spec: &FileListSpec) -> Result<ScannedGroup>;

    /// Files included by a file-set scan, in scan order.
    fn scan_files(&self, spec: &FileSetSpec) -> Result<ScannedGroup>;
}

/// [`ScanEngine`] backed by the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsScanner;

impl FsScanner {
    pub fn new() -> Self {
        Self
    }
}

impl ScanEngine for FsScanner {
    fn list_files(&self, spec: &FileListSpec) -> Result<ScannedGroup> {
        filelist::resolve(spec)
    }

    fn scan_files(&self, spec: &FileSetSpec) -> Result<ScannedGroup> {
        fileset::scan(spec)
    }
}
