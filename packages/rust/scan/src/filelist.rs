//! Explicit file lists: inline names plus an optional list file.

use std::path::PathBuf;

use appendix_shared::{AppendixError, FileListSpec, Result};
use tracing::{debug, instrument};

use crate::ScannedGroup;

/// Resolve a file-list into its base directory and ordered names.
///
/// Names are not checked for existence; a missing file fails later, when the
/// pipeline tries to append it.
#[instrument(skip_all, fields(dir = ?spec.dir))]
pub(crate) fn resolve(spec: &FileListSpec) -> Result<ScannedGroup> {
    let Some(dir) = spec.dir.clone() else {
        return Err(AppendixError::scan("no directory specified for filelist"));
    };

    if spec.files.is_empty() && spec.listfile.is_none() {
        return Err(AppendixError::scan(format!(
            "filelist at {} names no files: set `files` or `listfile`",
            dir.display()
        )));
    }

    let mut files: Vec<PathBuf> = spec
        .files
        .iter()
        .flat_map(|entry| split_names(entry))
        .map(PathBuf::from)
        .collect();

    if let Some(listfile) = &spec.listfile {
        let content = std::fs::read_to_string(listfile).map_err(|e| {
            AppendixError::scan(format!("cannot read listfile {}: {e}", listfile.display()))
        })?;
        files.extend(parse_listfile(&content).map(PathBuf::from));
    }

    debug!(count = files.len(), "resolved filelist");
    Ok(ScannedGroup {
        base_dir: dir,
        files,
    })
}

/// An inline entry may hold several comma-separated names. Names may contain
/// spaces; only the whitespace around each name is dropped.
fn split_names(entry: &str) -> impl Iterator<Item = &str> {
    entry.split(',').map(str::trim).filter(|name| !name.is_empty())
}

/// One name per line; surrounding whitespace and blank lines are ignored.
fn parse_listfile(content: &str) -> impl Iterator<Item = &str> {
    content.lines().map(str::trim).filter(|line| !line.is_empty())
}
