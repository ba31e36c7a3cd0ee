//! Directory scans filtered by include/exclude globs.
//!
//! Patterns use gitignore glob syntax: a pattern without a `/` matches at any
//! depth (`*.md`), `**` spans directories (`docs/**/*.md`). Excludes always win
//! over includes; an excluded directory is not descended into.

use std::path::{Path, PathBuf};

use appendix_shared::{AppendixError, FileSetSpec, Result};
use ignore::WalkBuilder;
use ignore::overrides::{Override, OverrideBuilder};
use tracing::{debug, instrument, trace};

use crate::ScannedGroup;

/// Patterns skipped when `default_excludes` is on.
pub const DEFAULT_EXCLUDES: &[&str] = &[
    ".git", ".svn", ".hg", ".bzr", "CVS", "_darcs", ".DS_Store", "._*", "*~", ".#*",
];

/// Scan a file-set and return the included regular files relative to its directory.
///
/// Order is depth-first, with the entries of every directory sorted by name,
/// so repeated scans of the same tree always agree.
#[instrument(skip_all, fields(dir = ?spec.dir))]
pub(crate) fn scan(spec: &FileSetSpec) -> Result<ScannedGroup> {
    let Some(dir) = spec.dir.clone() else {
        return Err(AppendixError::scan("no directory specified for fileset"));
    };

    if !dir.is_dir() {
        return Err(AppendixError::scan(format!(
            "fileset directory {} does not exist",
            dir.display()
        )));
    }

    let overrides = build_overrides(&dir, spec)?;

    let mut walker = WalkBuilder::new(&dir);
    walker
        .standard_filters(false)
        .follow_links(spec.follow_symlinks)
        .overrides(overrides)
        .sort_by_file_name(|a, b| a.cmp(b));

    let mut files = Vec::new();
    for entry in walker.build() {
        let entry = entry.map_err(|e| {
            AppendixError::scan(format!("error scanning {}: {e}", dir.display()))
        })?;

        if !is_regular_file(&entry) {
            continue;
        }

        let relative = relative_to(entry.path(), &dir)?;
        trace!(file = %relative.display(), "included");
        files.push(relative);
    }

    debug!(count = files.len(), "scanned fileset");
    Ok(ScannedGroup {
        base_dir: dir,
        files,
    })
}

/// Compile includes as whitelist globs and excludes as ignore globs.
///
/// Later globs take precedence, so excludes are added last.
fn build_overrides(dir: &Path, spec: &FileSetSpec) -> Result<Override> {
    let mut builder = OverrideBuilder::new(dir);

    let mut excludes: Vec<&str> = spec.excludes.iter().map(String::as_str).collect();
    if spec.default_excludes {
        excludes.extend_from_slice(DEFAULT_EXCLUDES);
    }

    for pattern in &spec.includes {
        builder
            .add(pattern)
            .map_err(|e| AppendixError::scan(format!("invalid include pattern '{pattern}': {e}")))?;
    }
    for pattern in excludes {
        builder
            .add(&format!("!{pattern}"))
            .map_err(|e| AppendixError::scan(format!("invalid exclude pattern '{pattern}': {e}")))?;
    }

    builder
        .build()
        .map_err(|e| AppendixError::scan(format!("invalid fileset patterns: {e}")))
}

/// Regular files, including symlinks that resolve to one.
///
/// Without `follow_symlinks` the walker reports links by their own type, so
/// the target is checked separately.
fn is_regular_file(entry: &ignore::DirEntry) -> bool {
    if entry.file_type().is_some_and(|ft| ft.is_file()) {
        return true;
    }
    entry.path_is_symlink()
        && std::fs::metadata(entry.path()).is_ok_and(|meta| meta.is_file())
}

fn relative_to(path: &Path, dir: &Path) -> Result<PathBuf> {
    path.strip_prefix(dir).map(Path::to_path_buf).map_err(|_| {
        AppendixError::scan(format!(
            "scanned path {} escapes {}",
            path.display(),
            dir.display()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_tree(files: &[&str]) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("appendix-fileset-test-{}", uuid::Uuid::now_v7()));
        for file in files {
            let path = dir.join(file);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, file.as_bytes()).unwrap();
        }
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn names(group: &ScannedGroup) -> Vec<String> {
        group
            .files
            .iter()
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .collect()
    }

    #[test]
    fn scans_everything_sorted_by_default() {
        let tmp = temp_tree(&["b.txt", "a.txt", "sub/c.txt", "sub/a.txt"]);
        let spec = FileSetSpec {
            dir: Some(tmp.clone()),
            ..Default::default()
        };

        let group = scan(&spec).unwrap();
        assert_eq!(group.base_dir, tmp);
        assert_eq!(names(&group), vec!["a.txt", "b.txt", "sub/a.txt", "sub/c.txt"]);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn includes_and_excludes() {
        let tmp = temp_tree(&[
            "index.md",
            "notes.txt",
            "guide/setup.md",
            "guide/draft/wip.md",
        ]);
        let spec = FileSetSpec {
            dir: Some(tmp.clone()),
            includes: vec!["*.md".into()],
            excludes: vec!["draft".into()],
            ..Default::default()
        };

        let group = scan(&spec).unwrap();
        assert_eq!(names(&group), vec!["guide/setup.md", "index.md"]);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn default_excludes_skip_vcs_and_backups() {
        let tmp = temp_tree(&["a.txt", "a.txt~", ".git/config", ".svn/entries"]);

        let spec = FileSetSpec {
            dir: Some(tmp.clone()),
            ..Default::default()
        };
        assert_eq!(names(&scan(&spec).unwrap()), vec!["a.txt"]);

        let spec = FileSetSpec {
            dir: Some(tmp.clone()),
            default_excludes: false,
            ..Default::default()
        };
        assert_eq!(scan(&spec).unwrap().files.len(), 4);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_files_are_included() {
        let tmp = temp_tree(&["real.txt", "set/a.txt", "set/sub/b.txt"]);
        std::os::unix::fs::symlink(tmp.join("real.txt"), tmp.join("set/link.txt")).unwrap();
        std::os::unix::fs::symlink(tmp.join("set/sub"), tmp.join("set/linked-dir")).unwrap();
        std::os::unix::fs::symlink(tmp.join("gone.txt"), tmp.join("set/dangling.txt")).unwrap();

        let spec = FileSetSpec {
            dir: Some(tmp.join("set")),
            ..Default::default()
        };
        // Dangling links are skipped; linked directories are only entered
        // with follow_symlinks.
        assert_eq!(
            names(&scan(&spec).unwrap()),
            vec!["a.txt", "link.txt", "sub/b.txt"]
        );

        std::fs::remove_file(tmp.join("set/dangling.txt")).unwrap();
        let spec = FileSetSpec {
            follow_symlinks: true,
            ..spec
        };
        assert_eq!(
            names(&scan(&spec).unwrap()),
            vec!["a.txt", "link.txt", "linked-dir/b.txt", "sub/b.txt"]
        );

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn missing_directory_is_scan_error() {
        let spec = FileSetSpec {
            dir: Some("/no/such/fileset/dir".into()),
            ..Default::default()
        };
        let err = scan(&spec).unwrap_err();
        assert!(matches!(err, AppendixError::Scan { .. }));
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn missing_dir_attribute_is_scan_error() {
        let err = scan(&FileSetSpec::default()).unwrap_err();
        assert!(err.to_string().contains("no directory"));
    }

    #[test]
    fn invalid_pattern_is_scan_error() {
        let tmp = temp_tree(&["a.txt"]);
        let spec = FileSetSpec {
            dir: Some(tmp.clone()),
            includes: vec!["a[".into()],
            ..Default::default()
        };
        assert!(scan(&spec).is_err());

        let _ = std::fs::remove_dir_all(&tmp);
    }
}
