//! Source validation and resolution into an ordered item sequence.
//!
//! Order is fixed: inline text alone, or else the explicit file, then every
//! file-list in declaration order, then every file-set in declaration order.
//! Within a group, files keep the order the scanning engine returned.

use std::path::{Path, PathBuf};

use appendix_scan::{ScanEngine, ScannedGroup};
use appendix_shared::{AppendixError, ContentItem, Result, SourceSpec};
use serde::Serialize;
use tracing::debug;

/// Which kind of declaration a group came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Text,
    File,
    FileList,
    FileSet,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Text => "text",
            Self::File => "file",
            Self::FileList => "filelist",
            Self::FileSet => "fileset",
        };
        f.write_str(name)
    }
}

/// Items contributed by one declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceGroup {
    pub kind: SourceKind,
    /// Base directory of a file-list or file-set, when known.
    pub base_dir: Option<PathBuf>,
    pub items: Vec<ContentItem>,
    /// Set when the group could not be scanned; `items` is then empty.
    pub scan_error: Option<String>,
}

impl SourceGroup {
    fn single(kind: SourceKind, item: ContentItem) -> Self {
        Self {
            kind,
            base_dir: None,
            items: vec![item],
            scan_error: None,
        }
    }

    fn scanned(kind: SourceKind, outcome: Result<ScannedGroup>, hint: Option<&Path>) -> Self {
        match outcome {
            Ok(group) => {
                let items = group
                    .files
                    .iter()
                    .map(|relative| ContentItem::in_dir(&group.base_dir, relative))
                    .collect();
                Self {
                    kind,
                    base_dir: Some(group.base_dir),
                    items,
                    scan_error: None,
                }
            }
            Err(e) => Self {
                kind,
                base_dir: hint.map(Path::to_path_buf),
                items: Vec::new(),
                scan_error: Some(e.to_string()),
            },
        }
    }
}

/// All groups of a task, in append order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedSources {
    pub groups: Vec<SourceGroup>,
}

impl ResolvedSources {
    /// The flattened item sequence.
    pub fn items(&self) -> impl Iterator<Item = &ContentItem> {
        self.groups.iter().flat_map(|g| g.items.iter())
    }

    pub fn item_count(&self) -> usize {
        self.items().count()
    }
}

/// Check the destination and source rules; returns the destination path.
///
/// Inline text combined with file-sets is accepted: only the explicit file
/// and file-lists conflict with text.
pub fn validate(destination: Option<&Path>, spec: &SourceSpec) -> Result<PathBuf> {
    let Some(destination) = destination else {
        return Err(AppendixError::config("you must specify the 'destfile' attribute"));
    };
    validate_sources(spec)?;
    Ok(destination.to_path_buf())
}

/// Source completeness and mutual-exclusion rules.
pub fn validate_sources(spec: &SourceSpec) -> Result<()> {
    if spec.text.is_none() && !spec.has_file_sources() {
        return Err(AppendixError::config(
            "you must specify a file, use a filelist or fileset, or specify a text value",
        ));
    }

    if spec.text.is_some() && (spec.file.is_some() || !spec.filelists.is_empty()) {
        return Err(AppendixError::config(
            "cannot use text in conjunction with file or filelists",
        ));
    }

    Ok(())
}

/// Resolve every configured source into ordered groups.
///
/// Rule violations are config errors. Scan failures are not: the failing
/// group is kept with its error and no items.
pub fn resolve(spec: &SourceSpec, scanner: &dyn ScanEngine) -> Result<ResolvedSources> {
    validate_sources(spec)?;

    if let Some(text) = &spec.text {
        return Ok(ResolvedSources {
            groups: vec![SourceGroup::single(SourceKind::Text, ContentItem::text(text.clone()))],
        });
    }

    let mut groups = Vec::with_capacity(1 + spec.filelists.len() + spec.filesets.len());

    if let Some(file) = &spec.file {
        groups.push(SourceGroup::single(SourceKind::File, ContentItem::file(file.clone())));
    }

    for list in &spec.filelists {
        groups.push(SourceGroup::scanned(
            SourceKind::FileList,
            scanner.list_files(list),
            list.dir.as_deref(),
        ));
    }

    for set in &spec.filesets {
        groups.push(SourceGroup::scanned(
            SourceKind::FileSet,
            scanner.scan_files(set),
            set.dir.as_deref(),
        ));
    }

    let resolved = ResolvedSources { groups };
    debug!(
        groups = resolved.groups.len(),
        items = resolved.item_count(),
        "sources resolved"
    );
    Ok(resolved)
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;

    use appendix_shared::{FileListSpec, FileSetSpec};

    use super::*;

    /// Scanner double keyed by the group's `dir`; unknown dirs fail to scan.
    #[derive(Default)]
    pub(crate) struct FakeScanner {
        pub(crate) groups: HashMap<PathBuf, Vec<&'static str>>,
    }

    impl FakeScanner {
        pub(crate) fn with(mut self, dir: &str, files: &[&'static str]) -> Self {
            self.groups.insert(PathBuf::from(dir), files.to_vec());
            self
        }

        fn lookup(&self, dir: Option<&PathBuf>) -> Result<ScannedGroup> {
            let dir = dir.ok_or_else(|| AppendixError::scan("no directory"))?;
            let files = self
                .groups
                .get(dir)
                .ok_or_else(|| AppendixError::scan(format!("{} does not exist", dir.display())))?;
            Ok(ScannedGroup {
                base_dir: dir.clone(),
                files: files.iter().map(PathBuf::from).collect(),
            })
        }
    }

    impl ScanEngine for FakeScanner {
        fn list_files(&self, spec: &FileListSpec) -> Result<ScannedGroup> {
            self.lookup(spec.dir.as_ref())
        }

        fn scan_files(&self, spec: &FileSetSpec) -> Result<ScannedGroup> {
            self.lookup(spec.dir.as_ref())
        }
    }

    fn list(dir: &str) -> FileListSpec {
        FileListSpec {
            dir: Some(dir.into()),
            files: vec!["ignored-by-fake".into()],
            listfile: None,
        }
    }

    fn set(dir: &str) -> FileSetSpec {
        FileSetSpec {
            dir: Some(dir.into()),
            ..Default::default()
        }
    }

    fn paths(resolved: &ResolvedSources) -> Vec<String> {
        resolved
            .items()
            .map(|item| item.path().unwrap().display().to_string())
            .collect()
    }

    #[test]
    fn text_alone_is_single_text_item() {
        let spec = SourceSpec {
            text: Some("And another thing\n".into()),
            ..Default::default()
        };
        let resolved = resolve(&spec, &FakeScanner::default()).unwrap();
        let items: Vec<_> = resolved.items().cloned().collect();
        assert_eq!(items, vec![ContentItem::text("And another thing\n")]);
    }

    #[test]
    fn file_then_lists_then_sets() {
        let scanner = FakeScanner::default()
            .with("l1", &["b", "a"])
            .with("l2", &["c"])
            .with("s1", &["z", "y"])
            .with("s2", &["x"]);
        let spec = SourceSpec {
            file: Some("header".into()),
            filelists: vec![list("l1"), list("l2")],
            filesets: vec![set("s1"), set("s2")],
            text: None,
        };

        let resolved = resolve(&spec, &scanner).unwrap();
        assert_eq!(
            paths(&resolved),
            vec!["header", "l1/b", "l1/a", "l2/c", "s1/z", "s1/y", "s2/x"]
        );

        let kinds: Vec<_> = resolved.groups.iter().map(|g| g.kind).collect();
        assert_eq!(
            kinds,
            vec![
                SourceKind::File,
                SourceKind::FileList,
                SourceKind::FileList,
                SourceKind::FileSet,
                SourceKind::FileSet,
            ]
        );
        assert_eq!(resolved.groups[0].items[0], ContentItem::file("header"));
        assert_eq!(resolved.groups[1].base_dir, Some(PathBuf::from("l1")));
    }

    #[test]
    fn failing_group_contributes_nothing() {
        let scanner = FakeScanner::default().with("ok1", &["a"]).with("ok2", &["b"]);
        let spec = SourceSpec {
            filelists: vec![list("ok1"), list("broken")],
            filesets: vec![set("ok2")],
            ..Default::default()
        };

        let resolved = resolve(&spec, &scanner).unwrap();
        assert_eq!(paths(&resolved), vec!["ok1/a", "ok2/b"]);

        let failed: Vec<_> = resolved
            .groups
            .iter()
            .filter(|g| g.scan_error.is_some())
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].base_dir, Some(PathBuf::from("broken")));
        assert!(failed[0].scan_error.as_deref().unwrap().contains("broken"));
    }

    #[test]
    fn validate_requires_destination() {
        let spec = SourceSpec {
            text: Some("x".into()),
            ..Default::default()
        };
        let err = validate(None, &spec).unwrap_err();
        assert!(err.to_string().contains("destfile"));
    }

    #[test]
    fn validate_requires_a_source() {
        let err = validate(Some(Path::new("out")), &SourceSpec::default()).unwrap_err();
        assert!(matches!(err, AppendixError::Config { .. }));
    }

    #[test]
    fn validate_text_exclusions() {
        let with_file = SourceSpec {
            text: Some("x".into()),
            file: Some("a".into()),
            ..Default::default()
        };
        assert!(validate(Some(Path::new("out")), &with_file).is_err());

        let with_list = SourceSpec {
            text: Some("x".into()),
            filelists: vec![list("l")],
            ..Default::default()
        };
        assert!(validate(Some(Path::new("out")), &with_list).is_err());

        // Text with a fileset passes validation and the fileset is ignored.
        let with_set = SourceSpec {
            text: Some("x".into()),
            filesets: vec![set("s")],
            ..Default::default()
        };
        assert_eq!(
            validate(Some(Path::new("out")), &with_set).unwrap(),
            PathBuf::from("out")
        );
        let resolved = resolve(&with_set, &FakeScanner::default().with("s", &["f"])).unwrap();
        assert_eq!(resolved.item_count(), 1);
        assert_eq!(resolved.groups[0].kind, SourceKind::Text);
    }

    #[test]
    fn resolve_rejects_text_with_file() {
        let spec = SourceSpec {
            text: Some("x".into()),
            file: Some("a".into()),
            ..Default::default()
        };
        let err = resolve(&spec, &FakeScanner::default()).unwrap_err();
        assert!(err.to_string().contains("cannot use text"));
    }

    #[test]
    fn empty_text_is_still_a_source() {
        let spec = SourceSpec {
            text: Some(String::new()),
            ..Default::default()
        };
        assert!(validate(Some(Path::new("out")), &spec).is_ok());
    }
}
