//! Core domain types: content items and source declarations.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ContentItem
// ---------------------------------------------------------------------------

/// One unit of appendable content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentItem {
    /// Inline text. Written as-is, never filtered.
    Text { content: String },
    /// A single file. `base_dir` is set when the file came from a file-list
    /// or file-set, and absent for the explicitly configured file.
    File {
        path: PathBuf,
        base_dir: Option<PathBuf>,
    },
}

impl ContentItem {
    /// Build an item for a file discovered relative to `base_dir`.
    pub fn in_dir(base_dir: &Path, relative: &Path) -> Self {
        Self::File {
            path: base_dir.join(relative),
            base_dir: Some(base_dir.to_path_buf()),
        }
    }

    /// Build an item for an explicitly configured file.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File {
            path: path.into(),
            base_dir: None,
        }
    }

    /// Build an inline text item.
    pub fn text(content: impl Into<String>) -> Self {
        Self::Text {
            content: content.into(),
        }
    }

    /// The file path, if this item is backed by a file.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Text { .. } => None,
            Self::File { path, .. } => Some(path),
        }
    }

    /// Human-readable identity used in logs and failure reports.
    pub fn label(&self) -> String {
        match self {
            Self::Text { .. } => "<inline text>".to_string(),
            Self::File { path, .. } => path.display().to_string(),
        }
    }

    /// Open the unfiltered byte stream behind this item.
    pub fn open_raw(&self) -> std::io::Result<Box<dyn Read>> {
        match self {
            Self::Text { content } => Ok(Box::new(Cursor::new(content.clone().into_bytes()))),
            Self::File { path, .. } => Ok(Box::new(File::open(path)?)),
        }
    }
}

// ---------------------------------------------------------------------------
// Source declarations
// ---------------------------------------------------------------------------

/// A list of files named explicitly, relative to `dir`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileListSpec {
    /// Base directory the names are relative to.
    #[serde(default)]
    pub dir: Option<PathBuf>,
    /// Inline file names, appended in this order.
    #[serde(default)]
    pub files: Vec<String>,
    /// A file holding one name per line; read after `files`.
    #[serde(default)]
    pub listfile: Option<PathBuf>,
}

/// A directory scan filtered by include/exclude globs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileSetSpec {
    /// Directory to scan.
    #[serde(default)]
    pub dir: Option<PathBuf>,
    /// Glob patterns to include. Empty means every file.
    #[serde(default)]
    pub includes: Vec<String>,
    /// Glob patterns to exclude; they win over `includes`.
    #[serde(default)]
    pub excludes: Vec<String>,
    /// Skip VCS metadata and editor backup files.
    #[serde(default = "default_true")]
    pub default_excludes: bool,
    /// Descend into symlinked directories.
    #[serde(default)]
    pub follow_symlinks: bool,
}

impl Default for FileSetSpec {
    fn default() -> Self {
        Self {
            dir: None,
            includes: Vec::new(),
            excludes: Vec::new(),
            default_excludes: true,
            follow_symlinks: false,
        }
    }
}

fn default_true() -> bool {
    true
}

/// One named filter stage with unexpanded parameter expressions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterStageSpec {
    /// Registered stage name, e.g. `prefix_lines`.
    pub name: String,
    /// Parameter name → expression; may contain `%{slot}` placeholders.
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

impl FilterStageSpec {
    /// Convenience constructor used by the CLI and tests.
    pub fn new<I, K, V>(name: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            name: name.into(),
            params: params
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// An ordered group of filter stages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterChainSpec {
    #[serde(default, rename = "filter")]
    pub filters: Vec<FilterStageSpec>,
}

/// Every content source configured on a task.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceSpec {
    pub file: Option<PathBuf>,
    pub filelists: Vec<FileListSpec>,
    pub filesets: Vec<FileSetSpec>,
    pub text: Option<String>,
}

impl SourceSpec {
    /// Whether any file-bearing source is configured.
    pub fn has_file_sources(&self) -> bool {
        self.file.is_some() || !self.filelists.is_empty() || !self.filesets.is_empty()
    }
}
