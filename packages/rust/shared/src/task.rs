//! Append task definitions loaded from TOML.
//!
//! ```toml
//! destfile = "build/fullpage.html"
//! file = "header.html"
//!
//! [[filelist]]
//! dir = "book"
//! listfile = "book/guide.book"
//!
//! [[fileset]]
//! dir = "chapters"
//! includes = ["**/*.html"]
//!
//! [[filterchain]]
//! [[filterchain.filter]]
//! name = "prefix_lines"
//! params = { prefix = "%{current_file}: " }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppendixError, Result};
use crate::types::{FileListSpec, FileSetSpec, FilterChainSpec, SourceSpec};

/// A full append task: destination, content sources, and filters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppendTask {
    /// File to append to.
    #[serde(default)]
    pub destfile: Option<PathBuf>,

    /// Single file to append before any list or set.
    #[serde(default)]
    pub file: Option<PathBuf>,

    /// Literal text; cannot be combined with `file` or `filelist`.
    #[serde(default)]
    pub text: Option<String>,

    #[serde(default, rename = "filelist")]
    pub filelists: Vec<FileListSpec>,

    #[serde(default, rename = "fileset")]
    pub filesets: Vec<FileSetSpec>,

    #[serde(default, rename = "filterchain")]
    pub filterchains: Vec<FilterChainSpec>,
}

impl AppendTask {
    /// Snapshot of the content sources.
    pub fn sources(&self) -> SourceSpec {
        SourceSpec {
            file: self.file.clone(),
            filelists: self.filelists.clone(),
            filesets: self.filesets.clone(),
            text: self.text.clone(),
        }
    }

    /// Resolve every relative path in the task against `root`.
    pub fn rebase(&mut self, root: &Path) {
        let join = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = root.join(&*p);
            }
        };

        if let Some(p) = self.destfile.as_mut() {
            join(p);
        }
        if let Some(p) = self.file.as_mut() {
            join(p);
        }
        for list in &mut self.filelists {
            if let Some(p) = list.dir.as_mut() {
                join(p);
            }
            if let Some(p) = list.listfile.as_mut() {
                join(p);
            }
        }
        for set in &mut self.filesets {
            if let Some(p) = set.dir.as_mut() {
                join(p);
            }
        }
    }
}

/// Parse a task from TOML text without touching paths.
pub fn parse_task(content: &str) -> Result<AppendTask> {
    toml::from_str(content).map_err(|e| AppendixError::config(format!("invalid task: {e}")))
}

/// Load a task file and resolve its relative paths against the file's directory.
pub fn load_task(path: &Path) -> Result<AppendTask> {
    let content = std::fs::read_to_string(path).map_err(|e| AppendixError::io(path, e))?;

    let mut task = parse_task(&content).map_err(|e| match e {
        AppendixError::Config { message } => {
            AppendixError::config(format!("{}: {message}", path.display()))
        }
        other => other,
    })?;

    let root = path.parent().unwrap_or_else(|| Path::new("."));
    task.rebase(root);
    tracing::debug!(?path, "loaded append task");

    Ok(task)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_TASK: &str = r#"
destfile = "out/full.html"
file = "header.html"

[[filelist]]
dir = "book"
files = ["a.md", "b.md"]
listfile = "book/guide.book"

[[fileset]]
dir = "/abs/chapters"
includes = ["**/*.html"]
excludes = ["draft/**"]
default_excludes = false

[[filterchain]]
[[filterchain.filter]]
name = "prefix_lines"
params = { prefix = "%{current_file}: " }

[[filterchain.filter]]
name = "tab_to_spaces"
"#;

    #[test]
    fn parse_full_task() {
        let task = parse_task(FULL_TASK).expect("parse");
        assert_eq!(task.destfile, Some(PathBuf::from("out/full.html")));
        assert_eq!(task.filelists.len(), 1);
        assert_eq!(task.filelists[0].files, vec!["a.md", "b.md"]);
        assert_eq!(task.filesets[0].excludes, vec!["draft/**"]);
        assert!(!task.filesets[0].default_excludes);
        assert_eq!(task.filterchains[0].filters.len(), 2);
        assert_eq!(
            task.filterchains[0].filters[0].params["prefix"],
            "%{current_file}: "
        );
        assert!(task.filterchains[0].filters[1].params.is_empty());
    }

    #[test]
    fn text_task() {
        let task = parse_task("destfile = \"x.log\"\ntext = \"\"\"\nline one\nline two\n\"\"\"\n")
            .expect("parse");
        assert_eq!(task.text.as_deref(), Some("line one\nline two\n"));
        assert!(!task.sources().has_file_sources());
    }

    #[test]
    fn rebase_only_touches_relative_paths() {
        let mut task = parse_task(FULL_TASK).expect("parse");
        task.rebase(Path::new("/work"));

        assert_eq!(task.destfile, Some(PathBuf::from("/work/out/full.html")));
        assert_eq!(task.file, Some(PathBuf::from("/work/header.html")));
        assert_eq!(task.filelists[0].dir, Some(PathBuf::from("/work/book")));
        assert_eq!(
            task.filelists[0].listfile,
            Some(PathBuf::from("/work/book/guide.book"))
        );
        assert_eq!(task.filesets[0].dir, Some(PathBuf::from("/abs/chapters")));
    }

    #[test]
    fn load_task_from_disk() {
        let dir = std::env::temp_dir().join(format!("appendix-task-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("append.toml");
        std::fs::write(&path, "destfile = \"out.txt\"\nfile = \"in.txt\"\n").unwrap();

        let task = load_task(&path).unwrap();
        assert_eq!(task.destfile, Some(dir.join("out.txt")));
        assert_eq!(task.file, Some(dir.join("in.txt")));

        std::fs::write(&path, "destfile = \"out.txt\"\nfiel = \"in.txt\"\n").unwrap();
        let err = load_task(&path).unwrap_err().to_string();
        assert!(err.contains("append.toml"));
        assert!(err.contains("fiel"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn misspelled_keys_are_config_errors() {
        let cases = [
            "destfile = \"x\"\nfiles = \"a\"\n",
            "destfile = \"x\"\n[[fileset]]\ndir = \"src\"\nexclude = [\"*.bak\"]\n",
            "destfile = \"x\"\n[[filelist]]\ndir = \"d\"\nfile = [\"a\"]\n",
            "destfile = \"x\"\n[[filterchain]]\n[[filterchain.filter]]\nname = \"prefix_lines\"\nparam = { prefix = \"> \" }\n",
        ];
        for case in cases {
            let err = parse_task(case).unwrap_err();
            assert!(matches!(err, AppendixError::Config { .. }), "accepted: {case}");
        }
    }

    #[test]
    fn malformed_task_is_config_error() {
        let err = parse_task("destfile = 3").unwrap_err();
        assert!(matches!(err, AppendixError::Config { .. }));
    }
}
