//! Per-item dynamic context slots.
//!
//! Filter parameters are declared once for the whole run but may reference
//! values that change for every appended file. The controller overwrites the
//! slots right before an item is streamed; filter stages expand `%{slot}`
//! placeholders against the context when they are opened for that item.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use regex::{Captures, Regex};

/// Slot holding the basename of the file currently being appended.
pub const CURRENT_FILE: &str = "current_file";

/// Slot holding the resolved path of the file currently being appended.
pub const CURRENT_FILE_PATH: &str = "current_file.path";

/// Named string slots read by filter-parameter expansion.
///
/// Slots are never cleared between runs: a caller that keeps the context
/// after a run observes the values of the last file appended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DynamicContext {
    slots: BTreeMap<String, String>,
}

impl DynamicContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of a slot, if it was ever set.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.slots.get(name).map(String::as_str)
    }

    /// Overwrite a slot.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.slots.insert(name.into(), value.into());
    }

    /// Point both current-file slots at `path`.
    pub fn set_current_file(&mut self, path: &Path) {
        let basename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.set(CURRENT_FILE, basename);
        self.set(CURRENT_FILE_PATH, path.to_string_lossy().into_owned());
    }

    /// Replace every `%{slot}` in `expr` with the slot's current value.
    ///
    /// Placeholders naming an unset slot are kept verbatim.
    pub fn expand(&self, expr: &str) -> String {
        static SLOT_RE: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"%\{([^{}]+)\}").expect("valid regex"));

        SLOT_RE
            .replace_all(expr, |caps: &Captures<'_>| match self.get(&caps[1]) {
                Some(value) => value.to_string(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }
}
