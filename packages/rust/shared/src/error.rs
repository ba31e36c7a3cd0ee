//! Error types for Appendix.
//!
//! Library crates use [`AppendixError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all Appendix operations.
#[derive(Debug, thiserror::Error)]
pub enum AppendixError {
    /// Task or user configuration is invalid. Always fatal, raised before the
    /// destination is touched.
    #[error("config error: {message}")]
    Config { message: String },

    /// The destination could not be opened in append mode.
    #[error("cannot open destination {path:?}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Flushing or closing the destination failed.
    #[error("cannot close destination {path:?}: {source}")]
    Close {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Reading, filtering, or writing one item failed. Recoverable.
    #[error("unable to append contents of {item}: {source}")]
    ItemRead {
        item: String,
        source: std::io::Error,
    },

    /// A file-list or file-set could not be resolved. Recoverable per group.
    #[error("scan error: {message}")]
    Scan { message: String },

    /// A filter stage rejected its parameters.
    #[error("filter error: {message}")]
    Filter { message: String },

    /// Filesystem I/O error outside the streaming loop.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, AppendixError>;

impl AppendixError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a scan error from any displayable message.
    pub fn scan(msg: impl Into<String>) -> Self {
        Self::Scan {
            message: msg.into(),
        }
    }

    /// Create a filter error from any displayable message.
    pub fn filter(msg: impl Into<String>) -> Self {
        Self::Filter {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Wrap a streaming failure with the identity of the item being appended.
    pub fn item_read(item: impl Into<String>, source: std::io::Error) -> Self {
        Self::ItemRead {
            item: item.into(),
            source,
        }
    }

    /// Whether the controller may log this error and move on to the next item.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ItemRead { .. } | Self::Scan { .. } | Self::Filter { .. }
        )
    }
}
