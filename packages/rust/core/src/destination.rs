//! Append-mode destination writer.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use appendix_shared::{AppendixError, Result};
use tracing::{debug, warn};

/// Where appended chunks go. Implemented by [`Destination`]; tests substitute
/// sinks that fail on demand.
pub trait AppendSink {
    /// Path reported in logs.
    fn path(&self) -> &Path;

    /// Write one chunk in full.
    fn append(&mut self, bytes: &[u8]) -> io::Result<()>;
}

/// The destination file, opened once in append mode.
///
/// Writes go straight to the file without buffering, so bytes of an item
/// that later fails are already on disk. [`close`](Self::close) may be called
/// more than once; dropping an open destination closes it.
#[derive(Debug)]
pub struct Destination {
    path: PathBuf,
    file: Option<File>,
}

impl Destination {
    /// Open `path` for appending, creating it if needed. Existing bytes are kept.
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| AppendixError::Open {
                path: path.to_path_buf(),
                source,
            })?;

        debug!(path = %path.display(), "destination opened");
        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
        })
    }

    /// Flush the file, sync it if it is a regular file, then release the handle.
    ///
    /// Devices, pipes and FIFOs cannot be synced; they are only flushed.
    pub fn close(&mut self) -> Result<()> {
        let Some(mut file) = self.file.take() else {
            return Ok(());
        };

        file.flush()
            .and_then(|()| file.metadata())
            .and_then(|meta| if meta.is_file() { file.sync_all() } else { Ok(()) })
            .map_err(|source| AppendixError::Close {
                path: self.path.clone(),
                source,
            })?;

        debug!(path = %self.path.display(), "destination closed");
        Ok(())
    }
}

impl AppendSink for Destination {
    fn path(&self) -> &Path {
        &self.path
    }

    fn append(&mut self, bytes: &[u8]) -> io::Result<()> {
        match self.file.as_mut() {
            Some(file) => file.write_all(bytes),
            None => Err(io::Error::other("destination is closed")),
        }
    }
}

impl Drop for Destination {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(error = %e, "failed to close destination on drop");
        }
    }
}
