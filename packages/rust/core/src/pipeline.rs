//! End-to-end append run: validate → resolve → open → stream items → close.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use appendix_filters::{FilterChain, FilterRegistry};
use appendix_scan::ScanEngine;
use appendix_shared::{
    AppendTask, AppendixError, ContentItem, DEFAULT_CHUNK_SIZE, DynamicContext, Result,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::destination::{AppendSink, Destination};
use crate::reader::{ChainedReader, Chunk};
use crate::source::{self, ResolvedSources, SourceGroup, SourceKind};

/// Why an item or group was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// A file-list or file-set could not be scanned.
    Scan,
    /// An item could not be read, filtered, or written.
    Item,
}

/// A recoverable failure recorded during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    pub kind: FailureKind,
    /// Item path, or the group's base directory for scan failures.
    pub item: String,
    pub message: String,
}

/// Result of a completed append run.
#[derive(Debug, Clone, Serialize)]
pub struct AppendReport {
    pub destination: PathBuf,
    pub started_at: DateTime<Utc>,
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
    /// Items streamed to completion.
    pub items_appended: usize,
    /// Bytes written, including partial output of failed items.
    pub bytes_written: u64,
    pub failures: Vec<ItemFailure>,
}

fn serialize_millis<S: serde::Serializer>(
    d: &Duration,
    s: S,
) -> std::result::Result<S::Ok, S::Error> {
    s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

impl AppendReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Progress callback for reporting run status.
pub trait ProgressReporter: Send + Sync {
    /// Called before the items of a non-empty file-list or file-set.
    fn group_started(&self, kind: SourceKind, count: usize, base_dir: Option<&Path>);
    /// Called after an item was appended in full.
    fn item_appended(&self, item: &ContentItem, bytes: u64);
    /// Called for every recoverable failure.
    fn item_failed(&self, failure: &ItemFailure);
    /// Called when the run completes.
    fn done(&self, report: &AppendReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn group_started(&self, _kind: SourceKind, _count: usize, _base_dir: Option<&Path>) {}
    fn item_appended(&self, _item: &ContentItem, _bytes: u64) {}
    fn item_failed(&self, _failure: &ItemFailure) {}
    fn done(&self, _report: &AppendReport) {}
}

/// Counters accumulated while streaming.
#[derive(Debug, Default)]
struct Tally {
    items_appended: usize,
    bytes_written: u64,
    failures: Vec<ItemFailure>,
}

/// Runs append tasks against a scanning engine and a filter registry.
pub struct AppendPipeline<'a> {
    scanner: &'a dyn ScanEngine,
    registry: &'a FilterRegistry,
    progress: &'a dyn ProgressReporter,
    chunk_size: usize,
}

impl<'a> AppendPipeline<'a> {
    pub fn new(scanner: &'a dyn ScanEngine, registry: &'a FilterRegistry) -> Self {
        Self {
            scanner,
            registry,
            progress: &SilentProgress,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn with_progress(mut self, progress: &'a dyn ProgressReporter) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Run one append task.
    ///
    /// Configuration problems fail before the destination is opened. Once
    /// open, per-item and per-group failures are logged and recorded in the
    /// report while the run continues. An item error that is not recoverable
    /// ends the run. The destination is closed on every path out of
    /// streaming. `ctx` keeps the values of the last file appended.
    #[instrument(skip_all, fields(destfile = ?task.destfile))]
    pub fn run(&self, task: &AppendTask, ctx: &mut DynamicContext) -> Result<AppendReport> {
        let start = Instant::now();
        let started_at = Utc::now();
        let sources = task.sources();

        let destination = source::validate(task.destfile.as_deref(), &sources)?;
        if self.chunk_size == 0 {
            return Err(AppendixError::config("chunk size must be greater than 0"));
        }
        let chain = FilterChain::build(&task.filterchains, self.registry)?;
        let resolved = source::resolve(&sources, self.scanner)?;

        debug!(
            items = resolved.item_count(),
            stages = chain.len(),
            filters = ?chain.names(),
            "streaming to {}",
            destination.display()
        );
        let mut dest = Destination::open(&destination)?;
        let streamed = self.stream(&resolved, &chain, ctx, &mut dest);
        let closed = dest.close();
        let tally = streamed?;
        closed?;

        let report = AppendReport {
            destination,
            started_at,
            elapsed: start.elapsed(),
            items_appended: tally.items_appended,
            bytes_written: tally.bytes_written,
            failures: tally.failures,
        };

        info!(
            items = report.items_appended,
            bytes = report.bytes_written,
            failures = report.failures.len(),
            "append complete"
        );
        self.progress.done(&report);

        Ok(report)
    }

    /// Stream every group into `sink`, isolating failures per item.
    ///
    /// Recoverable errors are recorded and skipped. Any other error stops the
    /// run; bytes already written stay in the sink.
    fn stream(
        &self,
        resolved: &ResolvedSources,
        chain: &FilterChain,
        ctx: &mut DynamicContext,
        sink: &mut dyn AppendSink,
    ) -> Result<Tally> {
        let mut tally = Tally::default();

        for group in &resolved.groups {
            if let Some(message) = &group.scan_error {
                self.record_failure(&mut tally, FailureKind::Scan, scan_label(group), message);
                continue;
            }

            if matches!(group.kind, SourceKind::FileList | SourceKind::FileSet)
                && !group.items.is_empty()
            {
                info!(
                    source = %group.kind,
                    count = group.items.len(),
                    base_dir = ?group.base_dir,
                    "attempting to append {} files",
                    group.items.len()
                );
                self.progress
                    .group_started(group.kind, group.items.len(), group.base_dir.as_deref());
            }

            for item in &group.items {
                match self.append_item(item, chain, ctx, sink, &mut tally) {
                    Ok(bytes) => {
                        tally.items_appended += 1;
                        self.progress.item_appended(item, bytes);
                    }
                    Err(e) if e.is_recoverable() => {
                        self.record_failure(&mut tally, FailureKind::Item, item.label(), &e.to_string());
                    }
                    Err(e) => return Err(e),
                }
            }
        }

        Ok(tally)
    }

    /// Append one item, returning the number of bytes written for it.
    ///
    /// Bytes written before a failure stay in the sink and in the tally.
    fn append_item(
        &self,
        item: &ContentItem,
        chain: &FilterChain,
        ctx: &mut DynamicContext,
        sink: &mut dyn AppendSink,
        tally: &mut Tally,
    ) -> Result<u64> {
        match item {
            ContentItem::Text { content } => {
                info!(dest = %sink.path().display(), "appending string");
                for line in content.split('\n') {
                    debug!("{line}");
                }
            }
            ContentItem::File { path, .. } => ctx.set_current_file(path),
        }

        let mut reader = ChainedReader::open(item, chain, ctx, self.chunk_size)?;
        let mut written = 0u64;

        while let Chunk::Data(bytes) = reader.next_chunk()? {
            sink.append(bytes)
                .map_err(|e| AppendixError::item_read(item.label(), e))?;
            let n = bytes.len() as u64;
            written += n;
            tally.bytes_written += n;
        }

        if let Some(path) = item.path() {
            info!(
                file = %path.display(),
                dest = %sink.path().display(),
                "appended contents"
            );
        }
        Ok(written)
    }

    fn record_failure(&self, tally: &mut Tally, kind: FailureKind, item: String, message: &str) {
        warn!(item = %item, "{message}");
        let failure = ItemFailure {
            kind,
            item,
            message: message.to_string(),
        };
        self.progress.item_failed(&failure);
        tally.failures.push(failure);
    }
}

fn scan_label(group: &SourceGroup) -> String {
    match &group.base_dir {
        Some(dir) => dir.display().to_string(),
        None => format!("<{}>", group.kind),
    }
}
