//! Append pipeline for Appendix.
//!
//! Resolves a task's sources into an ordered item sequence, streams each item
//! through its filter chain, and appends the result to a single destination.

pub mod destination;
pub mod pipeline;
pub mod reader;
pub mod source;

pub use destination::{AppendSink, Destination};
pub use pipeline::{
    AppendPipeline, AppendReport, FailureKind, ItemFailure, ProgressReporter, SilentProgress,
};
pub use reader::{ChainedReader, Chunk};
pub use source::{ResolvedSources, SourceGroup, SourceKind, resolve, validate, validate_sources};
