//! Shared types, error model, and configuration for Appendix.
//!
//! This crate is the foundation depended on by all other Appendix crates.
//! It provides:
//! - [`AppendixError`], the unified error type
//! - Domain types ([`ContentItem`], [`SourceSpec`], [`FileListSpec`], [`FileSetSpec`])
//! - The per-item [`DynamicContext`]
//! - Task files ([`AppendTask`]) and user configuration ([`AppConfig`])

pub mod config;
pub mod context;
pub mod error;
pub mod task;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DEFAULT_CHUNK_SIZE, DefaultsConfig, config_dir, config_file_path, init_config,
    load_config, load_config_from, validate_config,
};
pub use context::{CURRENT_FILE, CURRENT_FILE_PATH, DynamicContext};
pub use error::{AppendixError, Result};
pub use task::{AppendTask, load_task, parse_task};
pub use types::{
    ContentItem, FileListSpec, FileSetSpec, FilterChainSpec, FilterStageSpec, SourceSpec,
};
