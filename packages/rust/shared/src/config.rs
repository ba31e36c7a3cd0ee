//! User configuration for Appendix.
//!
//! User config lives at `~/.appendix/appendix.toml`.
//! CLI flags and task files override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppendixError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "appendix.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".appendix";

/// Default read buffer size for streaming an item.
pub const DEFAULT_CHUNK_SIZE: usize = 8 * 1024;

// ---------------------------------------------------------------------------
// Config structs (matching appendix.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Bytes pulled from a chained reader per write.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Default-excludes setting for file-sets declared on the command line.
    #[serde(default = "default_true")]
    pub default_excludes: bool,

    /// Follow-symlinks setting for file-sets declared on the command line.
    #[serde(default)]
    pub follow_symlinks: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            default_excludes: true,
            follow_symlinks: false,
        }
    }
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}
fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.appendix/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| AppendixError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.appendix/appendix.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| AppendixError::io(path, e))?;

    let config: AppConfig = toml::from_str(&content).map_err(|e| {
        AppendixError::config(format!("failed to parse {}: {e}", path.display()))
    })?;
    validate_config(&config)?;
    Ok(config)
}

/// Reject settings the pipeline cannot run with.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    if config.defaults.chunk_size == 0 {
        return Err(AppendixError::config("defaults.chunk_size must be greater than 0"));
    }
    Ok(())
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| AppendixError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| AppendixError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| AppendixError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
