//! Shared utilities for command implementations
//!
//! This module contains:
//! - `load_config` - Resolve the categorizer config (override or embedded default)
//! - `learning_file` / `load_learning` / `save_learning` - Learning state file
//! - `parse_category` - Category argument parsing

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tally_core::{CategorizerConfig, Category, LearningEngine, LearningSnapshot};

/// File name of the learning state inside the data directory
pub const LEARNING_FILE: &str = "learning.json";

/// Resolve the data directory (~/.local/share/tally on Linux)
pub fn data_dir(override_dir: Option<&Path>) -> Result<PathBuf> {
    match override_dir {
        Some(dir) => Ok(dir.to_path_buf()),
        None => dirs::data_local_dir()
            .map(|d| d.join("tally"))
            .context("Could not determine a data directory; pass --data-dir"),
    }
}

pub fn learning_path(data_dir: &Path) -> PathBuf {
    data_dir.join(LEARNING_FILE)
}

/// Learning state file for the given (or platform) data directory
pub fn learning_file(override_dir: Option<&Path>) -> Result<PathBuf> {
    Ok(learning_path(&data_dir(override_dir)?))
}

/// Load config from an explicit file or the default override location
pub fn load_config(path: Option<&Path>) -> Result<CategorizerConfig> {
    match path {
        Some(path) => CategorizerConfig::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => CategorizerConfig::load().context("Failed to load categorizer config"),
    }
}

/// Load learning state; a missing file means nothing learned yet
pub fn load_learning(path: &Path) -> Result<LearningEngine> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No learning state yet");
        return Ok(LearningEngine::new());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read learning state {}", path.display()))?;
    let snapshot: LearningSnapshot = serde_json::from_str(&content)
        .with_context(|| format!("Invalid learning state in {}", path.display()))?;

    tracing::debug!(
        merchants = snapshot.merchants.len(),
        patterns = snapshot.patterns.len(),
        "Loaded learning state"
    );
    Ok(LearningEngine::from_snapshot(snapshot))
}

/// Write learning state atomically (temp file in the same directory, then rename)
pub fn save_learning(path: &Path, snapshot: &LearningSnapshot) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create data directory {}", dir.display()))?;

    let mut temp = tempfile::NamedTempFile::new_in(dir)
        .context("Failed to create temporary learning state file")?;
    serde_json::to_writer_pretty(&mut temp, snapshot)
        .context("Failed to serialize learning state")?;
    temp.flush()?;
    temp.persist(path)
        .with_context(|| format!("Failed to write learning state {}", path.display()))?;

    Ok(())
}

pub fn parse_category(value: &str) -> Result<Category> {
    value.parse::<Category>().map_err(|e| {
        let valid: Vec<&str> = Category::all().iter().map(|c| c.as_str()).collect();
        anyhow::anyhow!("{} (valid: {})", e, valid.join(", "))
    })
}
