use std::fs;
use std::path::Path;
use anyhow::{Result, Context};
use serde::{Deserialize, Serialize};
use tracing::info;

pub const CONFIG_FILE_NAME: &str = "date-sort.toml";

/// Tunables for an indexing run. Keys missing from the file keep their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexOptions {
    /// Inspector threads feeding the single catalog writer
    pub workers: usize,
    pub skip_hidden: bool,
    /// Visit entries in file-name order instead of OS enumeration order
    pub sort_by_name: bool,
    /// Catalog file name inside the destination directory
    pub catalog_name: String,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            workers: 4,
            skip_hidden: false,
            sort_by_name: false,
            catalog_name: "sorted.db".to_string(),
        }
    }
}

pub fn load_from_file(path: &Path) -> Result<IndexOptions> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {:?}", path))?;
    let options: IndexOptions = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file {:?}", path))?;
    Ok(options)
}

pub fn save_to_file(path: &Path, options: &IndexOptions) -> Result<()> {
    let content = toml::to_string_pretty(options).context("Failed to serialize options")?;
    fs::write(path, content).with_context(|| format!("Failed to write config file {:?}", path))?;
    Ok(())
}

/// Explicit file first, then `date-sort.toml` in `dir`, then defaults.
pub fn load_or_default(explicit: Option<&Path>, dir: &Path) -> Result<IndexOptions> {
    if let Some(path) = explicit {
        info!("Loading options from {:?}", path);
        return load_from_file(path);
    }

    let candidate = dir.join(CONFIG_FILE_NAME);
    if candidate.is_file() {
        info!("Loading options from {:?}", candidate);
        return load_from_file(&candidate);
    }

    Ok(IndexOptions::default())
}
