use crate::config;
use crate::store::{StatusStore, STORE_FILE};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Resolved data directory shared by every command.
pub struct PipelineContext {
    data_dir: PathBuf,
}

impl PipelineContext {
    pub fn new(data_dir_flag: Option<&Path>) -> Self {
        Self {
            data_dir: config::resolve_data_dir(data_dir_flag),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn store_path(&self) -> PathBuf {
        self.data_dir.join(STORE_FILE)
    }

    /// Load the status store. A corrupt store stops the command before any
    /// other work so nothing can be saved over it.
    pub fn load_store(&self) -> Result<StatusStore> {
        let path = self.store_path();
        StatusStore::load(&path).with_context(|| format!("load status store {}", path.display()))
    }

    /// `<data_dir>/<prefix>_<input stem>.json`, used when no output is given.
    pub fn default_output(&self, prefix: &str, input: &Path) -> PathBuf {
        let stem = input
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .filter(|stem| !stem.is_empty())
            .unwrap_or_else(|| "input".to_string());
        self.data_dir.join(format!("{prefix}_{stem}.json"))
    }
}
