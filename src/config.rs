//! Data directory, filter config, and search preset resolution.
//!
//! Precedence for search settings is command-line flags, then the named
//! preset, then the filter config file, then built-in defaults.
use crate::error::{ScoutError, ScoutResult};
use crate::filter::FilterConfig;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const DATA_DIR_ENV: &str = "JOBSCOUT_DATA_DIR";
pub const FILTERS_FILE: &str = "filters.json";
pub const PRESETS_FILE: &str = "search_presets.json";
pub const PROFILES_FILE: &str = "profiles.json";

pub const DEFAULT_PAGE_LIMIT: u32 = 50;
pub const DEFAULT_PAGES: u32 = 1;

/// Resolve the data directory holding the status store and config files.
pub fn resolve_data_dir(flag: Option<&Path>) -> PathBuf {
    data_dir_from(flag, env::var_os(DATA_DIR_ENV))
}

fn data_dir_from(flag: Option<&Path>, env_value: Option<OsString>) -> PathBuf {
    if let Some(path) = flag {
        return path.to_path_buf();
    }
    if let Some(value) = env_value.filter(|value| !value.is_empty()) {
        return PathBuf::from(value);
    }
    dirs::data_local_dir()
        .or_else(dirs::home_dir)
        .map(|dir| dir.join("jobscout"))
        .unwrap_or_else(|| PathBuf::from("data"))
}

/// Read a JSON config file. An explicitly named file must exist; the default
/// location is optional.
fn load_json_config<T: DeserializeOwned>(
    explicit: Option<&Path>,
    default_path: &Path,
) -> ScoutResult<Option<T>> {
    let path = explicit.unwrap_or(default_path);
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound && explicit.is_none() => {
            tracing::debug!(path = %path.display(), "optional config not present");
            return Ok(None);
        }
        Err(err) => {
            return Err(ScoutError::Config(format!(
                "read {}: {err}",
                path.display()
            )))
        }
    };
    let value = serde_json::from_slice(&bytes)
        .map_err(|err| ScoutError::Config(format!("parse {}: {err}", path.display())))?;
    Ok(Some(value))
}

/// Load and validate the filter config, defaulting to `<data_dir>/filters.json`.
pub fn load_filter_config(explicit: Option<&Path>, data_dir: &Path) -> ScoutResult<FilterConfig> {
    let config: FilterConfig =
        load_json_config(explicit, &data_dir.join(FILTERS_FILE))?.unwrap_or_default();
    config.validate()?;
    Ok(config)
}

/// One named search preset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchPreset {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub countries: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub languages: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skills: Vec<String>,
    /// Marketplace job (skill category) ids searched server-side.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub job_ids: Vec<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_budget: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_budget: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posted_within_hours: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_bids: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_bids: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PresetsFile {
    #[serde(default)]
    pub presets: BTreeMap<String, SearchPreset>,
}

/// Load presets, defaulting to `<data_dir>/search_presets.json`.
pub fn load_presets(explicit: Option<&Path>, data_dir: &Path) -> ScoutResult<PresetsFile> {
    Ok(load_json_config(explicit, &data_dir.join(PRESETS_FILE))?.unwrap_or_default())
}

impl PresetsFile {
    pub fn get(&self, name: &str) -> ScoutResult<&SearchPreset> {
        self.presets.get(name).ok_or_else(|| {
            let known: Vec<&str> = self.presets.keys().map(String::as_str).collect();
            if known.is_empty() {
                ScoutError::Config(format!("preset {name:?} not found (no presets defined)"))
            } else {
                ScoutError::Config(format!(
                    "preset {name:?} not found (known: {})",
                    known.join(", ")
                ))
            }
        })
    }
}

/// Values given on the command line; `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct SearchOverrides {
    pub query: Option<String>,
    pub countries: Option<Vec<String>>,
    pub languages: Option<Vec<String>>,
    pub skills: Option<Vec<String>>,
    pub job_ids: Option<Vec<u64>>,
    pub min_budget: Option<f64>,
    pub max_budget: Option<f64>,
    pub posted_within_hours: Option<u64>,
    pub min_bids: Option<u64>,
    pub max_bids: Option<u64>,
    pub limit: Option<u32>,
    pub pages: Option<u32>,
}

/// Fully merged settings for one search run.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSettings {
    pub query: Option<String>,
    pub countries: Vec<String>,
    pub languages: Vec<String>,
    pub job_ids: Vec<u64>,
    pub filter: FilterConfig,
    pub limit: u32,
    pub pages: u32,
}

impl SearchSettings {
    pub fn resolve(
        file: FilterConfig,
        preset: Option<&SearchPreset>,
        overrides: &SearchOverrides,
    ) -> ScoutResult<Self> {
        let mut filter = file;
        let mut query = None;
        let mut countries = Vec::new();
        let mut languages = Vec::new();
        let mut job_ids = Vec::new();
        let mut limit = None;
        let mut pages = None;

        if let Some(preset) = preset {
            query = preset.query.clone();
            countries = preset.countries.clone();
            languages = preset.languages.clone();
            job_ids = preset.job_ids.clone();
            if !preset.skills.is_empty() {
                filter.required_skills = preset.skills.clone();
            }
            overlay(&mut filter.min_budget, preset.min_budget);
            overlay(&mut filter.max_budget, preset.max_budget);
            overlay(&mut filter.posted_within_hours, preset.posted_within_hours);
            overlay(&mut filter.min_bids, preset.min_bids);
            overlay(&mut filter.max_bids, preset.max_bids);
            limit = preset.limit;
            pages = preset.pages;
        }

        overlay(&mut query, overrides.query.clone());
        if let Some(values) = &overrides.countries {
            countries = values.clone();
        }
        if let Some(values) = &overrides.languages {
            languages = values.clone();
        }
        if let Some(values) = &overrides.job_ids {
            job_ids = values.clone();
        }
        if let Some(values) = &overrides.skills {
            filter.required_skills = values.clone();
        }
        overlay(&mut filter.min_budget, overrides.min_budget);
        overlay(&mut filter.max_budget, overrides.max_budget);
        overlay(&mut filter.posted_within_hours, overrides.posted_within_hours);
        overlay(&mut filter.min_bids, overrides.min_bids);
        overlay(&mut filter.max_bids, overrides.max_bids);
        overlay(&mut limit, overrides.limit);
        overlay(&mut pages, overrides.pages);

        filter.required_skills = clean_list(filter.required_skills);
        filter.validate()?;

        let limit = limit.unwrap_or(DEFAULT_PAGE_LIMIT);
        if limit == 0 {
            return Err(ScoutError::Config("limit must be at least 1".to_string()));
        }
        job_ids.sort_unstable();
        job_ids.dedup();
        Ok(Self {
            query: query
                .map(|query| query.trim().to_string())
                .filter(|query| !query.is_empty()),
            countries: clean_list(countries),
            languages: clean_list(languages),
            job_ids,
            filter,
            limit,
            pages: pages.unwrap_or(DEFAULT_PAGES).max(1),
        })
    }
}

fn overlay<T>(slot: &mut Option<T>, value: Option<T>) {
    if value.is_some() {
        *slot = value;
    }
}

/// Trim entries and drop blanks from a comma-split list.
fn clean_list(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .collect()
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
