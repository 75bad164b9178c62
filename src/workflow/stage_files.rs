//! JSON files passed between stages.
//!
//! Writers use the typed entry; readers take `serde_json::Value` entries so
//! one malformed item is reported on its own instead of failing the file.
use crate::lm_response::{Analysis, BidDraft};
use crate::project::Project;
use crate::staging::read_json;
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shortlist<T = Project> {
    pub generated_at: DateTime<Utc>,
    #[serde(default)]
    pub preset: Option<String>,
    #[serde(default)]
    pub query: Option<String>,
    pub count: usize,
    pub projects: Vec<T>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisEntry {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub seo_url: Option<String>,
    pub project: Project,
    pub analysis: Analysis,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisSet<T = AnalysisEntry> {
    pub generated_at: DateTime<Utc>,
    pub input: String,
    pub count: usize,
    pub results: Vec<T>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BidEntry {
    pub id: u64,
    pub title: String,
    pub project_url: Option<String>,
    pub profile: String,
    pub analysis: Analysis,
    pub bid: BidDraft,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BidSet<T = BidEntry> {
    pub generated_at: DateTime<Utc>,
    pub input: String,
    pub count: usize,
    pub generated_bids: Vec<T>,
}

/// Candidate payloads from a saved file: a raw search response
/// (`result.projects`), a shortlist (`projects`), or a bare array.
pub fn load_candidates(path: &Path) -> Result<Vec<Value>> {
    let value: Value = read_json(path)?;
    candidates_from_value(value)
        .ok_or_else(|| anyhow!("{} has no project list", path.display()))
}

fn candidates_from_value(value: Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(mut map) => {
            if let Some(Value::Array(items)) = map.remove("projects") {
                return Some(items);
            }
            match map.remove("result") {
                Some(Value::Object(mut result)) => match result.remove("projects") {
                    Some(Value::Array(items)) => Some(items),
                    _ => None,
                },
                _ => None,
            }
        }
        _ => None,
    }
}

/// Best-effort id of a raw item, for error reporting.
pub fn raw_id(value: &Value) -> Option<u64> {
    value.get("id").and_then(Value::as_u64)
}
