//! Persistent per-project processing status.
//!
//! The store is a JSON object keyed by marketplace project id. It is loaded
//! once per invocation, mutated in memory by a stage, and published once at
//! the end through an atomic replace. Overlapping invocations race at the file
//! level (last writer wins) but never leave a half-written file behind.
use crate::error::{ScoutError, ScoutResult};
use crate::staging::write_atomic_with;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// File name of the store inside the data directory.
pub const STORE_FILE: &str = "seen_projects.json";

/// Where a project sits in the pipeline.
///
/// The intended progression is `seen_only -> analyzed -> bid_drafted ->
/// bid_sent`; `rejected` is terminal and only reachable from `seen_only` or
/// `analyzed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    SeenOnly,
    Analyzed,
    BidDrafted,
    BidSent,
    Rejected,
}

impl Status {
    pub const ALL: [Status; 5] = [
        Status::SeenOnly,
        Status::Analyzed,
        Status::BidDrafted,
        Status::BidSent,
        Status::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Status::SeenOnly => "seen_only",
            Status::Analyzed => "analyzed",
            Status::BidDrafted => "bid_drafted",
            Status::BidSent => "bid_sent",
            Status::Rejected => "rejected",
        }
    }

    fn stage(self) -> u8 {
        match self {
            Status::SeenOnly => 0,
            Status::Analyzed => 1,
            Status::BidDrafted => 2,
            Status::BidSent => 3,
            Status::Rejected => 4,
        }
    }

    /// Whether moving from `self` to `next` goes forward in the lifecycle.
    pub fn can_advance_to(self, next: Status) -> bool {
        match (self, next) {
            (Status::Rejected, _) => false,
            (from, Status::Rejected) => matches!(from, Status::SeenOnly | Status::Analyzed),
            (from, to) => to.stage() > from.stage(),
        }
    }

    /// True once a project has been scored or dropped.
    pub fn is_past_analysis(self) -> bool {
        !matches!(self, Status::SeenOnly)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Status::ALL
            .into_iter()
            .find(|status| status.as_str() == raw.trim())
            .ok_or_else(|| {
                let known: Vec<&str> = Status::ALL.iter().map(Status::as_str).collect();
                format!("unknown status {raw:?} (expected one of {})", known.join(", "))
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRecord {
    pub status: Status,
    pub last_updated: DateTime<Utc>,
    /// Fields other tools stored on the record, kept as found.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone)]
pub struct StatusStore {
    path: PathBuf,
    records: BTreeMap<u64, StatusRecord>,
}

impl StatusStore {
    /// An empty store that will be saved to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            records: BTreeMap::new(),
        }
    }

    /// Read the persisted store. A missing file is a first run and yields an
    /// empty store; anything unparseable is `CorruptState`.
    pub fn load(path: impl Into<PathBuf>) -> ScoutResult<Self> {
        let path = path.into();
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no status store yet, starting empty");
                return Ok(Self::new(path));
            }
            Err(err) => return Err(ScoutError::io(path, err)),
        };
        let records: BTreeMap<u64, StatusRecord> =
            serde_json::from_slice(&bytes).map_err(|err| ScoutError::CorruptState {
                path: path.clone(),
                message: err.to_string(),
            })?;
        tracing::debug!(path = %path.display(), records = records.len(), "loaded status store");
        Ok(Self { path, records })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn is_seen(&self, id: u64) -> bool {
        self.records.contains_key(&id)
    }

    pub fn get_status(&self, id: u64) -> Option<Status> {
        self.records.get(&id).map(|record| record.status)
    }

    pub fn get(&self, id: u64) -> Option<&StatusRecord> {
        self.records.get(&id)
    }

    /// Insert or overwrite the record for `id` with any status.
    ///
    /// The stored timestamp never moves backwards: an older `at` keeps the
    /// existing `last_updated`. Extra fields on an existing record are kept.
    pub fn mark(&mut self, id: u64, status: Status, at: DateTime<Utc>) {
        let record = self.records.entry(id).or_insert_with(|| StatusRecord {
            status,
            last_updated: at,
            extra: Map::new(),
        });
        record.status = status;
        record.last_updated = record.last_updated.max(at);
    }

    /// Mark `id` only if that moves it forward in the lifecycle (or creates
    /// it). Returns whether the record changed.
    pub fn advance(&mut self, id: u64, status: Status, at: DateTime<Utc>) -> bool {
        if let Some(existing) = self.records.get(&id) {
            if !existing.status.can_advance_to(status) {
                tracing::debug!(
                    project_id = id,
                    from = %existing.status,
                    to = %status,
                    "status transition refused"
                );
                return false;
            }
        }
        self.mark(id, status, at);
        true
    }

    /// Drop a record. Only the manual `forget` command does this.
    pub fn forget(&mut self, id: u64) -> Option<StatusRecord> {
        self.records.remove(&id)
    }

    pub fn counts(&self) -> BTreeMap<Status, usize> {
        let mut counts = BTreeMap::new();
        for record in self.records.values() {
            *counts.entry(record.status).or_insert(0) += 1;
        }
        counts
    }

    /// Publish the full mapping atomically.
    pub fn save(&self) -> ScoutResult<()> {
        write_atomic_with(&self.path, |file| {
            serde_json::to_writer_pretty(&mut *file, &self.records)?;
            file.write_all(b"\n")
        })
        .map_err(|err| ScoutError::io(&self.path, err))?;
        tracing::debug!(path = %self.path.display(), records = self.records.len(), "saved status store");
        Ok(())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
