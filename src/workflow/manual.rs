//! Manual store commands: `mark`, `forget` and `status`.
use super::PipelineContext;
use crate::cli::{ForgetArgs, MarkArgs, StatusArgs};
use crate::store::{Status, StatusRecord, StatusStore};
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

pub fn run_mark(args: MarkArgs, data_dir: Option<&Path>) -> Result<()> {
    let ctx = PipelineContext::new(data_dir);
    let mut store = ctx.load_store()?;
    let updated =
        apply_mark(&mut store, args.id, args.status, args.force, Utc::now())?.last_updated;
    store.save()?;
    tracing::info!(project_id = args.id, status = %args.status, force = args.force, "status set");
    println!(
        "{}: {} (updated {})",
        args.id,
        args.status,
        updated.format("%Y-%m-%d %H:%M UTC")
    );
    Ok(())
}

/// Set `id` to `status` and return the updated record. Without `force` only
/// forward moves (or re-marking the current status) are accepted.
pub fn apply_mark(
    store: &mut StatusStore,
    id: u64,
    status: Status,
    force: bool,
    now: DateTime<Utc>,
) -> Result<&StatusRecord> {
    let current = store.get_status(id);
    let changed = if force || current == Some(status) {
        store.mark(id, status, now);
        true
    } else {
        store.advance(id, status, now)
    };
    if changed {
        return store
            .get(id)
            .ok_or_else(|| anyhow!("project {id} vanished from the store"));
    }
    let current = current.map(|status| status.as_str()).unwrap_or("untracked");
    Err(anyhow!(
        "project {id} is {current}; moving it to {status} needs --force"
    ))
}

pub fn run_forget(args: ForgetArgs, data_dir: Option<&Path>) -> Result<()> {
    let ctx = PipelineContext::new(data_dir);
    let mut store = ctx.load_store()?;
    let removed = store
        .forget(args.id)
        .ok_or_else(|| anyhow!("project {} is not in {}", args.id, store.path().display()))?;
    store.save()?;
    tracing::info!(project_id = args.id, was = %removed.status, "project forgotten");
    println!("forgot {} (was {})", args.id, removed.status);
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub path: PathBuf,
    pub total: usize,
    pub counts: BTreeMap<&'static str, usize>,
}

impl StatusReport {
    /// Counts for every status, including those with no projects.
    pub fn from_store(store: &StatusStore) -> Self {
        let counts = store.counts();
        Self {
            path: store.path().to_path_buf(),
            total: store.len(),
            counts: Status::ALL
                .into_iter()
                .map(|status| (status.as_str(), counts.get(&status).copied().unwrap_or(0)))
                .collect(),
        }
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}: {} projects", self.path.display(), self.total)?;
        for status in Status::ALL {
            let count = self.counts.get(status.as_str()).copied().unwrap_or(0);
            writeln!(f, "  {:<12} {count}", status.as_str())?;
        }
        Ok(())
    }
}

pub fn run_status(args: StatusArgs, data_dir: Option<&Path>) -> Result<()> {
    let ctx = PipelineContext::new(data_dir);
    let store = ctx.load_store()?;
    if store.is_empty() {
        tracing::info!(path = %store.path().display(), "no projects tracked yet");
    }
    let report = StatusReport::from_store(&store);
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{report}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, hour, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    #[test]
    fn mark_moves_forward_without_force() {
        let mut store = StatusStore::new("seen.json");
        store.mark(1, Status::BidDrafted, at(8));
        apply_mark(&mut store, 1, Status::BidSent, false, at(9)).expect("forward");
        apply_mark(&mut store, 2, Status::Rejected, false, at(9)).expect("new record");
        assert_eq!(store.get_status(1), Some(Status::BidSent));
        assert_eq!(store.get_status(2), Some(Status::Rejected));
    }

    #[test]
    fn backward_mark_needs_force() {
        let mut store = StatusStore::new("seen.json");
        store.mark(1, Status::BidSent, at(8));

        let err = apply_mark(&mut store, 1, Status::Analyzed, false, at(9)).expect_err("refused");
        assert!(err.to_string().contains("needs --force"), "{err}");
        assert_eq!(store.get_status(1), Some(Status::BidSent));

        apply_mark(&mut store, 1, Status::Analyzed, true, at(9)).expect("forced");
        assert_eq!(store.get_status(1), Some(Status::Analyzed));
    }

    #[test]
    fn remarking_current_status_refreshes_timestamp() {
        let mut store = StatusStore::new("seen.json");
        store.mark(1, Status::Analyzed, at(8));
        let record =
            apply_mark(&mut store, 1, Status::Analyzed, false, at(10)).expect("same status");
        assert_eq!(record.last_updated, at(10));
        assert_eq!(store.get(1).map(|r| r.last_updated), Some(at(10)));
    }

    #[test]
    fn mark_returns_the_stored_record() {
        let mut store = StatusStore::new("seen.json");
        store.mark(1, Status::Analyzed, at(11));

        let record = apply_mark(&mut store, 1, Status::Rejected, true, at(9)).expect("forced");
        assert_eq!(record.status, Status::Rejected);
        assert_eq!(record.last_updated, at(11));

        let record = apply_mark(&mut store, 2, Status::SeenOnly, false, at(9)).expect("new");
        assert_eq!((record.status, record.last_updated), (Status::SeenOnly, at(9)));
    }

    #[test]
    fn report_lists_every_status() {
        let mut store = StatusStore::new("data/seen.json");
        store.mark(1, Status::SeenOnly, at(8));
        store.mark(2, Status::SeenOnly, at(8));
        store.mark(3, Status::BidSent, at(8));

        let report = StatusReport::from_store(&store);
        assert_eq!(report.total, 3);
        assert_eq!(report.counts.len(), Status::ALL.len());
        assert_eq!(report.counts["seen_only"], 2);
        assert_eq!(report.counts["analyzed"], 0);

        let text = report.to_string();
        assert!(text.starts_with("data/seen.json: 3 projects\n"));
        assert!(text.contains("  bid_sent     1\n"));

        let value = serde_json::to_value(&report).expect("serialize");
        assert_eq!(value["counts"]["bid_sent"], 1);
        assert_eq!(value["path"], "data/seen.json");
    }
}
