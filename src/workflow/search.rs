//! Search stage: fetch candidates, filter them, and record the shortlist.
use super::stage_files::{load_candidates, raw_id, Shortlist};
use super::PipelineContext;
use crate::cli::SearchArgs;
use crate::config::{self, SearchOverrides, SearchSettings};
use crate::filter::{filter_projects, FilterConfig};
use crate::marketplace::{FreelancerClient, Marketplace, SearchQuery};
use crate::output::render_shortlist;
use crate::project::Project;
use crate::staging::write_json_atomic;
use crate::store::{Status, StatusStore};
use crate::summary::RunSummary;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::path::Path;

pub fn run_search(args: SearchArgs, data_dir: Option<&Path>) -> Result<()> {
    let ctx = PipelineContext::new(data_dir);
    let mut store = ctx.load_store()?;

    let filter_file = config::load_filter_config(args.filters.as_deref(), ctx.data_dir())
        .context("load filter config")?;
    let presets = config::load_presets(args.presets.as_deref(), ctx.data_dir())
        .context("load search presets")?;
    let preset = args
        .preset
        .as_deref()
        .map(|name| presets.get(name))
        .transpose()?;
    let settings = SearchSettings::resolve(filter_file, preset, &overrides_from(&args))
        .context("resolve search settings")?;

    let mut summary = RunSummary::new("search");
    let raw = match &args.candidates {
        Some(path) => load_candidates(path)
            .with_context(|| format!("load candidates {}", path.display()))?,
        None => {
            let client = FreelancerClient::from_env().context("configure marketplace client")?;
            collect_candidates(&client, &settings, &mut summary)
        }
    };
    tracing::info!(candidates = raw.len(), "search candidates collected");

    let now = Utc::now();
    let kept = shortlist_projects(
        raw,
        &settings.filter,
        &mut store,
        now,
        args.include_seen,
        &mut summary,
    );

    if let Some(path) = args.output_json.as_deref().filter(|_| !kept.is_empty()) {
        let shortlist = Shortlist {
            generated_at: now,
            preset: args.preset.clone(),
            query: settings.query.clone(),
            count: kept.len(),
            projects: kept.clone(),
        };
        write_json_atomic(path, &shortlist)?;
        summary.output = Some(path.to_path_buf());
    }
    store.save().context("save status store")?;

    if !args.json {
        print!("{}", render_shortlist(&kept, now));
    }
    summary.emit(args.json)
}

fn overrides_from(args: &SearchArgs) -> SearchOverrides {
    SearchOverrides {
        query: args.query.clone(),
        countries: args.countries.clone(),
        languages: args.languages.clone(),
        skills: args.skills.clone(),
        job_ids: args.job_ids.clone(),
        min_budget: args.min_budget,
        max_budget: args.max_budget,
        posted_within_hours: args.posted_within_hours,
        min_bids: args.min_bids,
        max_bids: args.max_bids,
        limit: args.limit,
        pages: args.pages,
    }
}

/// Fetch up to `settings.pages` pages, stopping early on an empty page. A
/// failed page is recorded and ends paging; earlier pages are kept.
pub fn collect_candidates(
    marketplace: &dyn Marketplace,
    settings: &SearchSettings,
    summary: &mut RunSummary,
) -> Vec<Value> {
    let mut collected = Vec::new();
    for page in 0..settings.pages {
        let query = SearchQuery {
            query: settings.query.clone(),
            languages: settings.languages.clone(),
            countries: settings.countries.clone(),
            job_ids: settings.job_ids.clone(),
            limit: settings.limit,
            offset: page.saturating_mul(settings.limit),
        };
        match marketplace.search(&query) {
            Ok(projects) if projects.is_empty() => break,
            Ok(projects) => {
                tracing::debug!(page, count = projects.len(), "search page fetched");
                collected.extend(projects);
            }
            Err(err) => {
                summary.error(None, format!("search page {}: {err}", page + 1));
                break;
            }
        }
    }
    collected
}

/// Parse, filter and record one batch of raw candidates. Kept projects are
/// advanced to `seen_only`, which never downgrades a later status.
pub fn shortlist_projects(
    raw: Vec<Value>,
    config: &FilterConfig,
    store: &mut StatusStore,
    now: DateTime<Utc>,
    include_seen: bool,
    summary: &mut RunSummary,
) -> Vec<Project> {
    let mut candidates = Vec::with_capacity(raw.len());
    for value in raw {
        let id = raw_id(&value);
        match Project::from_value(value) {
            Ok(project) => candidates.push(project),
            Err(err) => summary.error(id, err),
        }
    }

    let outcome = filter_projects(candidates, config, store, now, include_seen);
    for rejection in &outcome.rejected {
        summary.reject(rejection.reason.as_str());
    }
    record_shortlist(store, &outcome.kept, now);
    summary.kept = outcome.kept.len();
    outcome.kept
}

pub fn record_shortlist(store: &mut StatusStore, kept: &[Project], now: DateTime<Utc>) {
    for project in kept {
        store.advance(project.id, Status::SeenOnly, now);
    }
}

#[cfg(test)]
#[path = "search_tests.rs"]
mod tests;
