//! Draft stage: write proposals for well-scored projects with the expensive
//! model.
use super::stage_files::{raw_id, AnalysisEntry, AnalysisSet, BidEntry, BidSet};
use super::PipelineContext;
use crate::cli::DraftArgs;
use crate::config::PROFILES_FILE;
use crate::error::{ScoutError, ScoutResult};
use crate::lm::{self, CompletionModel, CompletionRequest, ModelTier};
use crate::lm_response::{parse_bid_draft, Analysis, MilestonePlan};
use crate::profiles::{select_profile_key, Profile, ProfileSet};
use crate::project::Project;
use crate::staging::{read_json, write_json_atomic};
use crate::store::{Status, StatusStore};
use crate::summary::RunSummary;
use crate::templates::{PromptTemplate, BID_PROMPT_MD};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

const DRAFT_TEMPERATURE: f32 = 0.4;

pub struct DraftOptions<'a> {
    pub model_name: &'a str,
    pub template: &'a PromptTemplate,
    pub min_score: f64,
    pub max_projects: usize,
}

pub fn run_draft(args: DraftArgs, data_dir: Option<&Path>) -> Result<()> {
    let ctx = PipelineContext::new(data_dir);
    let mut store = ctx.load_store()?;
    let input: AnalysisSet<Value> = read_json(&args.input_json)?;

    let template =
        PromptTemplate::load_or_builtin(args.prompt.as_deref(), "bid_prompt.md", BID_PROMPT_MD)
            .context("load bid prompt")?;
    let profiles = ProfileSet::load(
        args.profiles.as_deref(),
        &ctx.data_dir().join(PROFILES_FILE),
    )
    .context("load profiles")?;
    let model = lm::model_from_env().context("configure model backend")?;
    let model_name = ModelTier::Expensive.resolve(args.model.as_deref());
    let options = DraftOptions {
        model_name: &model_name,
        template: &template,
        min_score: args.min_score,
        max_projects: args.max_projects,
    };

    tracing::info!(
        model = %model_name,
        template = template.name(),
        min_score = args.min_score,
        "drafting bids"
    );

    let now = Utc::now();
    let mut summary = RunSummary::new("draft");
    let bids = draft_bids(
        input.results,
        &mut store,
        &*model,
        &profiles,
        &options,
        now,
        &mut summary,
    )?;

    if !bids.is_empty() {
        let path = args
            .output_json
            .clone()
            .unwrap_or_else(|| ctx.default_output("bids", &args.input_json));
        let set = BidSet {
            generated_at: now,
            input: args.input_json.display().to_string(),
            count: bids.len(),
            generated_bids: bids,
        };
        write_json_atomic(&path, &set)?;
        summary.output = Some(path);
    }
    store.save().context("save status store")?;
    summary.emit(args.json)
}

/// Milestone sizing hint derived from the project budget.
pub fn milestone_context(budget: Option<f64>) -> MilestonePlan {
    let (size, count) = match budget {
        Some(amount) if amount < 200.0 => ("small", 2),
        Some(amount) if amount < 1000.0 => ("medium", 3),
        Some(_) => ("large", 4),
        None => ("medium", 3),
    };
    MilestonePlan {
        size: size.to_string(),
        count,
        milestones: Vec::new(),
    }
}

fn format_score(score: f64) -> String {
    if score.fract() == 0.0 {
        format!("{score:.0}")
    } else {
        format!("{score:.1}")
    }
}

fn bid_values(
    project: &Project,
    analysis: &Analysis,
    profile: &Profile,
    plan: &MilestonePlan,
) -> BTreeMap<&'static str, String> {
    BTreeMap::from([
        ("PROJECT_TITLE", project.title.clone()),
        ("PROJECT_URL", project.url().unwrap_or_default()),
        (
            "PROJECT_DESCRIPTION",
            project.description_text().unwrap_or_default().to_string(),
        ),
        ("ANALYSIS_SUMMARY", analysis.summary.clone()),
        ("ROUGH_SCORE", format_score(analysis.rough_score)),
        (
            "AUTOMATION_POTENTIAL",
            format_score(analysis.automation_potential),
        ),
        ("MANUAL_WORK_NOTES", analysis.manual_work_notes.clone()),
        ("PROFILE_LABEL", profile.label.clone()),
        ("PROFILE_GENERAL", profile.general.clone()),
        ("PROFILE_SECTION", profile.section.clone()),
        ("PROFILE_LINK", profile.link.clone()),
        ("MILESTONE_COUNT", plan.count.to_string()),
        ("MILESTONE_SIZE", plan.size.clone()),
    ])
}

/// Draft bids for analyzed projects scoring at least `min_score`. Lower
/// scores are advanced to `rejected` without a model call; projects already
/// drafted, sent or rejected are skipped.
pub fn draft_bids(
    results: Vec<Value>,
    store: &mut StatusStore,
    model: &dyn CompletionModel,
    profiles: &ProfileSet,
    options: &DraftOptions<'_>,
    now: DateTime<Utc>,
    summary: &mut RunSummary,
) -> ScoutResult<Vec<BidEntry>> {
    let sample = bid_values(
        &Project::default(),
        &Analysis::default(),
        &Profile::default(),
        &milestone_context(None),
    );
    options.template.ensure_placeholders(&sample)?;

    let mut bids = Vec::new();
    let mut attempts = 0;
    for value in results {
        let id = raw_id(&value);
        let entry: AnalysisEntry = match serde_json::from_value(value) {
            Ok(entry) => entry,
            Err(err) => {
                summary.error(id, ScoutError::validation("analysis entry", err));
                continue;
            }
        };
        let AnalysisEntry {
            id,
            project,
            analysis,
            ..
        } = entry;

        if store
            .get_status(id)
            .is_some_and(|status| !status.can_advance_to(Status::BidDrafted))
        {
            tracing::debug!(project_id = id, "already drafted or closed, skipping");
            summary.skipped += 1;
            continue;
        }
        if analysis.rough_score < options.min_score {
            tracing::info!(
                project_id = id,
                rough_score = analysis.rough_score,
                min_score = options.min_score,
                "score below threshold, rejecting"
            );
            store.advance(id, Status::Rejected, now);
            summary.reject("low_score");
            continue;
        }
        if attempts >= options.max_projects {
            summary.skipped += 1;
            continue;
        }
        attempts += 1;

        let profile_key = select_profile_key(&analysis.category, &project);
        let profile = profiles.get(profile_key);
        let plan = milestone_context(project.budget_amount());
        let prompt = options
            .template
            .render(&bid_values(&project, &analysis, &profile, &plan))?;
        let request = CompletionRequest {
            model: options.model_name,
            system: lm::SYSTEM_PROMPT,
            prompt: &prompt,
            temperature: DRAFT_TEMPERATURE,
        };
        let bid = match model
            .complete(&request)
            .and_then(|reply| parse_bid_draft(&reply, &plan))
        {
            Ok(bid) => bid,
            Err(err) => {
                summary.error(Some(id), err);
                continue;
            }
        };

        tracing::info!(
            project_id = id,
            profile = profile_key,
            milestones = bid.milestone_plan.count,
            "bid drafted"
        );
        store.advance(id, Status::BidDrafted, now);
        bids.push(BidEntry {
            id,
            title: project.title.clone(),
            project_url: project.url(),
            profile: profile_key.to_string(),
            analysis,
            bid,
        });
    }
    summary.kept = bids.len();
    Ok(bids)
}

#[cfg(test)]
#[path = "draft_tests.rs"]
mod tests;
