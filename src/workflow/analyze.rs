//! Analyze stage: score shortlisted projects with the cheap model.
use super::stage_files::{raw_id, AnalysisEntry, AnalysisSet, Shortlist};
use super::PipelineContext;
use crate::cli::AnalyzeArgs;
use crate::error::{ScoutError, ScoutResult};
use crate::lm::{self, CompletionModel, CompletionRequest, ModelTier};
use crate::lm_response::parse_analysis;
use crate::marketplace::{FreelancerClient, Marketplace};
use crate::project::Project;
use crate::staging::{read_json, write_json_atomic};
use crate::store::{Status, StatusStore};
use crate::summary::RunSummary;
use crate::templates::{PromptTemplate, ANALYSIS_PROMPT_MD};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

const ANALYSIS_TEMPERATURE: f32 = 0.1;

pub struct AnalyzeOptions<'a> {
    pub model_name: &'a str,
    pub template: &'a PromptTemplate,
    /// Upper bound on model calls for the run.
    pub max_projects: usize,
    /// Replace each project with its full detail payload before analysis.
    pub details: Option<&'a dyn Marketplace>,
}

pub fn run_analyze(args: AnalyzeArgs, data_dir: Option<&Path>) -> Result<()> {
    let ctx = PipelineContext::new(data_dir);
    let mut store = ctx.load_store()?;
    let input: Shortlist<Value> = read_json(&args.input_json)?;

    let template = PromptTemplate::load_or_builtin(
        args.prompt.as_deref(),
        "analysis_prompt.md",
        ANALYSIS_PROMPT_MD,
    )
    .context("load analysis prompt")?;
    let model = lm::model_from_env().context("configure model backend")?;
    let model_name = ModelTier::Cheap.resolve(args.model.as_deref());
    let marketplace = if args.fetch_details {
        Some(FreelancerClient::from_env().context("configure marketplace client")?)
    } else {
        None
    };
    let options = AnalyzeOptions {
        model_name: &model_name,
        template: &template,
        max_projects: args.max_projects,
        details: marketplace.as_ref().map(|client| client as &dyn Marketplace),
    };

    tracing::info!(
        model = %model_name,
        template = template.name(),
        projects = input.projects.len(),
        "analyzing shortlist"
    );

    let now = Utc::now();
    let mut summary = RunSummary::new("analyze");
    let results = analyze_shortlist(
        input.projects,
        &mut store,
        &*model,
        &options,
        now,
        &mut summary,
    )?;

    if !results.is_empty() {
        let path = args
            .output_json
            .clone()
            .unwrap_or_else(|| ctx.default_output("analysis", &args.input_json));
        let set = AnalysisSet {
            generated_at: now,
            input: args.input_json.display().to_string(),
            count: results.len(),
            results,
        };
        write_json_atomic(&path, &set)?;
        summary.output = Some(path);
    }
    store.save().context("save status store")?;
    summary.emit(args.json)
}

fn analysis_values(project_json: String) -> BTreeMap<&'static str, String> {
    BTreeMap::from([("PROJECT_JSON", project_json)])
}

/// Analyze each project not yet past `seen_only`, advancing successes to
/// `analyzed`. Per-item failures are recorded in `summary` and leave the
/// project's status unchanged so the next run retries it.
pub fn analyze_shortlist(
    projects: Vec<Value>,
    store: &mut StatusStore,
    model: &dyn CompletionModel,
    options: &AnalyzeOptions<'_>,
    now: DateTime<Utc>,
    summary: &mut RunSummary,
) -> ScoutResult<Vec<AnalysisEntry>> {
    options
        .template
        .ensure_placeholders(&analysis_values(String::new()))?;

    let mut results = Vec::new();
    let mut attempts = 0;
    for value in projects {
        let id = raw_id(&value);
        let project = match Project::from_value(value) {
            Ok(project) => project,
            Err(err) => {
                summary.error(id, err);
                continue;
            }
        };
        if store
            .get_status(project.id)
            .is_some_and(Status::is_past_analysis)
        {
            tracing::debug!(project_id = project.id, "already analyzed, skipping");
            summary.skipped += 1;
            continue;
        }
        if attempts >= options.max_projects {
            summary.skipped += 1;
            continue;
        }
        attempts += 1;

        let project = match options.details {
            Some(marketplace) => match marketplace.project_details(project.id) {
                Ok(detailed) => detailed,
                Err(err) => {
                    summary.error(Some(project.id), err);
                    continue;
                }
            },
            None => project,
        };

        let project_json = serde_json::to_string_pretty(&project)
            .map_err(|err| ScoutError::validation("project", err))?;
        let prompt = options.template.render(&analysis_values(project_json))?;
        let request = CompletionRequest {
            model: options.model_name,
            system: lm::SYSTEM_PROMPT,
            prompt: &prompt,
            temperature: ANALYSIS_TEMPERATURE,
        };
        let analysis = match model.complete(&request).and_then(|reply| parse_analysis(&reply)) {
            Ok(analysis) => analysis,
            Err(err) => {
                summary.error(Some(project.id), err);
                continue;
            }
        };

        tracing::info!(
            project_id = project.id,
            rough_score = analysis.rough_score,
            category = %analysis.category,
            "project analyzed"
        );
        store.advance(project.id, Status::Analyzed, now);
        results.push(AnalysisEntry {
            id: project.id,
            title: project.title.clone(),
            seo_url: project.seo_url.clone(),
            project,
            analysis,
        });
    }
    summary.kept = results.len();
    Ok(results)
}

#[cfg(test)]
#[path = "analyze_tests.rs"]
mod tests;
