//! CLI argument parsing for the search -> analyze -> draft pipeline.
//!
//! Each stage is its own command connected to the next through a JSON file,
//! so any stage can be rerun or replaced by hand.
use crate::store::Status;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "jobscout",
    version,
    about = "Search, triage and draft proposals for freelance projects",
    after_help = "Commands:\n  search                 Fetch, filter and shortlist new projects\n  analyze --input-json   Score shortlisted projects with the cheap model\n  draft --input-json     Draft proposals for high-scoring projects\n  mark --id --status     Set a project's status by hand\n  forget --id            Drop a project from the status store\n  status                 Summarize the status store\n\nExamples:\n  jobscout search --preset rust_de --output-json shortlist.json\n  jobscout analyze --input-json shortlist.json --output-json analysis.json\n  jobscout draft --input-json analysis.json --min-score 70\n  jobscout mark --id 3912345 --status bid_sent",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    /// Directory holding the status store and config files
    #[arg(long, value_name = "DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Log at debug level (RUST_LOG overrides)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Search(SearchArgs),
    Analyze(AnalyzeArgs),
    Draft(DraftArgs),
    Mark(MarkArgs),
    Forget(ForgetArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Default)]
#[command(about = "Fetch, filter and shortlist new projects")]
pub struct SearchArgs {
    /// Named preset from the presets file; flags override its values
    #[arg(long, value_name = "NAME")]
    pub preset: Option<String>,

    /// Presets file (default: <data-dir>/search_presets.json)
    #[arg(long, value_name = "PATH")]
    pub presets: Option<PathBuf>,

    /// Filter config file (default: <data-dir>/filters.json)
    #[arg(long, value_name = "PATH")]
    pub filters: Option<PathBuf>,

    /// Search keywords
    #[arg(long, short = 'q')]
    pub query: Option<String>,

    /// Comma-separated ISO country codes, e.g. DE,AT,CH
    #[arg(long, value_name = "CSV", value_delimiter = ',')]
    pub countries: Option<Vec<String>>,

    /// Comma-separated language codes, e.g. en,de
    #[arg(long, value_name = "CSV", value_delimiter = ',')]
    pub languages: Option<Vec<String>>,

    /// Comma-separated skills; projects must list at least one
    #[arg(long, value_name = "CSV", value_delimiter = ',')]
    pub skills: Option<Vec<String>>,

    /// Comma-separated marketplace job ids to search, e.g. 3,9
    #[arg(long, value_name = "CSV", value_delimiter = ',')]
    pub job_ids: Option<Vec<u64>>,

    /// Minimum average budget
    #[arg(long)]
    pub min_budget: Option<f64>,

    /// Maximum average budget
    #[arg(long)]
    pub max_budget: Option<f64>,

    /// Only keep projects posted within this many hours
    #[arg(long, value_name = "HOURS")]
    pub posted_within_hours: Option<u64>,

    /// Minimum current bid count
    #[arg(long)]
    pub min_bids: Option<u64>,

    /// Maximum current bid count
    #[arg(long)]
    pub max_bids: Option<u64>,

    /// Projects per page (default: 50)
    #[arg(long)]
    pub limit: Option<u32>,

    /// Pages to fetch (default: 1)
    #[arg(long)]
    pub pages: Option<u32>,

    /// Keep projects already in the status store
    #[arg(long)]
    pub include_seen: bool,

    /// Read candidates from a saved search response or shortlist instead of
    /// calling the marketplace
    #[arg(long, value_name = "PATH")]
    pub candidates: Option<PathBuf>,

    /// Write the shortlist here (only when it is non-empty)
    #[arg(long, value_name = "PATH")]
    pub output_json: Option<PathBuf>,

    /// Emit the run summary as JSON instead of the listing
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
#[command(about = "Score shortlisted projects with the cheap model")]
pub struct AnalyzeArgs {
    /// Shortlist written by `search`
    #[arg(long, value_name = "PATH")]
    pub input_json: PathBuf,

    /// Analysis output (default: <data-dir>/analysis_<input stem>.json)
    #[arg(long, value_name = "PATH")]
    pub output_json: Option<PathBuf>,

    /// Stop after this many model calls
    #[arg(long, default_value_t = 20)]
    pub max_projects: usize,

    /// Model name (default: OPENAI_CHEAP_MODEL or gpt-3.5-turbo)
    #[arg(long)]
    pub model: Option<String>,

    /// Prompt template with a {PROJECT_JSON} placeholder
    #[arg(long, value_name = "PATH")]
    pub prompt: Option<PathBuf>,

    /// Fetch the full project description before analysis
    #[arg(long)]
    pub fetch_details: bool,

    /// Emit the run summary as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
#[command(about = "Draft proposals for high-scoring analyzed projects")]
pub struct DraftArgs {
    /// Analysis file written by `analyze`
    #[arg(long, value_name = "PATH")]
    pub input_json: PathBuf,

    /// Bids output (default: <data-dir>/bids_<input stem>.json)
    #[arg(long, value_name = "PATH")]
    pub output_json: Option<PathBuf>,

    /// Projects scoring below this are marked rejected
    #[arg(long, default_value_t = 60.0)]
    pub min_score: f64,

    /// Stop after this many model calls
    #[arg(long, default_value_t = 10)]
    pub max_projects: usize,

    /// Model name (default: OPENAI_EXPENSIVE_MODEL or gpt-4.1-mini)
    #[arg(long)]
    pub model: Option<String>,

    /// Prompt template for proposals
    #[arg(long, value_name = "PATH")]
    pub prompt: Option<PathBuf>,

    /// Profiles file (default: <data-dir>/profiles.json)
    #[arg(long, value_name = "PATH")]
    pub profiles: Option<PathBuf>,

    /// Emit the run summary as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
#[command(about = "Set a project's status by hand")]
pub struct MarkArgs {
    /// Marketplace project id
    #[arg(long)]
    pub id: u64,

    /// seen_only, analyzed, bid_drafted, bid_sent or rejected
    #[arg(long)]
    pub status: Status,

    /// Allow moving a project backwards in the lifecycle
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
#[command(about = "Drop a project from the status store")]
pub struct ForgetArgs {
    /// Marketplace project id
    #[arg(long)]
    pub id: u64,
}

#[derive(Args, Debug)]
#[command(about = "Summarize the status store")]
pub struct StatusArgs {
    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}
