//! Pipeline commands.
//!
//! Every command loads the status store once, does its work, and saves the
//! store once at the end. Stages hand results to each other only through the
//! JSON files in `stage_files`.
mod analyze;
mod context;
mod draft;
mod manual;
mod search;
mod stage_files;

pub use analyze::run_analyze;
pub(crate) use context::PipelineContext;
pub use draft::run_draft;
pub use manual::{run_forget, run_mark, run_status};
pub use search::run_search;
