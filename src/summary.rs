//! Per-run summary printed by every pipeline stage.
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub stage: &'static str,
    /// Items that went through the stage and produced output.
    pub kept: usize,
    /// Items passed over without a collaborator call (already processed,
    /// over the limit).
    pub skipped: usize,
    pub rejected: BTreeMap<String, usize>,
    pub errored: Vec<ItemError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
}

impl RunSummary {
    pub fn new(stage: &'static str) -> Self {
        Self {
            stage,
            ..Self::default()
        }
    }

    pub fn reject(&mut self, reason: impl Into<String>) {
        *self.rejected.entry(reason.into()).or_insert(0) += 1;
    }

    pub fn error(&mut self, id: Option<u64>, message: impl fmt::Display) {
        let message = message.to_string();
        tracing::warn!(stage = self.stage, project_id = id, error = %message, "item failed");
        self.errored.push(ItemError { id, message });
    }

    pub fn rejected_total(&self) -> usize {
        self.rejected.values().sum()
    }

    /// Print as text, or as one JSON object when `json` is set.
    pub fn emit(&self, json: bool) -> anyhow::Result<()> {
        if json {
            println!("{}", serde_json::to_string_pretty(self)?);
        } else {
            print!("{self}");
        }
        Ok(())
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}: {} kept, {} skipped, {} rejected, {} errored",
            self.stage,
            self.kept,
            self.skipped,
            self.rejected_total(),
            self.errored.len()
        )?;
        for (reason, count) in &self.rejected {
            writeln!(f, "  rejected {reason}: {count}")?;
        }
        for error in &self.errored {
            match error.id {
                Some(id) => writeln!(f, "  error [{id}]: {}", error.message)?,
                None => writeln!(f, "  error: {}", error.message)?,
            }
        }
        match &self.output {
            Some(path) => writeln!(f, "  wrote {}", path.display()),
            None => writeln!(f, "  no output written"),
        }
    }
}
