//! Prompt templates with strict `{PLACEHOLDER}` substitution.
use crate::error::{ScoutError, ScoutResult};
use regex::{Captures, Regex};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use std::sync::LazyLock;

pub const ANALYSIS_PROMPT_MD: &str = include_str!("../prompts/analysis_prompt.md");
pub const BID_PROMPT_MD: &str = include_str!("../prompts/bid_prompt.md");

static PLACEHOLDER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{([A-Z][A-Z0-9_]*)\}").expect("placeholder regex is valid")
});

#[derive(Debug, Clone)]
pub struct PromptTemplate {
    name: String,
    text: String,
}

impl PromptTemplate {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }

    /// Load a user-supplied template file; the file name becomes its name.
    pub fn load(path: &Path) -> ScoutResult<Self> {
        let text = fs::read_to_string(path).map_err(|err| ScoutError::io(path, err))?;
        Ok(Self::new(path.display().to_string(), text))
    }

    /// The built-in template, or the file at `path` when one is given.
    pub fn load_or_builtin(path: Option<&Path>, name: &str, builtin: &str) -> ScoutResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::new(name, builtin)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn placeholders(&self) -> BTreeSet<&str> {
        PLACEHOLDER_RE
            .captures_iter(&self.text)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
            .collect()
    }

    /// Fail unless every placeholder in the template has a value in `values`.
    pub fn ensure_placeholders(&self, values: &BTreeMap<&str, String>) -> ScoutResult<()> {
        match self
            .placeholders()
            .into_iter()
            .find(|placeholder| !values.contains_key(placeholder))
        {
            Some(placeholder) => Err(ScoutError::MissingPlaceholder {
                template: self.name.clone(),
                placeholder: placeholder.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Substitute every placeholder in one pass; substituted values are not
    /// rescanned, so project text containing `{NAME}` stays literal.
    pub fn render(&self, values: &BTreeMap<&str, String>) -> ScoutResult<String> {
        self.ensure_placeholders(values)?;
        let rendered = PLACEHOLDER_RE.replace_all(&self.text, |caps: &Captures| {
            values
                .get(&caps[1])
                .cloned()
                .unwrap_or_else(|| caps[0].to_string())
        });
        Ok(rendered.into_owned())
    }
}
