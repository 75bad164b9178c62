//! Deterministic shortlist filtering.
//!
//! Each candidate is checked in a fixed order (duplicate, blacklist, budget,
//! age, bid count, skills) and the first failing check becomes its rejection
//! reason. A project missing a field a check needs is not rejected by that
//! check. The function only reads the status store; marking kept projects is
//! the caller's job.
use crate::error::{ScoutError, ScoutResult};
use crate::project::Project;
use crate::store::StatusStore;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterConfig {
    #[serde(default)]
    pub blacklist_keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_budget: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_budget: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub posted_within_hours: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_bids: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_bids: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_skills: Vec<String>,
}

impl FilterConfig {
    pub fn validate(&self) -> ScoutResult<()> {
        for (label, value) in [("min_budget", self.min_budget), ("max_budget", self.max_budget)] {
            if let Some(value) = value {
                if !value.is_finite() || value < 0.0 {
                    return Err(ScoutError::Config(format!(
                        "{label} must be a non-negative number (got {value})"
                    )));
                }
            }
        }
        if let (Some(min), Some(max)) = (self.min_budget, self.max_budget) {
            if min > max {
                return Err(ScoutError::Config(format!(
                    "min_budget {min} is greater than max_budget {max}"
                )));
            }
        }
        if let (Some(min), Some(max)) = (self.min_bids, self.max_bids) {
            if min > max {
                return Err(ScoutError::Config(format!(
                    "min_bids {min} is greater than max_bids {max}"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    Duplicate,
    Blacklisted,
    BudgetOutOfRange,
    TooOld,
    BidCountOutOfRange,
    MissingRequiredSkill,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::Duplicate => "duplicate",
            RejectReason::Blacklisted => "blacklisted",
            RejectReason::BudgetOutOfRange => "budget_out_of_range",
            RejectReason::TooOld => "too_old",
            RejectReason::BidCountOutOfRange => "bid_count_out_of_range",
            RejectReason::MissingRequiredSkill => "missing_required_skill",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rejection {
    pub project: Project,
    pub reason: RejectReason,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOutcome {
    pub kept: Vec<Project>,
    pub rejected: Vec<Rejection>,
}

/// Normalized form of a `FilterConfig` for one evaluation pass.
pub struct Filter<'a> {
    config: &'a FilterConfig,
    store: &'a StatusStore,
    blacklist: Vec<String>,
    required_skills: BTreeSet<String>,
    max_age: Option<Duration>,
    now: DateTime<Utc>,
    include_seen: bool,
}

impl<'a> Filter<'a> {
    /// `include_seen` turns off the duplicate check against the store.
    pub fn new(
        config: &'a FilterConfig,
        store: &'a StatusStore,
        now: DateTime<Utc>,
        include_seen: bool,
    ) -> Self {
        let blacklist = config
            .blacklist_keywords
            .iter()
            .map(|keyword| keyword.trim().to_lowercase())
            .filter(|keyword| !keyword.is_empty())
            .collect();
        let required_skills = config
            .required_skills
            .iter()
            .map(|skill| skill.trim().to_lowercase())
            .filter(|skill| !skill.is_empty())
            .collect();
        let max_age = config
            .posted_within_hours
            .filter(|hours| *hours > 0)
            .and_then(|hours| i64::try_from(hours).ok())
            .and_then(Duration::try_hours);
        Self {
            config,
            store,
            blacklist,
            required_skills,
            max_age,
            now,
            include_seen,
        }
    }

    /// First failing check for `project`, or `None` when it is kept.
    pub fn rejection_reason(&self, project: &Project) -> Option<RejectReason> {
        if !self.include_seen && self.store.is_seen(project.id) {
            return Some(RejectReason::Duplicate);
        }
        if self.is_blacklisted(project) {
            return Some(RejectReason::Blacklisted);
        }
        if !self.budget_in_range(project) {
            return Some(RejectReason::BudgetOutOfRange);
        }
        if self.is_too_old(project) {
            return Some(RejectReason::TooOld);
        }
        if !self.bids_in_range(project) {
            return Some(RejectReason::BidCountOutOfRange);
        }
        if !self.has_required_skill(project) {
            return Some(RejectReason::MissingRequiredSkill);
        }
        None
    }

    fn is_blacklisted(&self, project: &Project) -> bool {
        if self.blacklist.is_empty() {
            return false;
        }
        let mut haystack = project.title.to_lowercase();
        if let Some(description) = project.description_text() {
            haystack.push('\n');
            haystack.push_str(&description.to_lowercase());
        }
        for skill in project.skill_names() {
            haystack.push('\n');
            haystack.push_str(&skill.to_lowercase());
        }
        self.blacklist
            .iter()
            .any(|keyword| haystack.contains(keyword.as_str()))
    }

    fn budget_in_range(&self, project: &Project) -> bool {
        let Some(amount) = project.budget_amount() else {
            return true;
        };
        let above_min = self.config.min_budget.is_none_or(|min| amount >= min);
        let below_max = self.config.max_budget.is_none_or(|max| amount <= max);
        above_min && below_max
    }

    fn is_too_old(&self, project: &Project) -> bool {
        match (self.max_age, project.posted_at()) {
            (Some(max_age), Some(posted)) => self.now - posted > max_age,
            _ => false,
        }
    }

    fn bids_in_range(&self, project: &Project) -> bool {
        let Some(bids) = project.bid_count() else {
            return true;
        };
        let above_min = self.config.min_bids.is_none_or(|min| bids >= min);
        let below_max = self.config.max_bids.is_none_or(|max| bids <= max);
        above_min && below_max
    }

    fn has_required_skill(&self, project: &Project) -> bool {
        if self.required_skills.is_empty() {
            return true;
        }
        let mut skills = project.skill_names().peekable();
        if skills.peek().is_none() {
            return true;
        }
        skills.any(|skill| self.required_skills.contains(&skill.trim().to_lowercase()))
    }
}

/// Split `candidates` into kept and rejected, preserving input order.
///
/// A project id appearing more than once in the same batch is evaluated on its
/// first occurrence only; later copies are rejected as duplicates.
pub fn filter_projects<I>(
    candidates: I,
    config: &FilterConfig,
    store: &StatusStore,
    now: DateTime<Utc>,
    include_seen: bool,
) -> FilterOutcome
where
    I: IntoIterator<Item = Project>,
{
    let filter = Filter::new(config, store, now, include_seen);
    let mut evaluated = HashSet::new();
    let mut outcome = FilterOutcome::default();
    for project in candidates {
        let reason = if evaluated.insert(project.id) {
            filter.rejection_reason(&project)
        } else {
            Some(RejectReason::Duplicate)
        };
        match reason {
            None => outcome.kept.push(project),
            Some(reason) => {
                tracing::debug!(project_id = project.id, %reason, "project rejected");
                outcome.rejected.push(Rejection { project, reason });
            }
        }
    }
    outcome
}

#[cfg(test)]
#[path = "filter_tests.rs"]
mod tests;
