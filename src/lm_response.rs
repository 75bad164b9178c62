//! Validated model payloads for the analyze and draft stages.
//!
//! Required fields must be present and non-empty; optional fields get
//! documented defaults. A payload that fails validation is an error for that
//! item, never a placeholder result.
use crate::error::{ScoutError, ScoutResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The JSON payload of a model reply: the body of the first fenced block if
/// there is one, else the outermost `{...}` span, else the trimmed text.
pub fn extract_json(text: &str) -> &str {
    let text = text.trim();
    fenced_block(text)
        .or_else(|| object_span(text))
        .unwrap_or(text)
}

/// Body of the first ``` fence. An info string such as `json` on the
/// opening line is dropped.
fn fenced_block(text: &str) -> Option<&str> {
    let (_, opened) = text.split_once("```")?;
    let body = match opened.split_once('\n') {
        Some((info, rest)) if info.trim().chars().all(|c| c.is_ascii_alphanumeric()) => rest,
        _ => opened.strip_prefix("json").unwrap_or(opened),
    };
    let (body, _) = body.split_once("```")?;
    Some(body.trim()).filter(|body| !body.is_empty())
}

fn object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

fn parse_object(text: &str, what: &'static str) -> ScoutResult<serde_json::Map<String, Value>> {
    let json_text = extract_json(text);
    match serde_json::from_str::<Value>(json_text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(ScoutError::validation(
            what,
            format!("expected a JSON object, got {}", kind_of(&other)),
        )),
        Err(err) => Err(ScoutError::validation(
            what,
            format!("model reply is not JSON: {err}"),
        )),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn required_text(
    map: &serde_json::Map<String, Value>,
    key: &str,
    what: &'static str,
) -> ScoutResult<String> {
    match map.get(key) {
        Some(Value::String(text)) if !text.trim().is_empty() => Ok(text.trim().to_string()),
        Some(Value::String(_)) => Err(ScoutError::validation(what, format!("{key} is empty"))),
        Some(other) => Err(ScoutError::validation(
            what,
            format!("{key} must be a string, got {}", kind_of(other)),
        )),
        None => Err(ScoutError::validation(what, format!("missing {key}"))),
    }
}

fn optional_text(map: &serde_json::Map<String, Value>, key: &str) -> String {
    match map.get(key) {
        Some(Value::String(text)) => text.trim().to_string(),
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join("; "),
        _ => String::new(),
    }
}

/// Scores arrive as numbers or numeric strings; anything else is rejected.
fn score(
    map: &serde_json::Map<String, Value>,
    key: &str,
    what: &'static str,
) -> ScoutResult<Option<f64>> {
    let value = match map.get(key) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(number)) => number.as_f64(),
        Some(Value::String(text)) => text.trim().trim_end_matches('%').parse::<f64>().ok(),
        Some(_) => None,
    };
    match value {
        Some(value) if value.is_finite() && (0.0..=100.0).contains(&value) => Ok(Some(value)),
        Some(value) => Err(ScoutError::validation(
            what,
            format!("{key} {value} is outside 0..=100"),
        )),
        None => Err(ScoutError::validation(what, format!("{key} is not a number"))),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    pub summary: String,
    pub category: String,
    pub rough_score: f64,
    #[serde(default)]
    pub automation_potential: f64,
    #[serde(default)]
    pub manual_work_notes: String,
    #[serde(default)]
    pub reasons: String,
    #[serde(default)]
    pub risks: String,
}

/// Validate an analysis reply. `summary`, `category` and `rough_score` are
/// required; `automation_potential` defaults to 0 and the notes to "".
pub fn parse_analysis(text: &str) -> ScoutResult<Analysis> {
    const WHAT: &str = "analysis";
    let map = parse_object(text, WHAT)?;
    let rough_score =
        score(&map, "rough_score", WHAT)?.ok_or_else(|| ScoutError::validation(WHAT, "missing rough_score"))?;
    Ok(Analysis {
        summary: required_text(&map, "summary", WHAT)?,
        category: required_text(&map, "category", WHAT)?.to_lowercase(),
        rough_score,
        automation_potential: score(&map, "automation_potential", WHAT)?.unwrap_or(0.0),
        manual_work_notes: optional_text(&map, "manual_work_notes"),
        reasons: optional_text(&map, "reasons"),
        risks: optional_text(&map, "risks"),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilestonePlan {
    pub size: String,
    pub count: u32,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BidDraft {
    pub proposal_text: String,
    pub milestone_plan: MilestonePlan,
    #[serde(default)]
    pub free_demo_offered: bool,
    #[serde(default)]
    pub free_demo_reason: String,
}

/// Validate a draft reply. Only `proposal_text` is required; a missing or
/// partial `milestone_plan` is completed from `default_plan`.
pub fn parse_bid_draft(text: &str, default_plan: &MilestonePlan) -> ScoutResult<BidDraft> {
    const WHAT: &str = "bid draft";
    let map = parse_object(text, WHAT)?;
    let proposal_text = required_text(&map, "proposal_text", WHAT)?;
    let milestone_plan = match map.get("milestone_plan") {
        None | Some(Value::Null) => default_plan.clone(),
        Some(Value::Object(plan)) => milestone_plan(plan, default_plan)?,
        Some(other) => {
            return Err(ScoutError::validation(
                WHAT,
                format!("milestone_plan must be an object, got {}", kind_of(other)),
            ))
        }
    };
    let free_demo_offered = match map.get("free_demo_offered") {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(other) => {
            return Err(ScoutError::validation(
                WHAT,
                format!("free_demo_offered must be a boolean, got {}", kind_of(other)),
            ))
        }
    };
    Ok(BidDraft {
        proposal_text,
        milestone_plan,
        free_demo_offered,
        free_demo_reason: optional_text(&map, "free_demo_reason"),
    })
}

fn milestone_plan(
    plan: &serde_json::Map<String, Value>,
    default_plan: &MilestonePlan,
) -> ScoutResult<MilestonePlan> {
    const WHAT: &str = "milestone plan";
    let size = match plan.get("size").and_then(Value::as_str) {
        Some(size) if !size.trim().is_empty() => size.trim().to_string(),
        _ => default_plan.size.clone(),
    };
    let milestones: Vec<Milestone> = match plan.get("milestones") {
        None | Some(Value::Null) => Vec::new(),
        Some(value) => serde_json::from_value(value.clone())
            .map_err(|err| ScoutError::validation(WHAT, format!("milestones: {err}")))?,
    };
    let count = plan
        .get("count")
        .and_then(Value::as_u64)
        .and_then(|count| u32::try_from(count).ok())
        .unwrap_or_else(|| {
            if milestones.is_empty() {
                default_plan.count
            } else {
                u32::try_from(milestones.len()).unwrap_or(u32::MAX)
            }
        });
    Ok(MilestonePlan {
        size,
        count,
        milestones,
    })
}
