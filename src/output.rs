//! Console listing of a shortlist, newest first.
use crate::project::Project;
use chrono::{DateTime, Duration, Utc};
use std::fmt::Write;

/// Projects posted at most this long ago are flagged `NEW`.
const NEW_WINDOW_MINUTES: i64 = 15;

pub fn format_age(posted: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let delta = now - posted;
    if delta < Duration::minutes(1) {
        "just now".to_string()
    } else if delta < Duration::hours(1) {
        format!("{} min ago", delta.num_minutes())
    } else if delta < Duration::days(1) {
        format!("{} h ago", delta.num_hours())
    } else {
        format!("{} d ago", delta.num_days())
    }
}

fn budget_range(project: &Project) -> Option<String> {
    let budget = project.budget.as_ref()?;
    let range = match (budget.minimum, budget.maximum) {
        (Some(min), Some(max)) => format!("{min:.0}-{max:.0}"),
        (Some(min), None) => format!("from {min:.0}"),
        (None, Some(max)) => format!("up to {max:.0}"),
        (None, None) => return None,
    };
    Some(match project.currency_code() {
        Some(code) => format!("{code} {range}"),
        None => range,
    })
}

/// Header line fields for one project: markers, budget, bids, age, country.
fn header(project: &Project, now: DateTime<Utc>) -> String {
    let posted = project.posted_at();
    let mut parts: Vec<String> = Vec::new();
    if posted.is_some_and(|posted| now - posted <= Duration::minutes(NEW_WINDOW_MINUTES)) {
        parts.push("NEW".to_string());
    }
    if project.is_dach() {
        parts.push("DACH".to_string());
    }
    if let Some(budget) = budget_range(project) {
        parts.push(budget);
    }
    if let Some(bids) = project.bid_count() {
        parts.push(format!("{bids} bids"));
    }
    if let Some(posted) = posted {
        parts.push(format_age(posted, now));
    }
    if let Some(country) = project.country() {
        parts.push(country.to_string());
    }
    parts.join(" | ")
}

/// Render the shortlist sorted newest first; undated projects go last.
pub fn render_shortlist(projects: &[Project], now: DateTime<Utc>) -> String {
    let mut sorted: Vec<&Project> = projects.iter().collect();
    sorted.sort_by(|a, b| b.posted_at().cmp(&a.posted_at()));

    let mut out = String::new();
    for project in sorted {
        let _ = writeln!(out, "[{}] {}", project.id, project.title);
        let header = header(project, now);
        if !header.is_empty() {
            let _ = writeln!(out, "    {header}");
        }
        if let Some(url) = project.url() {
            let _ = writeln!(out, "    {url}");
        }
        out.push('\n');
    }
    out
}
