use super::{filter_projects, FilterConfig, RejectReason};
use crate::project::Project;
use crate::store::{Status, StatusStore};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::json;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0)
        .single()
        .expect("valid timestamp")
}

fn project(id: u64, title: &str) -> Project {
    Project::from_value(json!({"id": id, "title": title})).expect("project")
}

fn with_budget(id: u64, title: &str, amount: f64) -> Project {
    Project::from_value(json!({
        "id": id,
        "title": title,
        "budget": {"minimum": amount, "maximum": amount}
    }))
    .expect("project")
}

fn reasons(outcome: &super::FilterOutcome) -> Vec<(u64, RejectReason)> {
    outcome
        .rejected
        .iter()
        .map(|rejection| (rejection.project.id, rejection.reason))
        .collect()
}

fn kept_ids(outcome: &super::FilterOutcome) -> Vec<u64> {
    outcome.kept.iter().map(|project| project.id).collect()
}

#[test]
fn seen_projects_are_duplicates_regardless_of_other_properties() {
    let mut store = StatusStore::new("unused.json");
    store.mark(1, Status::BidSent, now());
    store.mark(2, Status::SeenOnly, now());
    let config = FilterConfig {
        blacklist_keywords: vec!["wordpress".into()],
        min_budget: Some(100.0),
        ..FilterConfig::default()
    };
    let candidates = vec![
        with_budget(1, "WordPress plugin", 5.0),
        with_budget(2, "Rust CLI", 500.0),
        with_budget(3, "Rust CLI", 500.0),
    ];

    let outcome = filter_projects(candidates, &config, &store, now(), false);
    assert_eq!(kept_ids(&outcome), vec![3]);
    assert_eq!(
        reasons(&outcome),
        vec![(1, RejectReason::Duplicate), (2, RejectReason::Duplicate)]
    );
}

#[test]
fn include_seen_skips_the_duplicate_check_only() {
    let mut store = StatusStore::new("unused.json");
    store.mark(1, Status::SeenOnly, now());
    store.mark(2, Status::SeenOnly, now());
    let config = FilterConfig {
        blacklist_keywords: vec!["shopify".into()],
        ..FilterConfig::default()
    };
    let candidates = vec![project(1, "Rust CLI"), project(2, "Shopify theme")];

    let outcome = filter_projects(candidates, &config, &store, now(), true);
    assert_eq!(kept_ids(&outcome), vec![1]);
    assert_eq!(reasons(&outcome), vec![(2, RejectReason::Blacklisted)]);
}

#[test]
fn blacklist_matching_ignores_case_on_both_sides() {
    let store = StatusStore::new("unused.json");
    for keyword in ["wordpress", "WORDPRESS", "  WordPress "] {
        let config = FilterConfig {
            blacklist_keywords: vec![keyword.to_string()],
            ..FilterConfig::default()
        };
        let outcome = filter_projects(
            vec![project(1, "WordPress theme edits")],
            &config,
            &store,
            now(),
            false,
        );
        assert_eq!(reasons(&outcome), vec![(1, RejectReason::Blacklisted)], "{keyword}");
    }
}

#[test]
fn blacklist_checks_description_and_skills() {
    let store = StatusStore::new("unused.json");
    let config = FilterConfig {
        blacklist_keywords: vec!["crypto".into(), "wix".into()],
        ..FilterConfig::default()
    };
    let in_description = Project::from_value(json!({
        "id": 1, "title": "Landing page", "preview_description": "Launch page for a CRYPTO token"
    }))
    .expect("project");
    let in_skills = Project::from_value(json!({
        "id": 2, "title": "Site fixes", "jobs": [{"name": "Wix"}]
    }))
    .expect("project");
    let clean = project(3, "Data pipeline");

    let outcome = filter_projects(vec![in_description, in_skills, clean], &config, &store, now(), false);
    assert_eq!(kept_ids(&outcome), vec![3]);
    assert_eq!(
        reasons(&outcome),
        vec![(1, RejectReason::Blacklisted), (2, RejectReason::Blacklisted)]
    );
}

#[test]
fn blank_blacklist_keywords_match_nothing() {
    let store = StatusStore::new("unused.json");
    let config = FilterConfig {
        blacklist_keywords: vec!["".into(), "   ".into()],
        ..FilterConfig::default()
    };
    let outcome = filter_projects(vec![project(1, "Anything")], &config, &store, now(), false);
    assert_eq!(kept_ids(&outcome), vec![1]);
}

#[test]
fn budget_bounds_are_inclusive_and_missing_budget_is_kept() {
    let store = StatusStore::new("unused.json");
    let config = FilterConfig {
        min_budget: Some(100.0),
        max_budget: Some(2000.0),
        ..FilterConfig::default()
    };
    let candidates = vec![
        with_budget(1, "at min", 100.0),
        with_budget(2, "at max", 2000.0),
        with_budget(3, "below", 99.0),
        with_budget(4, "above", 2001.0),
        project(5, "no budget"),
    ];

    let outcome = filter_projects(candidates, &config, &store, now(), false);
    assert_eq!(kept_ids(&outcome), vec![1, 2, 5]);
    assert_eq!(
        reasons(&outcome),
        vec![
            (3, RejectReason::BudgetOutOfRange),
            (4, RejectReason::BudgetOutOfRange)
        ]
    );
}

#[test]
fn age_check_uses_posting_time_and_configured_window() {
    let store = StatusStore::new("unused.json");
    let config = FilterConfig {
        posted_within_hours: Some(24),
        ..FilterConfig::default()
    };
    let posted = |id: u64, hours_ago: i64| {
        Project::from_value(json!({
            "id": id,
            "title": "job",
            "time_submitted": (now() - Duration::hours(hours_ago)).timestamp()
        }))
        .expect("project")
    };
    let candidates = vec![
        posted(1, 2),
        posted(2, 24),
        posted(3, 25),
        project(4, "no timestamp"),
    ];

    let outcome = filter_projects(candidates, &config, &store, now(), false);
    assert_eq!(kept_ids(&outcome), vec![1, 2, 4]);
    assert_eq!(reasons(&outcome), vec![(3, RejectReason::TooOld)]);
}

#[test]
fn zero_hour_window_disables_the_age_check() {
    let store = StatusStore::new("unused.json");
    let config = FilterConfig {
        posted_within_hours: Some(0),
        ..FilterConfig::default()
    };
    let old = Project::from_value(json!({"id": 1, "title": "old", "time_submitted": 1_000_000}))
        .expect("project");
    let outcome = filter_projects(vec![old], &config, &store, now(), false);
    assert_eq!(kept_ids(&outcome), vec![1]);
}

#[test]
fn bid_count_bounds() {
    let store = StatusStore::new("unused.json");
    let config = FilterConfig {
        min_bids: Some(1),
        max_bids: Some(20),
        ..FilterConfig::default()
    };
    let bids = |id: u64, count: u64| {
        Project::from_value(json!({"id": id, "title": "job", "bid_stats": {"bid_count": count}}))
            .expect("project")
    };
    let candidates = vec![bids(1, 0), bids(2, 1), bids(3, 20), bids(4, 21), project(5, "none")];

    let outcome = filter_projects(candidates, &config, &store, now(), false);
    assert_eq!(kept_ids(&outcome), vec![2, 3, 5]);
    assert_eq!(
        reasons(&outcome),
        vec![
            (1, RejectReason::BidCountOutOfRange),
            (4, RejectReason::BidCountOutOfRange)
        ]
    );
}

#[test]
fn required_skills_must_intersect_case_insensitively() {
    let store = StatusStore::new("unused.json");
    let config = FilterConfig {
        required_skills: vec!["Rust".into(), "python".into()],
        ..FilterConfig::default()
    };
    let skilled = |id: u64, skills: &[&str]| {
        let jobs: Vec<_> = skills.iter().map(|name| json!({"name": name})).collect();
        Project::from_value(json!({"id": id, "title": "job", "jobs": jobs})).expect("project")
    };
    let candidates = vec![
        skilled(1, &["PYTHON", "Django"]),
        skilled(2, &["PHP"]),
        skilled(3, &[]),
    ];

    let outcome = filter_projects(candidates, &config, &store, now(), false);
    assert_eq!(kept_ids(&outcome), vec![1, 3]);
    assert_eq!(reasons(&outcome), vec![(2, RejectReason::MissingRequiredSkill)]);
}

#[test]
fn first_matching_reason_wins_in_fixed_order() {
    let store = StatusStore::new("unused.json");
    let config = FilterConfig {
        blacklist_keywords: vec!["logo".into()],
        min_budget: Some(100.0),
        max_bids: Some(5),
        required_skills: vec!["rust".into()],
        ..FilterConfig::default()
    };
    let everything_wrong = Project::from_value(json!({
        "id": 1,
        "title": "Logo design",
        "budget": {"minimum": 10.0, "maximum": 20.0},
        "bid_stats": {"bid_count": 80},
        "jobs": [{"name": "Graphic Design"}]
    }))
    .expect("project");
    let budget_and_bids = Project::from_value(json!({
        "id": 2,
        "title": "Small script",
        "budget": {"minimum": 10.0, "maximum": 20.0},
        "bid_stats": {"bid_count": 80}
    }))
    .expect("project");

    let outcome = filter_projects(vec![everything_wrong, budget_and_bids], &config, &store, now(), false);
    assert_eq!(
        reasons(&outcome),
        vec![(1, RejectReason::Blacklisted), (2, RejectReason::BudgetOutOfRange)]
    );
}

#[test]
fn repeated_ids_within_a_batch_are_duplicates() {
    let store = StatusStore::new("unused.json");
    let config = FilterConfig::default();
    let outcome = filter_projects(
        vec![project(1, "first"), project(1, "again"), project(2, "other")],
        &config,
        &store,
        now(),
        false,
    );
    assert_eq!(kept_ids(&outcome), vec![1, 2]);
    assert_eq!(outcome.kept[0].title, "first");
    assert_eq!(reasons(&outcome), vec![(1, RejectReason::Duplicate)]);
}

#[test]
fn filtering_twice_without_saving_is_idempotent() {
    let mut store = StatusStore::new("unused.json");
    store.mark(4, Status::Analyzed, now());
    let config = FilterConfig {
        blacklist_keywords: vec!["wordpress".into()],
        min_budget: Some(100.0),
        max_budget: Some(2000.0),
        posted_within_hours: Some(48),
        ..FilterConfig::default()
    };
    let candidates = vec![
        with_budget(1, "API work", 150.0),
        with_budget(2, "Wordpress site", 300.0),
        with_budget(3, "Tiny fix", 50.0),
        with_budget(4, "Seen before", 500.0),
    ];

    let first = filter_projects(candidates.clone(), &config, &store, now(), false);
    let second = filter_projects(candidates, &config, &store, now(), false);
    assert_eq!(first, second);
}

#[test]
fn config_validation_rejects_inverted_bounds() {
    let inverted_budget = FilterConfig {
        min_budget: Some(500.0),
        max_budget: Some(100.0),
        ..FilterConfig::default()
    };
    assert!(inverted_budget.validate().is_err());

    let inverted_bids = FilterConfig {
        min_bids: Some(10),
        max_bids: Some(1),
        ..FilterConfig::default()
    };
    assert!(inverted_bids.validate().is_err());

    let negative = FilterConfig {
        min_budget: Some(-1.0),
        ..FilterConfig::default()
    };
    assert!(negative.validate().is_err());

    assert!(FilterConfig::default().validate().is_ok());
}

#[test]
fn config_parses_documented_shape_and_refuses_unknown_keys() {
    let config: FilterConfig = serde_json::from_value(json!({
        "blacklist_keywords": ["wordpress"],
        "min_budget": 100,
        "max_budget": 2000,
        "posted_within_hours": 24,
        "min_bids": 0,
        "max_bids": 30,
        "required_skills": ["rust"]
    }))
    .expect("config");
    assert_eq!(config.min_budget, Some(100.0));
    assert_eq!(config.posted_within_hours, Some(24));

    let unknown = serde_json::from_value::<FilterConfig>(json!({"blacklist": ["x"]}));
    assert!(unknown.is_err());
}
