//! End-to-end runs of the `jobscout` binary against a private data directory.
//!
//! Search replays saved candidates; analyze and draft talk to a shell
//! command standing in for the model, so no network access is needed.

mod common;

use common::{have_sh, Fixture};
use serde_json::json;
use std::fs;

fn seed_search_inputs(fx: &Fixture) {
    fx.write_json(
        &fx.data_dir().join("filters.json"),
        &json!({
            "blacklist_keywords": ["wordpress"],
            "min_budget": 100,
            "max_budget": 2000
        }),
    );
    fx.write_json(
        &fx.path("candidates.json"),
        &json!({
            "status": "success",
            "result": {"projects": [
                {"id": 101, "title": "Data pipeline in Rust", "seo_url": "rust/data-pipeline",
                 "preview_description": "Build an ETL job for our shop data.",
                 "budget": {"minimum": 100, "maximum": 200}},
                {"id": 102, "title": "WordPress site", "budget": {"minimum": 300, "maximum": 300}},
                {"id": 103, "title": "Quick fix", "budget": {"minimum": 50, "maximum": 50}}
            ]}
        }),
    );
}

fn search_args<'a>(candidates: &'a str, shortlist: &'a str) -> Vec<&'a str> {
    vec![
        "search",
        "--candidates",
        candidates,
        "--output-json",
        shortlist,
        "--json",
    ]
}

#[test]
fn search_shortlists_once_and_reports_duplicates_on_rerun() {
    let fx = Fixture::new();
    seed_search_inputs(&fx);
    let candidates = fx.path("candidates.json").display().to_string();
    let shortlist = fx.path("shortlist.json").display().to_string();

    let first = fx.run_json(&search_args(&candidates, &shortlist));
    assert_eq!(first["kept"], 1);
    assert_eq!(first["rejected"]["blacklisted"], 1);
    assert_eq!(first["rejected"]["budget_out_of_range"], 1);

    let written = fx.read_json(&fx.path("shortlist.json"));
    assert_eq!(written["count"], 1);
    assert_eq!(written["projects"][0]["id"], 101);
    assert_eq!(written["projects"][0]["preview_description"], "Build an ETL job for our shop data.");

    let store = fx.read_json(&fx.store_path());
    assert_eq!(store["101"]["status"], "seen_only");
    assert!(store.get("102").is_none());
    assert!(store.get("103").is_none());

    let second = fx.run_json(&search_args(&candidates, &shortlist));
    assert_eq!(second["kept"], 0);
    assert_eq!(second["rejected"]["duplicate"], 1);
    assert!(second.get("output").is_none());
    assert_eq!(fx.read_json(&fx.path("shortlist.json"))["count"], 1);
}

#[test]
fn corrupt_store_stops_the_run_and_is_left_alone() {
    let fx = Fixture::new();
    seed_search_inputs(&fx);
    fs::write(fx.store_path(), "{\"101\": {\"status\": ").expect("write corrupt store");
    let candidates = fx.path("candidates.json").display().to_string();
    let shortlist = fx.path("shortlist.json").display().to_string();

    let output = fx.run(&search_args(&candidates, &shortlist));

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("corrupt"), "{stderr}");
    assert_eq!(
        fs::read_to_string(fx.store_path()).expect("read store"),
        "{\"101\": {\"status\": "
    );
    assert!(!fx.path("shortlist.json").exists());
}

#[test]
fn manual_commands_update_and_report_the_store() {
    let fx = Fixture::new();

    assert!(fx.run(&["mark", "--id", "5", "--status", "bid_sent"]).status.success());
    let status = fx.run_json(&["status", "--json"]);
    assert_eq!(status["total"], 1);
    assert_eq!(status["counts"]["bid_sent"], 1);
    assert_eq!(status["counts"]["seen_only"], 0);

    let refused = fx.run(&["mark", "--id", "5", "--status", "analyzed"]);
    assert!(!refused.status.success());
    assert!(String::from_utf8_lossy(&refused.stderr).contains("--force"));
    assert_eq!(fx.read_json(&fx.store_path())["5"]["status"], "bid_sent");

    let forced = fx.run(&["mark", "--id", "5", "--status", "analyzed", "--force"]);
    assert!(forced.status.success());
    assert_eq!(fx.read_json(&fx.store_path())["5"]["status"], "analyzed");

    assert!(fx.run(&["forget", "--id", "5"]).status.success());
    assert_eq!(fx.run_json(&["status", "--json"])["total"], 0);
    assert!(!fx.run(&["forget", "--id", "5"]).status.success());
}

#[test]
fn unknown_status_is_a_usage_error() {
    let fx = Fixture::new();
    let output = fx.run(&["mark", "--id", "5", "--status", "won"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown status"));
    assert!(!fx.store_path().exists());
}

#[test]
fn analyze_then_draft_with_a_local_model_command() {
    if !have_sh() {
        return;
    }
    let mut fx = Fixture::new();
    seed_search_inputs(&fx);
    let candidates = fx.path("candidates.json").display().to_string();
    let shortlist = fx.path("shortlist.json").display().to_string();
    fx.run_json(&search_args(&candidates, &shortlist));

    fx.answer_with(
        "Here is my assessment:\n```json\n{\"summary\": \"ETL job\", \"category\": \"data\", \"rough_score\": 78, \"automation_potential\": 40}\n```\n",
    );
    let analysis = fx.path("analysis.json").display().to_string();
    let summary = fx.run_json(&[
        "analyze",
        "--input-json",
        &shortlist,
        "--output-json",
        &analysis,
        "--json",
    ]);
    assert_eq!(summary["kept"], 1);
    let written = fx.read_json(&fx.path("analysis.json"));
    assert_eq!(written["results"][0]["id"], 101);
    assert_eq!(written["results"][0]["analysis"]["rough_score"], 78.0);
    assert_eq!(fx.read_json(&fx.store_path())["101"]["status"], "analyzed");

    let rerun = fx.run_json(&["analyze", "--input-json", &shortlist, "--json"]);
    assert_eq!(rerun["kept"], 0);
    assert_eq!(rerun["skipped"], 1);

    fx.answer_with(r#"{"proposal_text": "I have built several ETL pipelines in Rust."}"#);
    let bids = fx.path("bids.json").display().to_string();
    let summary = fx.run_json(&[
        "draft",
        "--input-json",
        &analysis,
        "--output-json",
        &bids,
        "--json",
    ]);
    assert_eq!(summary["kept"], 1);
    let written = fx.read_json(&fx.path("bids.json"));
    let bid = &written["generated_bids"][0];
    assert_eq!(bid["profile"], "web");
    assert_eq!(
        bid["project_url"],
        "https://www.freelancer.com/projects/rust/data-pipeline"
    );
    assert_eq!(bid["bid"]["milestone_plan"]["size"], "small");
    assert_eq!(bid["bid"]["milestone_plan"]["count"], 2);
    assert_eq!(fx.read_json(&fx.store_path())["101"]["status"], "bid_drafted");
}

#[test]
fn unusable_model_replies_are_reported_without_aborting() {
    if !have_sh() {
        return;
    }
    let mut fx = Fixture::new();
    seed_search_inputs(&fx);
    let candidates = fx.path("candidates.json").display().to_string();
    let shortlist = fx.path("shortlist.json").display().to_string();
    fx.run_json(&search_args(&candidates, &shortlist));

    fx.answer_with("{\"summary\": \"missing the score\", \"category\": \"data\"}");
    let summary = fx.run_json(&["analyze", "--input-json", &shortlist, "--json"]);

    assert_eq!(summary["kept"], 0);
    assert_eq!(summary["errored"][0]["id"], 101);
    assert!(summary.get("output").is_none());
    assert!(!fx.data_dir().join("analysis_shortlist.json").exists());
    assert_eq!(fx.read_json(&fx.store_path())["101"]["status"], "seen_only");
}

#[test]
fn analyze_without_a_model_backend_fails_fast() {
    let fx = Fixture::new();
    seed_search_inputs(&fx);
    let candidates = fx.path("candidates.json").display().to_string();
    let shortlist = fx.path("shortlist.json").display().to_string();
    fx.run_json(&search_args(&candidates, &shortlist));

    let output = fx.run(&["analyze", "--input-json", &shortlist]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("no model backend configured"));
    assert_eq!(fx.read_json(&fx.store_path())["101"]["status"], "seen_only");
}
