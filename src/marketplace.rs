//! Marketplace collaborator: project search and detail lookup.
use crate::error::{ScoutError, ScoutResult};
use crate::project::Project;
use serde::Deserialize;
use serde_json::Value;
use std::env;
use std::time::{Duration, Instant};

pub const API_BASE: &str = "https://www.freelancer.com/api";
pub const MARKETPLACE_TIMEOUT: Duration = Duration::from_secs(10);

const COLLABORATOR: &str = "marketplace";

/// One page of an active-project search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchQuery {
    pub query: Option<String>,
    pub languages: Vec<String>,
    pub countries: Vec<String>,
    pub job_ids: Vec<u64>,
    pub limit: u32,
    pub offset: u32,
}

pub trait Marketplace {
    /// Raw project payloads for one page; parsing is left to the caller so a
    /// single malformed item does not sink the page.
    fn search(&self, query: &SearchQuery) -> ScoutResult<Vec<Value>>;

    fn project_details(&self, id: u64) -> ScoutResult<Project>;
}

#[derive(Deserialize)]
struct Envelope<T> {
    result: Option<T>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct ProjectsResult {
    projects: Option<Vec<Value>>,
}

pub struct FreelancerClient {
    agent: ureq::Agent,
    base_url: String,
    api_key: Option<String>,
    oauth_token: Option<String>,
}

impl FreelancerClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        oauth_token: Option<String>,
        timeout: Duration,
    ) -> ScoutResult<Self> {
        if api_key.is_none() && oauth_token.is_none() {
            return Err(ScoutError::Config(
                "marketplace credentials missing (set FREELANCER_API_KEY or FREELANCER_OAUTH_TOKEN)"
                    .to_string(),
            ));
        }
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        Ok(Self {
            agent: ureq::Agent::new_with_config(config),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            oauth_token,
        })
    }

    pub fn from_env() -> ScoutResult<Self> {
        let read = |name: &str| env::var(name).ok().filter(|value| !value.trim().is_empty());
        Self::new(
            API_BASE,
            read("FREELANCER_API_KEY"),
            read("FREELANCER_OAUTH_TOKEN"),
            MARKETPLACE_TIMEOUT,
        )
    }

    fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> ScoutResult<T> {
        let url = format!("{}{path}", self.base_url);
        let mut request = self
            .agent
            .get(&url)
            .header("Accept", "application/json")
            .query_pairs(params.iter().map(|(key, value)| (key.as_str(), value.as_str())));
        if let Some(key) = &self.api_key {
            request = request.header("Freelancer-Developer-OAuth-Client-Id", key.as_str());
        }
        if let Some(token) = &self.oauth_token {
            request = request.header("freelancer-oauth-v1", token.as_str());
        }
        let start = Instant::now();
        let mut response = request
            .call()
            .map_err(|err| ScoutError::collaborator(COLLABORATOR, format!("GET {path}: {err}")))?;
        let envelope: Envelope<T> = response.body_mut().read_json().map_err(|err| {
            ScoutError::collaborator(COLLABORATOR, format!("decode {path}: {err}"))
        })?;
        tracing::debug!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            path,
            "marketplace request"
        );
        envelope_result(envelope, path)
    }
}

fn envelope_result<T>(envelope: Envelope<T>, path: &str) -> ScoutResult<T> {
    envelope.result.ok_or_else(|| {
        let detail = envelope
            .message
            .unwrap_or_else(|| "response has no result".to_string());
        ScoutError::collaborator(COLLABORATOR, format!("GET {path}: {detail}"))
    })
}

/// Query parameters for the active-project search endpoint.
pub fn search_params(query: &SearchQuery) -> Vec<(String, String)> {
    let mut params = vec![
        ("compact".to_string(), "true".to_string()),
        ("limit".to_string(), query.limit.to_string()),
        ("offset".to_string(), query.offset.to_string()),
    ];
    if let Some(text) = query.query.as_deref().filter(|text| !text.is_empty()) {
        params.push(("query".to_string(), text.to_string()));
    }
    for language in &query.languages {
        params.push(("languages[]".to_string(), language.clone()));
    }
    for country in &query.countries {
        params.push(("countries[]".to_string(), country.clone()));
    }
    for job in &query.job_ids {
        params.push(("jobs[]".to_string(), job.to_string()));
    }
    params
}

impl Marketplace for FreelancerClient {
    fn search(&self, query: &SearchQuery) -> ScoutResult<Vec<Value>> {
        let result: ProjectsResult =
            self.get("/projects/0.1/projects/active/", &search_params(query))?;
        result.projects.ok_or_else(|| {
            ScoutError::collaborator(COLLABORATOR, "search response is missing result.projects")
        })
    }

    fn project_details(&self, id: u64) -> ScoutResult<Project> {
        let params = [
            ("full_description".to_string(), "true".to_string()),
            ("job_details".to_string(), "true".to_string()),
        ];
        let value: Value = self.get(&format!("/projects/0.1/projects/{id}/"), &params)?;
        Project::from_value(value)
    }
}
