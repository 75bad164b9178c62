//! Typed view over marketplace project payloads.
//!
//! Only the fields the pipeline reads are typed; everything else rides along
//! in `extra` so stage files pass the marketplace payload through unchanged.
use crate::error::{ScoutError, ScoutResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

pub const PROJECT_URL_BASE: &str = "https://www.freelancer.com/projects/";

const DACH_CODES: [&str; 3] = ["DE", "AT", "CH"];
const DACH_NAMES: [&str; 3] = ["germany", "austria", "switzerland"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<Budget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<Currency>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bid_stats: Option<BidStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_submitted: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitdate: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub jobs: Vec<Job>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<Currency>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Currency {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BidStats {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bid_count: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<Country>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Country {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Job {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo_url: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The marketplace sends `null` for some empty fields.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl Project {
    /// Parse one marketplace payload. Items without a numeric id or with
    /// mistyped known fields are rejected as validation failures.
    pub fn from_value(value: Value) -> ScoutResult<Self> {
        let hint = value
            .get("id")
            .map(Value::to_string)
            .unwrap_or_else(|| "<no id>".to_string());
        serde_json::from_value(value)
            .map_err(|err| ScoutError::validation("project", format!("{hint}: {err}")))
    }

    /// Full description, falling back to the preview text search results carry.
    pub fn description_text(&self) -> Option<&str> {
        self.description
            .as_deref()
            .or(self.preview_description.as_deref())
            .filter(|text| !text.trim().is_empty())
    }

    /// Average of the stated budget bounds; one bound alone is used as-is.
    pub fn budget_amount(&self) -> Option<f64> {
        let budget = self.budget.as_ref()?;
        match (budget.minimum, budget.maximum) {
            (Some(min), Some(max)) => Some((min + max) / 2.0),
            (Some(value), None) | (None, Some(value)) => Some(value),
            (None, None) => None,
        }
    }

    pub fn currency_code(&self) -> Option<&str> {
        self.currency
            .as_ref()
            .and_then(|currency| currency.code.as_deref())
            .or_else(|| {
                self.budget
                    .as_ref()
                    .and_then(|budget| budget.currency.as_ref())
                    .and_then(|currency| currency.code.as_deref())
            })
    }

    pub fn bid_count(&self) -> Option<u64> {
        self.bid_stats.as_ref().and_then(|stats| stats.bid_count)
    }

    pub fn posted_at(&self) -> Option<DateTime<Utc>> {
        let secs = self
            .time_submitted
            .filter(|secs| *secs > 0)
            .or(self.submitdate.filter(|secs| *secs > 0))?;
        DateTime::from_timestamp(secs, 0)
    }

    /// Country code when known, otherwise the country name.
    pub fn country(&self) -> Option<&str> {
        let country = self.location.as_ref()?.country.as_ref()?;
        country
            .code
            .as_deref()
            .filter(|code| !code.is_empty())
            .or(country.name.as_deref().filter(|name| !name.is_empty()))
    }

    pub fn is_dach(&self) -> bool {
        let Some(country) = self.location.as_ref().and_then(|loc| loc.country.as_ref()) else {
            return false;
        };
        if let Some(code) = country.code.as_deref() {
            if DACH_CODES.contains(&code) {
                return true;
            }
        }
        country
            .name
            .as_deref()
            .map(|name| DACH_NAMES.contains(&name.to_lowercase().as_str()))
            .unwrap_or(false)
    }

    pub fn skill_names(&self) -> impl Iterator<Item = &str> {
        self.jobs
            .iter()
            .filter_map(|job| job.name.as_deref().or(job.seo_url.as_deref()))
    }

    pub fn url(&self) -> Option<String> {
        self.seo_url
            .as_deref()
            .filter(|slug| !slug.is_empty())
            .map(|slug| format!("{PROJECT_URL_BASE}{slug}"))
    }
}
