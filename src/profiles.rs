//! Freelancer profile blurbs used to personalise drafted proposals.
//!
//! Built-in profiles cover `web`, `mobile` and `coding`; a `profiles.json`
//! file (`{"profiles": {key: {label, link, general, section}}}`) overrides
//! fields per key or adds new keys such as `hybrid`.
use crate::error::{ScoutError, ScoutResult};
use crate::project::Project;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub general: String,
    #[serde(default)]
    pub section: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ProfileOverride {
    label: Option<String>,
    link: Option<String>,
    general: Option<String>,
    section: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ProfilesFile {
    #[serde(default)]
    profiles: BTreeMap<String, ProfileOverride>,
}

fn builtin(label: &str, general: &str, section: &str) -> Profile {
    Profile {
        label: label.to_string(),
        link: String::new(),
        general: general.to_string(),
        section: section.to_string(),
    }
}

fn default_profiles() -> BTreeMap<String, Profile> {
    let mut profiles = BTreeMap::new();
    profiles.insert(
        "web".to_string(),
        builtin(
            "Full-Stack Web Engineering",
            "Senior engineer building web applications end to end, from data model and API to deployment.",
            "Backend services and REST APIs, React and TypeScript frontends, PostgreSQL, Docker based delivery.",
        ),
    );
    profiles.insert(
        "mobile".to_string(),
        builtin(
            "Mobile Apps",
            "Engineer shipping cross-platform and native mobile apps with their backends.",
            "Flutter and React Native, native Android and iOS, offline sync, store releases.",
        ),
    );
    profiles.insert(
        "coding".to_string(),
        builtin(
            "Automation and Prototyping",
            "Engineer automating workflows and building proof-of-concept tools quickly.",
            "Scripts and CLIs, data pipelines, API integrations, small MVPs.",
        ),
    );
    profiles
}

#[derive(Debug, Clone)]
pub struct ProfileSet {
    profiles: BTreeMap<String, Profile>,
}

impl Default for ProfileSet {
    fn default() -> Self {
        Self {
            profiles: default_profiles(),
        }
    }
}

impl ProfileSet {
    /// Built-in profiles merged with the override file. An explicitly named
    /// file must exist and parse; the default location is optional.
    pub fn load(explicit: Option<&Path>, default_path: &Path) -> ScoutResult<Self> {
        let path = explicit.unwrap_or(default_path);
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound && explicit.is_none() => {
                return Ok(Self::default())
            }
            Err(err) => {
                return Err(ScoutError::Config(format!(
                    "read {}: {err}",
                    path.display()
                )))
            }
        };
        let file: ProfilesFile = serde_json::from_slice(&bytes)
            .map_err(|err| ScoutError::Config(format!("parse {}: {err}", path.display())))?;
        let mut set = Self::default();
        set.merge(file.profiles);
        Ok(set)
    }

    fn merge(&mut self, overrides: BTreeMap<String, ProfileOverride>) {
        for (key, update) in overrides {
            let entry = self.profiles.entry(key).or_default();
            if let Some(label) = update.label {
                entry.label = label;
            }
            if let Some(link) = update.link {
                entry.link = link;
            }
            if let Some(general) = update.general {
                entry.general = general;
            }
            if let Some(section) = update.section {
                entry.section = section;
            }
        }
    }

    /// The profile for `key`. Blank fields fall back to the `web` profile,
    /// except `section`, which stays specific to the key.
    pub fn get(&self, key: &str) -> Profile {
        let fallback = self.profiles.get("web").cloned().unwrap_or_default();
        let profile = self.profiles.get(key).cloned().unwrap_or_default();
        let pick = |value: String, fallback: String| {
            if value.trim().is_empty() {
                fallback
            } else {
                value
            }
        };
        Profile {
            label: pick(profile.label, fallback.label),
            link: pick(profile.link, fallback.link),
            general: pick(profile.general, fallback.general),
            section: profile.section,
        }
    }
}

const HYBRID_CATEGORIES: [&str; 4] = [
    "consulting",
    "strategy",
    "projectmanagement",
    "productmanagement",
];
const HYBRID_KEYWORDS: [&str; 12] = [
    "technology consultant",
    "technical project manager",
    "it project manager",
    "it strategy",
    "digital transformation",
    "business strategy",
    "stakeholder",
    "c-level",
    "executive",
    "global team",
    "bilingual",
    "multilingual",
];
const MOBILE_KEYWORDS: [&str; 4] = ["flutter", "android", "ios", "react native"];
const ERP_KEYWORDS: [&str; 2] = ["odoo", "erp"];
const WEB_CATEGORIES: [&str; 4] = ["fullstack", "webdesign", "data", "devops"];

fn mentions_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| text.contains(keyword))
}

/// Choose a profile key from the analysis category and the project text.
pub fn select_profile_key(category: &str, project: &Project) -> &'static str {
    let category = category.trim().to_lowercase();
    let text = project.description_text().unwrap_or_default().to_lowercase();

    if HYBRID_CATEGORIES.contains(&category.as_str()) || mentions_any(&text, &HYBRID_KEYWORDS) {
        return "hybrid";
    }
    if category == "mobile" || mentions_any(&text, &MOBILE_KEYWORDS) {
        return "mobile";
    }
    if mentions_any(&text, &ERP_KEYWORDS) {
        return "coding";
    }
    if WEB_CATEGORIES.contains(&category.as_str()) {
        return "web";
    }
    "coding"
}
