use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Structured self-description of the knowledge-base owner, embedded
/// verbatim in every generation prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct UserProfile {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub headline: String,
    #[serde(default)]
    pub skills: Vec<String>,
    /// Label to URL, e.g. `github = "https://github.com/octo"`.
    #[serde(default)]
    pub links: BTreeMap<String, String>,
}

impl UserProfile {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_empty()
            && self.headline.is_empty()
            && self.skills.is_empty()
            && self.links.is_empty()
    }

    /// Compact JSON rendering used in prompts.
    #[must_use]
    pub fn to_prompt_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".into())
    }
}
