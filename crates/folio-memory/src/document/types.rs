use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Provenance of a knowledge-base fragment. Serialized with a `type` tag so
/// stored payloads stay flat: `{"type": "skills", "repo": "api"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DocumentMetadata {
    Bio,
    RepoInfo {
        repo: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tags: Vec<String>,
    },
    Skills {
        repo: String,
    },
    Readme {
        repo: String,
    },
}

impl DocumentMetadata {
    /// Where the fragment text came from.
    #[must_use]
    pub fn source(&self) -> &'static str {
        match self {
            Self::Bio => "user",
            Self::RepoInfo { .. } => "github",
            Self::Skills { .. } => "package.json",
            Self::Readme { .. } => "README.md",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub text: String,
    pub metadata: DocumentMetadata,
}

impl Document {
    /// Payload stored next to the vector: metadata fields, `source`, and `text`.
    ///
    /// # Errors
    ///
    /// Returns an error if metadata serialization fails.
    pub fn payload(&self) -> Result<HashMap<String, serde_json::Value>, serde_json::Error> {
        let serde_json::Value::Object(fields) = serde_json::to_value(&self.metadata)? else {
            return Ok(HashMap::new());
        };
        let mut payload: HashMap<String, serde_json::Value> = fields.into_iter().collect();
        payload.insert("source".into(), self.metadata.source().into());
        payload.insert("text".into(), self.text.clone().into());
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_is_internally_tagged() {
        let meta = DocumentMetadata::Skills { repo: "api".into() };
        let value = serde_json::to_value(&meta).unwrap();
        assert_eq!(value, serde_json::json!({"type": "skills", "repo": "api"}));
    }

    #[test]
    fn repo_info_omits_empty_tags() {
        let meta = DocumentMetadata::RepoInfo {
            repo: "api".into(),
            tags: Vec::new(),
        };
        let value = serde_json::to_value(&meta).unwrap();
        assert!(value.get("tags").is_none());
    }

    #[test]
    fn payload_carries_source_and_text() {
        let doc = Document {
            text: "README for api:\nhello".into(),
            metadata: DocumentMetadata::Readme { repo: "api".into() },
        };
        let payload = doc.payload().unwrap();
        assert_eq!(payload["type"], "readme");
        assert_eq!(payload["repo"], "api");
        assert_eq!(payload["source"], "README.md");
        assert_eq!(payload["text"], "README for api:\nhello");
    }

    #[test]
    fn bio_payload_is_user_sourced() {
        let doc = Document {
            text: "User Bio: hi".into(),
            metadata: DocumentMetadata::Bio,
        };
        let payload = doc.payload().unwrap();
        assert_eq!(payload["type"], "bio");
        assert_eq!(payload["source"], "user");
        assert!(!payload.contains_key("repo"));
    }
}
