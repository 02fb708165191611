//! Turns repository snapshots and a biography into uniform [`Document`]s.

use std::collections::HashSet;

use serde::Deserialize;

use super::DEFAULT_README_MAX_CHARS;
use super::types::{Document, DocumentMetadata};

/// Repository metadata as reported by the code host, plus user tags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoDetails {
    pub description: Option<String>,
    pub language: Option<String>,
    pub topics: Vec<String>,
    pub tags: Vec<String>,
}

/// Everything fetched for one repository. Absent files are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoSnapshot {
    pub name: String,
    pub details: Option<RepoDetails>,
    pub manifest: Option<String>,
    pub readme: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    readme_max_chars: usize,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(DEFAULT_README_MAX_CHARS)
    }
}

impl Normalizer {
    #[must_use]
    pub fn new(readme_max_chars: usize) -> Self {
        Self { readme_max_chars }
    }

    /// Bio document first (when given), then each repository's documents in order.
    #[must_use]
    pub fn normalize(&self, bio: Option<&str>, repos: &[RepoSnapshot]) -> Vec<Document> {
        let mut documents = Vec::new();
        if let Some(bio) = bio.map(str::trim).filter(|b| !b.is_empty()) {
            documents.push(Document {
                text: format!("User Bio: {bio}"),
                metadata: DocumentMetadata::Bio,
            });
        }
        for repo in repos {
            documents.extend(self.repo_documents(repo));
        }
        documents
    }

    /// Up to three documents: repository info, manifest skills, README excerpt.
    #[must_use]
    pub fn repo_documents(&self, repo: &RepoSnapshot) -> Vec<Document> {
        let mut documents = Vec::with_capacity(3);

        if let Some(details) = &repo.details {
            documents.push(Document {
                text: repo_info_text(&repo.name, details),
                metadata: DocumentMetadata::RepoInfo {
                    repo: repo.name.clone(),
                    tags: details.tags.clone(),
                },
            });
        }

        if let Some(manifest) = &repo.manifest {
            let skills = extract_skills(manifest);
            if skills.is_empty() {
                tracing::debug!(repo = %repo.name, "manifest has no dependencies");
            } else {
                documents.push(Document {
                    text: format!("Skills used in {}: {}", repo.name, skills.join(", ")),
                    metadata: DocumentMetadata::Skills {
                        repo: repo.name.clone(),
                    },
                });
            }
        }

        if let Some(readme) = repo.readme.as_deref().filter(|r| !r.is_empty()) {
            documents.push(Document {
                text: format!(
                    "README for {}:\n{}",
                    repo.name,
                    truncate_chars(readme, self.readme_max_chars)
                ),
                metadata: DocumentMetadata::Readme {
                    repo: repo.name.clone(),
                },
            });
        }

        documents
    }
}

fn repo_info_text(name: &str, details: &RepoDetails) -> String {
    let mut text = format!(
        "Repository: {name}\nDescription: {}\nLanguage: {}\nTopics: {}",
        details.description.as_deref().unwrap_or("none"),
        details.language.as_deref().unwrap_or("none"),
        details.topics.join(", "),
    );
    if !details.tags.is_empty() {
        text.push_str("\nTags: ");
        text.push_str(&details.tags.join(", "));
    }
    text
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Manifest {
    #[serde(default)]
    dependencies: serde_json::Value,
    #[serde(default)]
    dev_dependencies: serde_json::Value,
}

/// Keys of a dependency section; `null` or non-object sections have none.
fn dependency_names(section: &serde_json::Value) -> impl Iterator<Item = &String> {
    section.as_object().into_iter().flat_map(serde_json::Map::keys)
}

/// Dependency names from a `package.json`-style manifest: runtime
/// dependencies first, then dev dependencies, each name once in first-seen
/// position. Unparseable manifests yield an empty list.
#[must_use]
pub fn extract_skills(manifest: &str) -> Vec<String> {
    let parsed: Manifest = match serde_json::from_str(manifest) {
        Ok(m) => m,
        Err(e) => {
            tracing::warn!("skipping unparseable manifest: {e}");
            return Vec::new();
        }
    };

    let mut seen = HashSet::new();
    dependency_names(&parsed.dependencies)
        .chain(dependency_names(&parsed.dev_dependencies))
        .filter(|name| seen.insert(name.as_str()))
        .cloned()
        .collect()
}

/// First `max_chars` Unicode scalar values of `text`.
#[must_use]
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
