//! Technology catalog used to spot requested skills the knowledge base does
//! not back up, and to suggest owned substitutes.

use serde::{Deserialize, Serialize};

use crate::config::SkillsConfig;
use crate::profile::UserProfile;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SkillCategory {
    Languages,
    Frameworks,
    Databases,
    Cloud,
    #[default]
    Tools,
}

/// One catalog entry.
///
/// `name` and `aliases` are matched in queries, context, and profile skills.
/// `packages` are dependency names that imply the skill; they are matched
/// only in context and profile, since several are ordinary English words.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SkillDef {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(default)]
    pub packages: Vec<String>,
    #[serde(default)]
    pub category: SkillCategory,
}

impl SkillDef {
    fn new(name: &str, category: SkillCategory, aliases: &[&str], packages: &[&str]) -> Self {
        Self {
            name: name.to_owned(),
            aliases: aliases.iter().map(|a| (*a).to_owned()).collect(),
            packages: packages.iter().map(|p| (*p).to_owned()).collect(),
            category,
        }
    }

    fn named_in(&self, text: &str) -> bool {
        contains_term(text, &self.name.to_lowercase())
            || self
                .aliases
                .iter()
                .any(|a| contains_term(text, &a.to_lowercase()))
    }

    fn evidenced_in(&self, text: &str) -> bool {
        self.named_in(text)
            || self
                .packages
                .iter()
                .any(|p| contains_term(text, &p.to_lowercase()))
    }
}

/// A requested skill that is absent, with owned skills of the same category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pivot {
    pub missing: String,
    pub substitutes: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct SkillCatalog {
    skills: Vec<SkillDef>,
}

impl Default for SkillCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SkillCatalog {
    #[must_use]
    #[allow(clippy::too_many_lines)]
    pub fn builtin() -> Self {
        use SkillCategory::{Cloud, Databases, Frameworks, Languages, Tools};

        let skills = vec![
            SkillDef::new("TypeScript", Languages, &["ts"], &["typescript"]),
            SkillDef::new("JavaScript", Languages, &["js", "node.js", "nodejs"], &[]),
            SkillDef::new("Python", Languages, &[], &[]),
            SkillDef::new("Rust", Languages, &[], &[]),
            SkillDef::new("Java", Languages, &[], &[]),
            SkillDef::new("Next.js", Frameworks, &["nextjs"], &["next"]),
            SkillDef::new(
                "React",
                Frameworks,
                &["reactjs", "react.js"],
                &["react", "react-dom"],
            ),
            SkillDef::new("Vue", Frameworks, &["vue.js", "vuejs", "nuxt"], &["vue"]),
            SkillDef::new("Angular", Frameworks, &["angularjs"], &["@angular/core"]),
            SkillDef::new("Svelte", Frameworks, &["sveltekit"], &["svelte"]),
            SkillDef::new("Express", Frameworks, &["express.js", "expressjs"], &["express"]),
            SkillDef::new("NestJS", Frameworks, &["nest.js"], &["@nestjs/core", "nest"]),
            SkillDef::new("Django", Frameworks, &[], &[]),
            SkillDef::new("Flask", Frameworks, &[], &["flask"]),
            SkillDef::new("FastAPI", Frameworks, &[], &[]),
            SkillDef::new("MongoDB", Databases, &["mongo", "mongoose"], &["mongodb"]),
            SkillDef::new(
                "PostgreSQL",
                Databases,
                &["postgres", "neondb", "neon"],
                &["pg", "@neondatabase/serverless", "postgres.js"],
            ),
            SkillDef::new("MySQL", Databases, &[], &["mysql2"]),
            SkillDef::new("Redis", Databases, &[], &["ioredis", "redis"]),
            SkillDef::new("SQLite", Databases, &[], &["sqlite3", "better-sqlite3"]),
            SkillDef::new("Prisma", Databases, &[], &["@prisma/client", "prisma"]),
            SkillDef::new("Sequelize", Databases, &[], &["sequelize"]),
            SkillDef::new("TypeORM", Databases, &[], &["typeorm"]),
            SkillDef::new(
                "AWS",
                Cloud,
                &["amazon web services", "boto3"],
                &["aws-sdk", "@aws-sdk"],
            ),
            SkillDef::new("GCP", Cloud, &["google cloud"], &["@google-cloud"]),
            SkillDef::new("Azure", Cloud, &[], &["@azure"]),
            SkillDef::new("Docker", Tools, &["dockerfile"], &[]),
            SkillDef::new("Kubernetes", Tools, &["k8s", "kubectl"], &[]),
            SkillDef::new("ESLint", Tools, &[], &["eslint"]),
            SkillDef::new("Prettier", Tools, &[], &["prettier"]),
            SkillDef::new("Webpack", Tools, &[], &["webpack"]),
            SkillDef::new("Vite", Tools, &[], &["vite"]),
            SkillDef::new("Jest", Tools, &[], &["jest"]),
            SkillDef::new("Cypress", Tools, &[], &["cypress"]),
        ];
        Self { skills }
    }

    #[must_use]
    pub fn from_config(config: &SkillsConfig) -> Self {
        Self::builtin().with_extra(config.extra.iter().cloned())
    }

    /// Add entries. An entry whose name matches an existing one
    /// (case-insensitively) extends that entry's aliases and packages.
    #[must_use]
    pub fn with_extra(mut self, extra: impl IntoIterator<Item = SkillDef>) -> Self {
        for def in extra {
            if let Some(existing) = self
                .skills
                .iter_mut()
                .find(|s| s.name.eq_ignore_ascii_case(&def.name))
            {
                existing.aliases.extend(def.aliases);
                existing.packages.extend(def.packages);
            } else {
                self.skills.push(def);
            }
        }
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SkillDef> {
        self.skills.iter().find(|s| s.name.eq_ignore_ascii_case(name))
    }

    /// Catalog skills the text names explicitly, in catalog order.
    #[must_use]
    pub fn requested_in(&self, text: &str) -> Vec<&SkillDef> {
        let text = text.to_lowercase();
        self.skills.iter().filter(|s| s.named_in(&text)).collect()
    }

    /// Catalog skills backed by the retrieved context or the profile.
    #[must_use]
    pub fn owned(&self, context: &str, profile: &UserProfile) -> Vec<&SkillDef> {
        let evidence = evidence_text(context, profile);
        self.skills
            .iter()
            .filter(|s| s.evidenced_in(&evidence))
            .collect()
    }

    /// Names of skills the query asks about that neither the context nor
    /// the profile supports.
    #[must_use]
    pub fn missing_skills(&self, query: &str, context: &str, profile: &UserProfile) -> Vec<String> {
        let evidence = evidence_text(context, profile);
        self.requested_in(query)
            .into_iter()
            .filter(|s| !s.evidenced_in(&evidence))
            .map(|s| s.name.clone())
            .collect()
    }

    /// For each missing skill, the owned skills sharing its category.
    /// Missing names unknown to the catalog get no substitutes.
    #[must_use]
    pub fn pivots(&self, missing: &[String], context: &str, profile: &UserProfile) -> Vec<Pivot> {
        let owned = self.owned(context, profile);
        missing
            .iter()
            .map(|name| {
                let substitutes = self
                    .get(name)
                    .map(|def| {
                        owned
                            .iter()
                            .filter(|o| o.category == def.category && o.name != def.name)
                            .map(|o| o.name.clone())
                            .collect()
                    })
                    .unwrap_or_default();
                Pivot {
                    missing: name.clone(),
                    substitutes,
                }
            })
            .collect()
    }
}

fn evidence_text(context: &str, profile: &UserProfile) -> String {
    let mut text = context.to_lowercase();
    for skill in &profile.skills {
        text.push('\n');
        text.push_str(&skill.to_lowercase());
    }
    text
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Whole-word occurrence of a lowercase `term` in lowercase `haystack`.
fn contains_term(haystack: &str, term: &str) -> bool {
    if term.is_empty() {
        return false;
    }
    haystack.match_indices(term).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + term.len()..].chars().next();
        !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
    })
}
