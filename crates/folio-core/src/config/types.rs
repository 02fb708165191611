use folio_memory::DistanceMetric;
use serde::{Deserialize, Serialize};

use crate::profile::UserProfile;
use crate::skills::SkillDef;
use crate::vault::Secret;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub profile: UserProfile,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub github: GitHubConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub timeouts: TimeoutConfig,
    #[serde(default)]
    pub skills: SkillsConfig,
    #[serde(skip)]
    pub secrets: ResolvedSecrets,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Gemini,
    OpenAi,
}

impl ProviderKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAi => "openai",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Model settings. Unset URLs and model names fall back to the provider's
/// defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: ProviderKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    2048
}

fn default_max_retries() -> u32 {
    3
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            base_url: None,
            model: None,
            embedding_model: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            max_retries: default_max_retries(),
        }
    }
}

impl LlmConfig {
    #[must_use]
    pub fn effective_base_url(&self) -> &str {
        self.base_url.as_deref().unwrap_or(match self.provider {
            ProviderKind::Gemini => folio_llm::gemini::DEFAULT_BASE_URL,
            ProviderKind::OpenAi => folio_llm::openai::DEFAULT_BASE_URL,
        })
    }

    #[must_use]
    pub fn effective_model(&self) -> &str {
        self.model.as_deref().unwrap_or(match self.provider {
            ProviderKind::Gemini => folio_llm::gemini::DEFAULT_CHAT_MODEL,
            ProviderKind::OpenAi => folio_llm::openai::DEFAULT_CHAT_MODEL,
        })
    }

    #[must_use]
    pub fn effective_embedding_model(&self) -> &str {
        self.embedding_model.as_deref().unwrap_or(match self.provider {
            ProviderKind::Gemini => folio_llm::gemini::DEFAULT_EMBEDDING_MODEL,
            ProviderKind::OpenAi => folio_llm::openai::DEFAULT_EMBEDDING_MODEL,
        })
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GitHubConfig {
    #[serde(default = "default_github_api_url")]
    pub api_url: String,
    /// Sync this account instead of the token owner's.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

fn default_github_api_url() -> String {
    folio_github::client::DEFAULT_API_URL.into()
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_url: default_github_api_url(),
            user: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryBackend {
    #[default]
    Qdrant,
    Memory,
}

impl MemoryBackend {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Qdrant => "qdrant",
            Self::Memory => "memory",
        }
    }
}

impl std::fmt::Display for MemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MemoryConfig {
    #[serde(default)]
    pub backend: MemoryBackend,
    #[serde(default = "default_qdrant_url")]
    pub qdrant_url: String,
    #[serde(default = "default_collection_prefix")]
    pub collection_prefix: String,
    #[serde(default = "default_vector_size")]
    pub vector_size: u64,
    #[serde(default)]
    pub metric: DistanceMetric,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,
    #[serde(default = "default_top_k")]
    pub top_k: u64,
    #[serde(default = "default_readme_max_chars")]
    pub readme_max_chars: usize,
    #[serde(default = "default_provision_timeout_secs")]
    pub provision_timeout_secs: u64,
}

fn default_qdrant_url() -> String {
    "http://localhost:6334".into()
}

fn default_collection_prefix() -> String {
    "folio".into()
}

fn default_vector_size() -> u64 {
    768
}

fn default_batch_size() -> usize {
    5
}

fn default_batch_delay_ms() -> u64 {
    1000
}

fn default_top_k() -> u64 {
    15
}

fn default_readme_max_chars() -> usize {
    folio_memory::document::DEFAULT_README_MAX_CHARS
}

fn default_provision_timeout_secs() -> u64 {
    10
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            backend: MemoryBackend::default(),
            qdrant_url: default_qdrant_url(),
            collection_prefix: default_collection_prefix(),
            vector_size: default_vector_size(),
            metric: DistanceMetric::default(),
            batch_size: default_batch_size(),
            batch_delay_ms: default_batch_delay_ms(),
            top_k: default_top_k(),
            readme_max_chars: default_readme_max_chars(),
            provision_timeout_secs: default_provision_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewayConfig {
    #[serde(default = "default_gateway_bind")]
    pub bind: String,
    #[serde(default = "default_gateway_port")]
    pub port: u16,
    #[serde(default, skip_serializing)]
    pub auth_token: Option<String>,
    #[serde(default = "default_gateway_rate_limit")]
    pub rate_limit: u32,
    #[serde(default = "default_gateway_max_body")]
    pub max_body_size: usize,
}

fn default_gateway_bind() -> String {
    "127.0.0.1".into()
}

fn default_gateway_port() -> u16 {
    8090
}

fn default_gateway_rate_limit() -> u32 {
    120
}

fn default_gateway_max_body() -> usize {
    1_048_576
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: default_gateway_bind(),
            port: default_gateway_port(),
            auth_token: None,
            rate_limit: default_gateway_rate_limit(),
            max_body_size: default_gateway_max_body(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct TimeoutConfig {
    #[serde(default = "default_llm_timeout")]
    pub llm_seconds: u64,
    #[serde(default = "default_embedding_timeout")]
    pub embedding_seconds: u64,
}

fn default_llm_timeout() -> u64 {
    120
}

fn default_embedding_timeout() -> u64 {
    30
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            llm_seconds: default_llm_timeout(),
            embedding_seconds: default_embedding_timeout(),
        }
    }
}

/// Additions to the built-in skill catalog.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SkillsConfig {
    #[serde(default)]
    pub extra: Vec<SkillDef>,
}

#[derive(Debug, Default)]
pub struct ResolvedSecrets {
    pub github_token: Option<Secret>,
    pub gemini_api_key: Option<Secret>,
    pub openai_api_key: Option<Secret>,
}
