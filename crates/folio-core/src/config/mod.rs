mod env;
mod types;


pub use types::*;

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, bail};
use folio_memory::document::IngestConfig;

use crate::vault::VaultProvider;

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            tracing::info!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns an error naming the first setting that would make ingestion or
    /// retrieval meaningless.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.memory.batch_size == 0 {
            bail!("memory.batch_size must be at least 1");
        }
        if self.memory.vector_size == 0 {
            bail!("memory.vector_size must be at least 1");
        }
        if self.memory.top_k == 0 {
            bail!("memory.top_k must be at least 1");
        }
        if self.memory.collection_prefix.trim().is_empty() {
            bail!("memory.collection_prefix must not be empty");
        }
        Ok(())
    }

    /// Resolve sensitive configuration values through the vault.
    ///
    /// # Errors
    ///
    /// Returns an error if the vault backend fails.
    pub async fn resolve_secrets(&mut self, vault: &dyn VaultProvider) -> anyhow::Result<()> {
        use crate::vault::Secret;

        if let Some(val) = vault.get_secret("FOLIO_GITHUB_TOKEN").await? {
            self.secrets.github_token = Some(Secret::new(val));
        }
        if let Some(val) = vault.get_secret("FOLIO_GEMINI_API_KEY").await? {
            self.secrets.gemini_api_key = Some(Secret::new(val));
        }
        if let Some(val) = vault.get_secret("FOLIO_OPENAI_API_KEY").await? {
            self.secrets.openai_api_key = Some(Secret::new(val));
        }
        if let Some(val) = vault.get_secret("FOLIO_GATEWAY_TOKEN").await? {
            self.gateway.auth_token = Some(val);
        }
        Ok(())
    }

    /// Collection holding `account`'s knowledge base; one per account.
    #[must_use]
    pub fn collection_for(&self, account: &str) -> String {
        collection_name(&self.memory.collection_prefix, account)
    }

    #[must_use]
    pub fn ingest_config(&self) -> IngestConfig {
        IngestConfig {
            vector_size: self.memory.vector_size,
            metric: self.memory.metric,
            batch_size: self.memory.batch_size,
            batch_delay: Duration::from_millis(self.memory.batch_delay_ms),
        }
    }
}

/// `{prefix}_{account}` with the account lowercased and characters outside
/// `[a-z0-9_-]` replaced by `_`.
#[must_use]
pub fn collection_name(prefix: &str, account: &str) -> String {
    let account: String = account
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("{prefix}_{account}")
}
