//! Application bootstrap: config resolution and provider, store, code host,
//! and assistant construction.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use folio_github::{CodeHost, GitHubClient, RepoSummary};
use folio_llm::any::AnyProvider;
use folio_llm::gemini::GeminiProvider;
use folio_llm::http::client_with_timeout;
use folio_llm::openai::OpenAiProvider;
use folio_memory::{InMemoryVectorStore, QdrantOps, VectorStore};

use crate::assistant::{Assistant, AssistantSettings};
use crate::config::{Config, MemoryBackend, ProviderKind};
use crate::skills::SkillCatalog;
use crate::vault::{EnvVaultProvider, VaultProvider};

pub struct AppBuilder {
    config: Config,
    config_path: PathBuf,
}

impl AppBuilder {
    /// Load and validate the config at `path`, then resolve secrets from the
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is invalid or the config fails validation.
    pub async fn from_path(path: PathBuf) -> anyhow::Result<Self> {
        Self::with_vault(path, &EnvVaultProvider).await
    }

    /// # Errors
    ///
    /// See [`AppBuilder::from_path`].
    pub async fn with_vault(path: PathBuf, vault: &dyn VaultProvider) -> anyhow::Result<Self> {
        let mut config = Config::load(&path)?;
        config.validate()?;
        config.resolve_secrets(vault).await?;
        Ok(Self {
            config,
            config_path: path,
        })
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// # Errors
    ///
    /// Returns an error if the selected provider has no API key.
    pub fn build_provider(&self) -> anyhow::Result<AnyProvider> {
        let provider = create_provider(&self.config)?;
        tracing::info!(
            provider = %self.config.llm.provider,
            model = self.config.llm.effective_model(),
            embedding_model = self.config.llm.effective_embedding_model(),
            "llm provider configured"
        );
        Ok(provider)
    }

    /// # Errors
    ///
    /// Returns an error if the Qdrant client cannot be created.
    pub fn build_store(&self) -> anyhow::Result<Arc<dyn VectorStore>> {
        let memory = &self.config.memory;
        match memory.backend {
            MemoryBackend::Qdrant => {
                let ops = QdrantOps::new(&memory.qdrant_url)
                    .map_err(|e| anyhow::anyhow!("failed to connect to Qdrant: {e}"))?
                    .with_provision_timeout(Duration::from_secs(memory.provision_timeout_secs));
                tracing::info!(url = %memory.qdrant_url, "using Qdrant vector store");
                Ok(Arc::new(ops))
            }
            MemoryBackend::Memory => {
                tracing::warn!("using in-memory vector store; the index is lost on exit");
                Ok(Arc::new(InMemoryVectorStore::new()))
            }
        }
    }

    #[must_use]
    pub fn build_code_host(&self) -> Arc<dyn CodeHost> {
        let token = self
            .config
            .secrets
            .github_token
            .as_ref()
            .map(|s| s.expose().to_owned());
        if token.is_none() {
            tracing::warn!("FOLIO_GITHUB_TOKEN not set; requests are unauthenticated");
        }
        Arc::new(GitHubClient::new(self.config.github.api_url.clone(), token))
    }

    /// List the configured account's repositories. Needs only the code host,
    /// so it works without model credentials.
    ///
    /// # Errors
    ///
    /// Returns an error if the account cannot be resolved or the listing fails.
    pub async fn list_repos(&self) -> anyhow::Result<Vec<RepoSummary>> {
        let host = self.build_code_host();
        let account = match &self.config.github.user {
            Some(user) => user.clone(),
            None => host.authenticated_user().await?,
        };
        Ok(host.list_repos(&account).await?)
    }

    #[must_use]
    pub fn build_catalog(&self) -> SkillCatalog {
        SkillCatalog::from_config(&self.config.skills)
    }

    /// # Errors
    ///
    /// Returns an error if the provider or the store cannot be built.
    pub fn build_assistant(&self) -> anyhow::Result<Assistant<AnyProvider>> {
        Ok(Assistant::new(
            Arc::new(self.build_provider()?),
            self.build_store()?,
            self.build_code_host(),
            self.build_catalog(),
            AssistantSettings::from_config(&self.config),
        ))
    }
}

/// Priority: `--config` flag, then `FOLIO_CONFIG`, then `config/default.toml`.
#[must_use]
pub fn resolve_config_path(cli: Option<PathBuf>) -> PathBuf {
    if let Some(path) = cli {
        return path;
    }
    if let Ok(path) = std::env::var("FOLIO_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from("config/default.toml")
}

/// Build the configured provider. One HTTP client serves chat and
/// embeddings, so its timeout is the larger of the two limits.
///
/// # Errors
///
/// Returns an error if the API key for the selected provider is missing.
pub fn create_provider(config: &Config) -> anyhow::Result<AnyProvider> {
    let llm = &config.llm;
    let timeout = config
        .timeouts
        .llm_seconds
        .max(config.timeouts.embedding_seconds);
    let client = client_with_timeout(Duration::from_secs(timeout));

    match llm.provider {
        ProviderKind::Gemini => {
            let key = config
                .secrets
                .gemini_api_key
                .as_ref()
                .context("FOLIO_GEMINI_API_KEY is required for the gemini provider")?;
            let provider = GeminiProvider::new(
                key.expose().to_owned(),
                llm.effective_base_url().to_owned(),
                llm.effective_model().to_owned(),
                Some(llm.effective_embedding_model().to_owned()),
            )
            .with_client(client)
            .with_temperature(llm.temperature)
            .with_max_tokens(Some(llm.max_tokens))
            .with_max_retries(llm.max_retries);
            Ok(AnyProvider::Gemini(provider))
        }
        ProviderKind::OpenAi => {
            let Some(key) = config.secrets.openai_api_key.as_ref() else {
                bail!("FOLIO_OPENAI_API_KEY is required for the openai provider");
            };
            let provider = OpenAiProvider::new(
                key.expose().to_owned(),
                llm.effective_base_url().to_owned(),
                llm.effective_model().to_owned(),
                llm.max_tokens,
                Some(llm.effective_embedding_model().to_owned()),
            )
            .with_client(client)
            .with_temperature(llm.temperature)
            .with_dimensions(Some(config.memory.vector_size))
            .with_max_retries(llm.max_retries);
            Ok(AnyProvider::OpenAi(provider))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::future::Future;
    use std::pin::Pin;

    use folio_llm::LlmProvider;
    use serial_test::serial;

    use super::*;
    use crate::vault::Secret;

    struct FixedVault(Vec<(&'static str, &'static str)>);

    impl VaultProvider for FixedVault {
        fn get_secret(
            &self,
            key: &str,
        ) -> Pin<Box<dyn Future<Output = anyhow::Result<Option<String>>> + Send + '_>> {
            let value = self
                .0
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| (*v).to_owned());
            Box::pin(async move { Ok(value) })
        }
    }

    #[test]
    #[serial]
    fn config_path_prefers_cli_then_env() {
        unsafe { std::env::remove_var("FOLIO_CONFIG") };
        assert_eq!(
            resolve_config_path(None),
            PathBuf::from("config/default.toml")
        );

        unsafe { std::env::set_var("FOLIO_CONFIG", "/etc/folio.toml") };
        assert_eq!(resolve_config_path(None), PathBuf::from("/etc/folio.toml"));
        assert_eq!(
            resolve_config_path(Some(PathBuf::from("cli.toml"))),
            PathBuf::from("cli.toml")
        );
        unsafe { std::env::remove_var("FOLIO_CONFIG") };
    }

    #[test]
    fn gemini_without_key_fails() {
        let err = create_provider(&Config::default()).unwrap_err();
        assert!(err.to_string().contains("FOLIO_GEMINI_API_KEY"));
    }

    #[test]
    fn creates_configured_provider() {
        let mut config = Config::default();
        config.secrets.gemini_api_key = Some(Secret::new("g"));
        let provider = create_provider(&config).unwrap();
        assert!(matches!(provider, AnyProvider::Gemini(_)));
        assert_eq!(provider.name(), "gemini");

        config.llm.provider = ProviderKind::OpenAi;
        assert!(create_provider(&config).is_err());
        config.secrets.openai_api_key = Some(Secret::new("o"));
        assert!(matches!(
            create_provider(&config).unwrap(),
            AnyProvider::OpenAi(_)
        ));
    }

    #[test]
    fn openai_embeddings_match_collection_size() {
        let mut config = Config::default();
        config.llm.provider = ProviderKind::OpenAi;
        config.secrets.openai_api_key = Some(Secret::new("o"));
        let debug = format!("{:?}", create_provider(&config).unwrap());
        assert!(debug.contains("dimensions: Some(768)"));

        config.memory.vector_size = 256;
        let debug = format!("{:?}", create_provider(&config).unwrap());
        assert!(debug.contains("dimensions: Some(256)"));
    }

    #[tokio::test]
    #[serial]
    async fn repos_listing_needs_no_model_key() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/octo/repos"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"name": "api", "html_url": "https://github.com/octo/api"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("folio.toml");
        std::fs::write(
            &path,
            format!("[github]\nuser = \"octo\"\napi_url = \"{}\"\n", server.uri()),
        )
        .unwrap();

        let builder = AppBuilder::with_vault(path, &FixedVault(Vec::new())).await.unwrap();
        assert!(builder.build_assistant().is_err());
        let repos = builder.list_repos().await.unwrap();
        assert_eq!(repos.len(), 1);
        assert_eq!(repos[0].name, "api");
    }

    #[tokio::test]
    #[serial]
    async fn builder_resolves_secrets_and_builds_assistant() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("folio.toml");
        std::fs::write(
            &path,
            "[memory]\nbackend = \"memory\"\n\n[github]\nuser = \"octo\"\n",
        )
        .unwrap();

        let vault = FixedVault(vec![
            ("FOLIO_GEMINI_API_KEY", "key"),
            ("FOLIO_GATEWAY_TOKEN", "tok"),
        ]);
        let builder = AppBuilder::with_vault(path.clone(), &vault).await.unwrap();
        assert_eq!(builder.config_path(), path.as_path());
        assert_eq!(builder.config().gateway.auth_token.as_deref(), Some("tok"));

        let assistant = builder.build_assistant().unwrap();
        assert_eq!(assistant.collection().await.unwrap(), "folio_octo");
    }

    #[tokio::test]
    #[serial]
    async fn builder_rejects_invalid_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("folio.toml");
        std::fs::write(&path, "[memory]\nbatch_size = 0\n").unwrap();
        assert!(AppBuilder::with_vault(path, &FixedVault(Vec::new())).await.is_err());
    }
}
