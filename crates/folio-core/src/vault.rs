use std::fmt;
use std::future::Future;
use std::pin::Pin;

use serde::Deserialize;

/// Wrapper for sensitive strings with redacted Debug/Display.
#[derive(Clone, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

/// Pluggable secret retrieval backend.
pub trait VaultProvider: Send + Sync {
    fn get_secret(
        &self,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Option<String>>> + Send + '_>>;
}

/// Reads secrets from environment variables. Empty values count as unset.
pub struct EnvVaultProvider;

impl VaultProvider for EnvVaultProvider {
    fn get_secret(
        &self,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<Option<String>>> + Send + '_>> {
        let key = key.to_owned();
        Box::pin(async move { Ok(std::env::var(&key).ok().filter(|v| !v.is_empty())) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn secret_is_redacted() {
        let secret = Secret::new("ghp_abc");
        assert_eq!(format!("{secret:?}"), "[REDACTED]");
        assert_eq!(format!("{secret}"), "[REDACTED]");
        assert_eq!(secret.expose(), "ghp_abc");
    }

    #[tokio::test]
    #[serial]
    async fn env_vault_reads_and_skips_empty() {
        unsafe {
            std::env::set_var("FOLIO_TEST_VAULT_SET", "value");
            std::env::set_var("FOLIO_TEST_VAULT_EMPTY", "");
        }
        let vault = EnvVaultProvider;
        assert_eq!(
            vault.get_secret("FOLIO_TEST_VAULT_SET").await.unwrap().as_deref(),
            Some("value")
        );
        assert!(vault.get_secret("FOLIO_TEST_VAULT_EMPTY").await.unwrap().is_none());
        assert!(vault.get_secret("FOLIO_TEST_VAULT_UNSET").await.unwrap().is_none());
        unsafe {
            std::env::remove_var("FOLIO_TEST_VAULT_SET");
            std::env::remove_var("FOLIO_TEST_VAULT_EMPTY");
        }
    }
}
