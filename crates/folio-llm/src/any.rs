use crate::gemini::GeminiProvider;
#[cfg(feature = "mock")]
use crate::mock::MockProvider;
use crate::openai::OpenAiProvider;
use crate::provider::{LlmProvider, Message};

/// Generates a match over all `AnyProvider` variants, binding the inner provider
/// and evaluating the given closure for each arm.
macro_rules! delegate_provider {
    ($self:expr, |$p:ident| $expr:expr) => {
        match $self {
            AnyProvider::Gemini($p) => $expr,
            AnyProvider::OpenAi($p) => $expr,
            #[cfg(feature = "mock")]
            AnyProvider::Mock($p) => $expr,
        }
    };
}

#[derive(Debug, Clone)]
pub enum AnyProvider {
    Gemini(GeminiProvider),
    OpenAi(OpenAiProvider),
    #[cfg(feature = "mock")]
    Mock(MockProvider),
}

impl LlmProvider for AnyProvider {
    async fn chat(&self, messages: &[Message]) -> Result<String, crate::LlmError> {
        delegate_provider!(self, |p| p.chat(messages).await)
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, crate::LlmError> {
        delegate_provider!(self, |p| p.embed(text).await)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, crate::LlmError> {
        delegate_provider!(self, |p| p.embed_batch(texts).await)
    }

    fn supports_embeddings(&self) -> bool {
        delegate_provider!(self, |p| p.supports_embeddings())
    }

    fn name(&self) -> &str {
        delegate_provider!(self, |p| p.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gemini::{DEFAULT_BASE_URL, DEFAULT_CHAT_MODEL};

    #[test]
    fn name_delegates_to_inner_provider() {
        let gemini = AnyProvider::Gemini(GeminiProvider::new(
            "k".into(),
            DEFAULT_BASE_URL.into(),
            DEFAULT_CHAT_MODEL.into(),
            None,
        ));
        assert_eq!(gemini.name(), "gemini");
        assert!(!gemini.supports_embeddings());

        let openai = AnyProvider::OpenAi(OpenAiProvider::new(
            "k".into(),
            "http://localhost".into(),
            "m".into(),
            16,
            Some("e".into()),
        ));
        assert_eq!(openai.name(), "openai");
        assert!(openai.supports_embeddings());
    }
}
