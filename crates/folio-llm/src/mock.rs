//! Test-only mock LLM provider.

use std::sync::{Arc, Mutex};

use crate::provider::{LlmProvider, Message};

/// Deterministic provider for tests.
///
/// With `keywords` set, embeddings are keyword-axis vectors: component `i` is
/// `1.0` when the lowercased text contains `keywords[i]`, and the final
/// component is a small constant so no vector has zero norm. Texts containing
/// `short_marker` get a vector one element shorter than `dimensions`.
#[derive(Debug, Clone)]
pub struct MockProvider {
    responses: Arc<Mutex<Vec<String>>>,
    pub default_response: String,
    pub embedding: Vec<f32>,
    pub dimensions: usize,
    pub keywords: Vec<String>,
    pub short_marker: Option<String>,
    pub supports_embeddings: bool,
    pub fail_chat: bool,
    pub fail_embed: bool,
    chat_calls: Arc<Mutex<Vec<Vec<Message>>>>,
    batch_calls: Arc<Mutex<Vec<Vec<String>>>>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            default_response: "mock response".into(),
            embedding: vec![0.0; 768],
            dimensions: 768,
            keywords: Vec::new(),
            short_marker: None,
            supports_embeddings: true,
            fail_chat: false,
            fail_embed: false,
            chat_calls: Arc::new(Mutex::new(Vec::new())),
            batch_calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl MockProvider {
    #[must_use]
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail_chat: true,
            fail_embed: true,
            ..Self::default()
        }
    }

    /// Keyword-axis embeddings of the given dimensionality.
    ///
    /// # Panics
    ///
    /// Panics if `keywords.len() >= dimensions`.
    #[must_use]
    pub fn with_keywords(mut self, keywords: &[&str], dimensions: usize) -> Self {
        assert!(keywords.len() < dimensions, "need a spare component");
        self.keywords = keywords.iter().map(|k| k.to_lowercase()).collect();
        self.dimensions = dimensions;
        self.embedding = vec![0.0; dimensions];
        self
    }

    #[must_use]
    pub fn with_short_vectors_for(mut self, marker: &str) -> Self {
        self.short_marker = Some(marker.to_owned());
        self
    }

    /// Every message list passed to `chat`, in call order.
    #[must_use]
    pub fn chat_calls(&self) -> Vec<Vec<Message>> {
        self.chat_calls.lock().unwrap().clone()
    }

    /// Every text batch passed to `embed_batch`, in call order.
    #[must_use]
    pub fn batch_calls(&self) -> Vec<Vec<String>> {
        self.batch_calls.lock().unwrap().clone()
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        let mut vector = if self.keywords.is_empty() {
            self.embedding.clone()
        } else {
            let lower = text.to_lowercase();
            let mut v = vec![0.0; self.dimensions];
            for (i, keyword) in self.keywords.iter().enumerate() {
                if lower.contains(keyword.as_str()) {
                    v[i] = 1.0;
                }
            }
            v[self.dimensions - 1] = 0.01;
            v
        };
        if let Some(marker) = &self.short_marker
            && text.contains(marker.as_str())
        {
            vector.pop();
        }
        vector
    }
}

impl LlmProvider for MockProvider {
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "mock"
    }

    async fn chat(&self, messages: &[Message]) -> Result<String, crate::LlmError> {
        self.chat_calls.lock().unwrap().push(messages.to_vec());
        if self.fail_chat {
            return Err(crate::LlmError::Other("mock LLM error".into()));
        }
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(self.default_response.clone())
        } else {
            Ok(responses.remove(0))
        }
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, crate::LlmError> {
        if !self.supports_embeddings {
            return Err(crate::LlmError::EmbedUnsupported { provider: "mock" });
        }
        if self.fail_embed {
            return Err(crate::LlmError::Unavailable);
        }
        Ok(self.vector_for(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, crate::LlmError> {
        self.batch_calls.lock().unwrap().push(texts.to_vec());
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.embed(text).await?);
        }
        Ok(vectors)
    }

    fn supports_embeddings(&self) -> bool {
        self.supports_embeddings
    }
}
