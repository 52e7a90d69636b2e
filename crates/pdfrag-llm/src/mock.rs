//! Test-only mock LLM provider.

use std::sync::{Arc, Mutex};

use crate::error::LlmError;
use crate::provider::{LlmProvider, Message};

#[derive(Debug, Clone)]
pub struct MockProvider {
    pub responses: Arc<Mutex<Vec<String>>>,
    pub requests: Arc<Mutex<Vec<Vec<Message>>>>,
    pub default_response: String,
    pub embedding: Vec<f32>,
    /// Computes the embedding from the text instead of returning `embedding`.
    pub embedder: Option<fn(&str) -> Vec<f32>>,
    pub supports_embeddings: bool,
    pub fail_chat: bool,
    pub fail_embed: bool,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            default_response: "mock response".into(),
            embedding: vec![0.0; 8],
            embedder: None,
            supports_embeddings: true,
            fail_chat: false,
            fail_embed: false,
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

    #[must_use]
    pub fn with_embedder(mut self, embedder: fn(&str) -> Vec<f32>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Every message list passed to `chat`, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

/// Letter-frequency embedding: 26 dimensions, one per ASCII letter.
///
/// Texts sharing vocabulary score close under cosine similarity, which is
/// enough to make retrieval in tests deterministic.
#[must_use]
pub fn bag_of_letters(text: &str) -> Vec<f32> {
    let mut v = vec![0.0f32; 26];
    for b in text.bytes() {
        if b.is_ascii_alphabetic() {
            v[usize::from(b.to_ascii_lowercase() - b'a')] += 1.0;
        }
    }
    v
}

impl LlmProvider for MockProvider {
    async fn chat(&self, messages: &[Message]) -> Result<String, LlmError> {
        self.requests
            .lock()
            .map_err(|e| LlmError::Other(e.to_string()))?
            .push(messages.to_vec());
        if self.fail_chat {
            return Err(LlmError::Other("mock LLM error".into()));
        }
        let mut responses = self
            .responses
            .lock()
            .map_err(|e| LlmError::Other(e.to_string()))?;
        if responses.is_empty() {
            Ok(self.default_response.clone())
        } else {
            Ok(responses.remove(0))
        }
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        if !self.supports_embeddings {
            return Err(LlmError::EmbedUnsupported {
                provider: "mock".into(),
            });
        }
        if self.fail_embed {
            return Err(LlmError::Other("mock embed error".into()));
        }
        Ok(match self.embedder {
            Some(f) => f(text),
            None => self.embedding.clone(),
        })
    }

    fn supports_embeddings(&self) -> bool {
        self.supports_embeddings
    }

    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn responses_are_consumed_in_order_then_default() {
        let mock = MockProvider::with_responses(vec!["first".into(), "second".into()]);
        let msgs = [Message::user("q")];
        assert_eq!(mock.chat(&msgs).await.unwrap(), "first");
        assert_eq!(mock.chat(&msgs).await.unwrap(), "second");
        assert_eq!(mock.chat(&msgs).await.unwrap(), "mock response");
        assert_eq!(mock.requests().len(), 3);
    }

    #[tokio::test]
    async fn failing_provider_errors() {
        let mock = MockProvider::failing();
        assert!(mock.chat(&[Message::user("q")]).await.is_err());
        assert!(mock.embed("text").await.is_err());
    }

    #[tokio::test]
    async fn embed_unsupported() {
        let mock = MockProvider {
            supports_embeddings: false,
            ..MockProvider::default()
        };
        let err = mock.embed("x").await.unwrap_err();
        assert!(matches!(err, LlmError::EmbedUnsupported { .. }));
    }

    #[tokio::test]
    async fn custom_embedder_is_used() {
        let mock = MockProvider::default().with_embedder(bag_of_letters);
        let v = mock.embed("abc").await.unwrap();
        assert_eq!(v.len(), 26);
        assert!((v[0] - 1.0).abs() < f32::EPSILON);
        assert!((v[25]).abs() < f32::EPSILON);
    }

    #[test]
    fn bag_of_letters_ignores_case_and_symbols() {
        let v = bag_of_letters("Aa-1!");
        assert!((v[0] - 2.0).abs() < f32::EPSILON);
        assert!((v.iter().sum::<f32>() - 2.0).abs() < f32::EPSILON);
    }
}
