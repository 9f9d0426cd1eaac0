//! Test-only mock LLM provider.

use std::sync::{Arc, Mutex};

use crate::error::LlmError;
use crate::provider::{GenerationParams, LlmProvider, Message};

/// A chat call captured by [`MockProvider`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub messages: Vec<Message>,
    pub params: GenerationParams,
}

#[derive(Debug, Clone)]
pub struct MockProvider {
    responses: Arc<Mutex<Vec<String>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    pub default_response: String,
    /// Fixed embedding; ignored when `hashed_dims` is set.
    pub embedding: Vec<f32>,
    /// Embed text as a bag of hashed lowercase words with this many dimensions.
    pub hashed_dims: Option<usize>,
    pub supports_embeddings: bool,
    pub fail_chat: bool,
    /// Milliseconds to sleep before returning a response.
    pub delay_ms: u64,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            default_response: "mock response".into(),
            embedding: vec![0.0; 8],
            hashed_dims: None,
            supports_embeddings: true,
            fail_chat: false,
            delay_ms: 0,
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
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_hashed_embeddings(mut self, dims: usize) -> Self {
        self.hashed_dims = Some(dims);
        self
    }

    #[must_use]
    pub fn with_delay(mut self, ms: u64) -> Self {
        self.delay_ms = ms;
        self
    }

    /// Chat calls made so far, in order.
    #[must_use]
    pub fn recorded(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    fn hashed_embedding(text: &str, dims: usize) -> Vec<f32> {
        let mut v = vec![0.0_f32; dims.max(1)];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            // FNV-1a
            let mut h: u64 = 0xcbf2_9ce4_8422_2325;
            for b in word.to_lowercase().bytes() {
                h ^= u64::from(b);
                h = h.wrapping_mul(0x0100_0000_01b3);
            }
            #[allow(clippy::cast_possible_truncation)]
            let idx = (h % v.len() as u64) as usize;
            v[idx] += 1.0;
        }
        v
    }
}

impl LlmProvider for MockProvider {
    async fn chat(
        &self,
        messages: &[Message],
        params: GenerationParams,
    ) -> Result<String, LlmError> {
        if self.delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
        }
        self.calls.lock().unwrap().push(RecordedCall {
            messages: messages.to_vec(),
            params,
        });
        if self.fail_chat {
            return Err(LlmError::Other("mock LLM error".into()));
        }
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(self.default_response.clone())
        } else {
            Ok(responses.remove(0))
        }
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        if !self.supports_embeddings {
            return Err(LlmError::EmbedUnsupported { provider: "mock" });
        }
        Ok(match self.hashed_dims {
            Some(dims) => Self::hashed_embedding(text, dims),
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
    async fn queued_responses_then_default() {
        let p = MockProvider::with_responses(vec!["first".into()]);
        let params = GenerationParams::default();
        assert_eq!(p.chat(&[Message::user("a")], params).await.unwrap(), "first");
        assert_eq!(
            p.chat(&[Message::user("b")], params).await.unwrap(),
            "mock response"
        );
        let calls = p.recorded();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[1].messages[0].content, "b");
    }

    #[tokio::test]
    async fn hashed_embeddings_are_deterministic() {
        let p = MockProvider::default().with_hashed_embeddings(32);
        let a = p.embed("SAP PI/PO migration").await.unwrap();
        let b = p.embed("sap pi po MIGRATION").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 32);
    }
}
