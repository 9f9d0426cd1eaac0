use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// Boxed future returned by embedding closures handed to the index.
pub type EmbedFuture = Pin<Box<dyn Future<Output = Result<Vec<f32>, LlmError>> + Send>>;

/// Channel for human-readable status lines (retry notices and the like).
pub type StatusTx = tokio::sync::mpsc::UnboundedSender<String>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// Sampling parameters for a single completion call.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            max_tokens: 2000,
        }
    }
}

pub trait LlmProvider: Send + Sync {
    /// Send messages to the model and return the assistant text, trimmed.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider fails to communicate or the response is empty.
    fn chat(
        &self,
        messages: &[Message],
        params: GenerationParams,
    ) -> impl Future<Output = Result<String, LlmError>> + Send;

    /// Embed `text` into a dense vector.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::EmbedUnsupported` when no embedding model is configured.
    fn embed(&self, text: &str) -> impl Future<Output = Result<Vec<f32>, LlmError>> + Send;

    fn supports_embeddings(&self) -> bool;

    fn name(&self) -> &str;
}
