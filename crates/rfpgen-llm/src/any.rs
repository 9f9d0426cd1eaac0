#[cfg(feature = "mock")]
use crate::mock::MockProvider;
use crate::openai::OpenAiProvider;
use crate::provider::{EmbedFuture, GenerationParams, LlmProvider, Message, StatusTx};

/// Generates a match over all `AnyProvider` variants, binding the inner provider
/// and evaluating the given closure for each arm.
macro_rules! delegate_provider {
    ($self:expr, |$p:ident| $expr:expr) => {
        match $self {
            AnyProvider::OpenAi($p) => $expr,
            #[cfg(feature = "mock")]
            AnyProvider::Mock($p) => $expr,
        }
    };
}

#[derive(Debug, Clone)]
pub enum AnyProvider {
    OpenAi(OpenAiProvider),
    #[cfg(feature = "mock")]
    Mock(MockProvider),
}

impl AnyProvider {
    /// Return a cloneable closure that calls `embed()` on this provider.
    pub fn embed_fn(&self) -> impl Fn(&str) -> EmbedFuture + Send + Sync + use<> {
        let provider = std::sync::Arc::new(self.clone());
        move |text: &str| -> EmbedFuture {
            let p = std::sync::Arc::clone(&provider);
            let owned = text.to_owned();
            Box::pin(async move { p.embed(&owned).await })
        }
    }

    /// Propagate a status sender to the inner provider (where supported).
    pub fn set_status_tx(&mut self, tx: StatusTx) {
        match self {
            Self::OpenAi(p) => {
                p.status_tx = Some(tx);
            }
            #[cfg(feature = "mock")]
            Self::Mock(_) => {}
        }
    }
}

impl LlmProvider for AnyProvider {
    async fn chat(
        &self,
        messages: &[Message],
        params: GenerationParams,
    ) -> Result<String, crate::LlmError> {
        delegate_provider!(self, |p| p.chat(messages, params).await)
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, crate::LlmError> {
        delegate_provider!(self, |p| p.embed(text).await)
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

    #[test]
    fn openai_variant_delegates_name() {
        let p = AnyProvider::OpenAi(OpenAiProvider::new(
            "k".into(),
            "http://127.0.0.1:1".into(),
            "m".into(),
            None,
        ));
        assert_eq!(p.name(), "openai");
        assert!(!p.supports_embeddings());
    }

    #[tokio::test]
    async fn embed_fn_surfaces_provider_error() {
        let p = AnyProvider::OpenAi(OpenAiProvider::new(
            "k".into(),
            "http://127.0.0.1:1".into(),
            "m".into(),
            None,
        ));
        let f = p.embed_fn();
        assert!(f("text").await.is_err());
    }
}
