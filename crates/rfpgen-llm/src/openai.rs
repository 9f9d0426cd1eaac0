use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::provider::{GenerationParams, LlmProvider, Message, Role, StatusTx};
use crate::retry::{RetryPolicy, send_with_retry};

/// URL and authentication scheme of the chat endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ApiFlavor {
    /// `{base}/chat/completions` with a bearer token.
    OpenAi,
    /// `{base}/openai/deployments/{deployment}/...?api-version=` with an `api-key` header.
    Azure { api_version: String },
}

#[derive(Clone)]
pub struct OpenAiProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    embedding_model: Option<String>,
    flavor: ApiFlavor,
    retry: RetryPolicy,
    pub(crate) status_tx: Option<StatusTx>,
}

impl fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("client", &"<reqwest::Client>")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("embedding_model", &self.embedding_model)
            .field("flavor", &self.flavor)
            .field("retry", &self.retry)
            .field("status_tx", &self.status_tx.is_some())
            .finish()
    }
}

impl OpenAiProvider {
    #[must_use]
    pub fn new(
        api_key: String,
        mut base_url: String,
        model: String,
        embedding_model: Option<String>,
    ) -> Self {
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            client: crate::http::default_client(),
            api_key,
            base_url,
            model,
            embedding_model,
            flavor: ApiFlavor::OpenAi,
            retry: RetryPolicy::default(),
            status_tx: None,
        }
    }

    #[must_use]
    pub fn with_flavor(mut self, flavor: ApiFlavor) -> Self {
        self.flavor = flavor;
        self
    }

    /// Apply a retry policy; the HTTP client timeout follows `policy.request_timeout`.
    #[must_use]
    pub fn with_retry(mut self, policy: RetryPolicy) -> Self {
        self.client = crate::http::client_with_timeout(policy.request_timeout);
        self.retry = policy;
        self
    }

    #[must_use]
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    #[must_use]
    pub fn with_status_tx(mut self, tx: StatusTx) -> Self {
        self.status_tx = Some(tx);
        self
    }

    fn endpoint(&self, deployment: &str, operation: &str) -> String {
        match &self.flavor {
            ApiFlavor::OpenAi => format!("{}/{operation}", self.base_url),
            ApiFlavor::Azure { api_version } => format!(
                "{}/openai/deployments/{deployment}/{operation}?api-version={api_version}",
                self.base_url
            ),
        }
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.flavor {
            ApiFlavor::OpenAi => builder.header("Authorization", format!("Bearer {}", self.api_key)),
            ApiFlavor::Azure { .. } => builder.header("api-key", &self.api_key),
        }
    }

    async fn post_json<B: Serialize + Sync>(&self, url: &str, body: &B) -> Result<String, LlmError> {
        let response = send_with_retry(self.name(), &self.retry, self.status_tx.as_ref(), || {
            self.authorize(self.client.post(url))
                .header("Content-Type", "application/json")
                .json(body)
                .send()
        })
        .await?;
        response.text().await.map_err(LlmError::Http)
    }
}

impl LlmProvider for OpenAiProvider {
    async fn chat(
        &self,
        messages: &[Message],
        params: GenerationParams,
    ) -> Result<String, LlmError> {
        let api_messages: Vec<ApiMessage<'_>> = messages
            .iter()
            .map(|m| ApiMessage {
                role: role_str(m.role),
                content: &m.content,
            })
            .collect();
        let body = ChatRequest {
            model: &self.model,
            messages: &api_messages,
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        };

        let url = self.endpoint(&self.model, "chat/completions");
        let text = self.post_json(&url, &body).await?;
        let resp: ChatCompletion = serde_json::from_str(&text)?;

        if let Some(usage) = &resp.usage {
            tracing::debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "chat completion usage"
            );
        }

        let content = resp
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_owned())
            .unwrap_or_default();
        if content.is_empty() {
            return Err(LlmError::EmptyResponse { provider: "openai" });
        }
        Ok(content)
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let model = self
            .embedding_model
            .as_deref()
            .ok_or(LlmError::EmbedUnsupported { provider: "openai" })?;

        let body = EmbeddingRequest { input: text, model };
        let url = self.endpoint(model, "embeddings");
        let text = self.post_json(&url, &body).await?;
        let resp: EmbeddingResponse = serde_json::from_str(&text)?;

        resp.data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or(LlmError::EmptyResponse { provider: "openai" })
    }

    fn supports_embeddings(&self) -> bool {
        self.embedding_model.is_some()
    }

    fn name(&self) -> &'static str {
        match self.flavor {
            ApiFlavor::OpenAi => "openai",
            ApiFlavor::Azure { .. } => "azure",
        }
    }
}

fn role_str(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ApiMessage<'a>],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ApiMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a str,
    model: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}
