use std::path::PathBuf;

use super::{Config, Secret};

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_providers();
        self.apply_env_overrides_pipeline();
        self.apply_env_overrides_secrets();
    }

    fn apply_env_overrides_providers(&mut self) {
        if let Ok(v) = std::env::var("RFPGEN_LLM_PROVIDER") {
            if let Ok(kind) = serde_json::from_value(serde_json::Value::String(v.clone())) {
                self.llm.provider = kind;
            } else {
                tracing::warn!("ignoring invalid RFPGEN_LLM_PROVIDER value: {v}");
            }
        }
        if let Ok(v) = std::env::var("RFPGEN_LLM_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Ok(v) = std::env::var("RFPGEN_LLM_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("RFPGEN_LLM_API_VERSION") {
            self.llm.api_version = v;
        }
        if let Ok(v) = std::env::var("RFPGEN_LLM_TIMEOUT") {
            if let Ok(secs) = v.parse::<u64>() {
                self.llm.timeout_secs = secs;
            } else {
                tracing::warn!("ignoring invalid RFPGEN_LLM_TIMEOUT value: {v}");
            }
        }
        if let Ok(v) = std::env::var("RFPGEN_LLM_MAX_RETRIES") {
            if let Ok(n) = v.parse::<u32>() {
                self.llm.max_retries = n;
            } else {
                tracing::warn!("ignoring invalid RFPGEN_LLM_MAX_RETRIES value: {v}");
            }
        }
        if let Ok(v) = std::env::var("RFPGEN_EMBEDDING_PROVIDER") {
            if let Ok(kind) = serde_json::from_value(serde_json::Value::String(v.clone())) {
                self.embedding.provider = kind;
            } else {
                tracing::warn!("ignoring invalid RFPGEN_EMBEDDING_PROVIDER value: {v}");
            }
        }
        if let Ok(v) = std::env::var("RFPGEN_EMBEDDING_BASE_URL") {
            self.embedding.base_url = v;
        }
        if let Ok(v) = std::env::var("RFPGEN_EMBEDDING_MODEL") {
            self.embedding.model = v;
        }
        if let Ok(v) = std::env::var("RFPGEN_EMBEDDING_API_VERSION") {
            self.embedding.api_version = v;
        }
    }

    fn apply_env_overrides_pipeline(&mut self) {
        if let Ok(v) = std::env::var("RFPGEN_GENERATION_TEMPERATURE") {
            if let Ok(t) = v.parse::<f32>() {
                self.generation.temperature = t;
            } else {
                tracing::warn!("ignoring invalid RFPGEN_GENERATION_TEMPERATURE value: {v}");
            }
        }
        if let Ok(v) = std::env::var("RFPGEN_VENDOR_NAME") {
            self.generation.vendor_name = v;
        }
        if let Ok(v) = std::env::var("RFPGEN_VENDOR_PARTNER_SINCE") {
            if let Ok(year) = v.parse::<u16>() {
                self.generation.partner_since = year;
            } else {
                tracing::warn!("ignoring invalid RFPGEN_VENDOR_PARTNER_SINCE value: {v}");
            }
        }
        if let Ok(v) = std::env::var("RFPGEN_CORPUS_FOLDER") {
            self.corpus.folder = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("RFPGEN_CORPUS_PERSIST_DIR") {
            self.corpus.persist_dir = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("RFPGEN_CORPUS_BACKEND") {
            if let Ok(backend) = serde_json::from_value(serde_json::Value::String(v.clone())) {
                self.corpus.backend = backend;
            } else {
                tracing::warn!("ignoring invalid RFPGEN_CORPUS_BACKEND value: {v}");
            }
        }
        if let Ok(v) = std::env::var("RFPGEN_QDRANT_URL") {
            self.corpus.qdrant_url = v;
        }
        if let Ok(v) = std::env::var("RFPGEN_CORPUS_TOP_K")
            && let Ok(k) = v.parse::<usize>()
        {
            self.corpus.top_k = k;
        }
        if let Ok(v) = std::env::var("RFPGEN_CORPUS_REBUILD_ON_REQUEST")
            && let Ok(enabled) = v.parse::<bool>()
        {
            self.corpus.rebuild_on_request = enabled;
        }
        if let Ok(v) = std::env::var("RFPGEN_PIPELINE_MIN_TEXT_CHARS")
            && let Ok(n) = v.parse::<usize>()
        {
            self.pipeline.min_text_chars = n;
        }
        if let Ok(v) = std::env::var("RFPGEN_TEMPLATE_PATH") {
            self.template.path = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("RFPGEN_GATEWAY_BIND") {
            self.gateway.bind = v;
        }
        if let Ok(v) = std::env::var("RFPGEN_GATEWAY_PORT")
            && let Ok(port) = v.parse::<u16>()
        {
            self.gateway.port = port;
        }
        if let Ok(v) = std::env::var("RFPGEN_GATEWAY_RATE_LIMIT")
            && let Ok(limit) = v.parse::<u32>()
        {
            self.gateway.rate_limit = limit;
        }
        if let Ok(v) = std::env::var("RFPGEN_GATEWAY_MAX_BODY")
            && let Ok(size) = v.parse::<usize>()
        {
            self.gateway.max_body_size = size;
        }
        if let Ok(v) = std::env::var("RFPGEN_OTEL_EXPORTER") {
            self.observability.exporter = v;
        }
        if let Ok(v) = std::env::var("RFPGEN_OTEL_ENDPOINT") {
            self.observability.endpoint = v;
        }
    }

    fn apply_env_overrides_secrets(&mut self) {
        let non_empty = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());
        if let Some(v) = non_empty("RFPGEN_LLM_API_KEY") {
            self.secrets.llm_api_key = Some(Secret::new(v));
        }
        if let Some(v) = non_empty("RFPGEN_EMBEDDING_API_KEY") {
            self.secrets.embedding_api_key = Some(Secret::new(v));
        }
        if let Some(v) = non_empty("RFPGEN_GATEWAY_TOKEN") {
            self.secrets.gateway_token = Some(Secret::new(v));
        }
    }
}
