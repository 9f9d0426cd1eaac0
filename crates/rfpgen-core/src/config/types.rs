use std::fmt;
use std::path::PathBuf;

use rfpgen_document::{DEFAULT_MAX_FILE_SIZE, StyleSheet};
use serde::{Deserialize, Serialize};

/// Credential value that never appears in `Debug` or `Display` output.
#[derive(Clone, PartialEq, Eq)]
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

/// Credentials read from the environment only, never from the TOML file.
#[derive(Debug, Clone, Default)]
pub struct ResolvedSecrets {
    pub llm_api_key: Option<Secret>,
    /// Falls back to `llm_api_key` when unset.
    pub embedding_api_key: Option<Secret>,
    pub gateway_token: Option<Secret>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub template: TemplateConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
    #[serde(skip)]
    pub secrets: ResolvedSecrets,
}

/// Chat/embedding backend selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    OpenAi,
    Azure,
}

impl ProviderKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Azure => "azure",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    #[serde(default)]
    pub provider: ProviderKind,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model name, or the deployment name for Azure.
    #[serde(default = "default_chat_model")]
    pub model: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}

fn default_chat_model() -> String {
    "gpt-4o-mini".into()
}

fn default_api_version() -> String {
    "2024-02-01".into()
}

fn default_llm_timeout() -> u64 {
    120
}

fn default_max_retries() -> u32 {
    1
}

fn default_retry_backoff_ms() -> u64 {
    1000
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            base_url: default_base_url(),
            model: default_chat_model(),
            api_version: default_api_version(),
            timeout_secs: default_llm_timeout(),
            max_retries: default_max_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

/// Embedding endpoint, configured separately from the chat deployment.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub provider: ProviderKind,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,
}

fn default_embedding_model() -> String {
    "text-embedding-ada-002".into()
}

fn default_embedding_timeout() -> u64 {
    60
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            base_url: default_base_url(),
            model: default_embedding_model(),
            api_version: default_api_version(),
            timeout_secs: default_embedding_timeout(),
        }
    }
}

/// Upper bound on generated length for each generation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct SectionTokenLimits {
    #[serde(default = "default_executive_tokens")]
    pub executive_objective: u32,
    #[serde(default = "default_scope_tokens")]
    pub scope: u32,
    #[serde(default = "default_resource_tokens")]
    pub resource_schedule: u32,
    #[serde(default = "default_communication_tokens")]
    pub communication_plan: u32,
}

fn default_executive_tokens() -> u32 {
    2000
}

fn default_scope_tokens() -> u32 {
    1200
}

fn default_resource_tokens() -> u32 {
    2000
}

fn default_communication_tokens() -> u32 {
    2500
}

impl Default for SectionTokenLimits {
    fn default() -> Self {
        Self {
            executive_objective: default_executive_tokens(),
            scope: default_scope_tokens(),
            resource_schedule: default_resource_tokens(),
            communication_plan: default_communication_tokens(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GenerationConfig {
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default)]
    pub max_tokens: SectionTokenLimits,
    #[serde(default = "default_vendor_name")]
    pub vendor_name: String,
    /// Year the vendor's SAP partnership began; 0 leaves it out of prompts.
    #[serde(default = "default_partner_since")]
    pub partner_since: u16,
    /// Truncate the RFP text embedded in prompts; 0 keeps it whole.
    #[serde(default)]
    pub max_source_chars: usize,
}

fn default_temperature() -> f32 {
    0.3
}

fn default_vendor_name() -> String {
    "Crave InfoTech".into()
}

fn default_partner_since() -> u16 {
    2007
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: default_temperature(),
            max_tokens: SectionTokenLimits::default(),
            vendor_name: default_vendor_name(),
            partner_since: default_partner_since(),
            max_source_chars: 0,
        }
    }
}

/// Vector store holding the reference index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorBackend {
    #[default]
    Memory,
    Qdrant,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CorpusConfig {
    #[serde(default = "default_corpus_folder")]
    pub folder: PathBuf,
    #[serde(default = "default_persist_dir")]
    pub persist_dir: PathBuf,
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default)]
    pub backend: VectorBackend,
    #[serde(default = "default_qdrant_url")]
    pub qdrant_url: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Rebuild the index before every generation request.
    #[serde(default = "default_true")]
    pub rebuild_on_request: bool,
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Characters of each document sent to the embedding endpoint; 0 sends all.
    #[serde(default)]
    pub embed_max_chars: usize,
}

fn default_corpus_folder() -> PathBuf {
    PathBuf::from("Knowledge_Repo")
}

fn default_persist_dir() -> PathBuf {
    PathBuf::from("chroma_db")
}

fn default_collection() -> String {
    "rfp_responses".into()
}

fn default_qdrant_url() -> String {
    "http://localhost:6334".into()
}

fn default_top_k() -> usize {
    3
}

fn default_true() -> bool {
    true
}

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            folder: default_corpus_folder(),
            persist_dir: default_persist_dir(),
            collection: default_collection(),
            backend: VectorBackend::default(),
            qdrant_url: default_qdrant_url(),
            top_k: default_top_k(),
            rebuild_on_request: true,
            max_file_size: default_max_file_size(),
            embed_max_chars: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    /// Extracted text shorter than this (after trimming) halts the run.
    #[serde(default = "default_min_text_chars")]
    pub min_text_chars: usize,
}

fn default_min_text_chars() -> usize {
    100
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            min_text_chars: default_min_text_chars(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TemplateConfig {
    #[serde(default = "default_template_path")]
    pub path: PathBuf,
    #[serde(default = "default_output_prefix")]
    pub output_prefix: String,
    #[serde(default)]
    pub styles: TemplateStyles,
}

fn default_template_path() -> PathBuf {
    PathBuf::from("Template/PIPO TO IS Response Template.docx")
}

fn default_output_prefix() -> String {
    "RFP_Response_".into()
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            path: default_template_path(),
            output_prefix: default_output_prefix(),
            styles: TemplateStyles::default(),
        }
    }
}

/// Style ids and table colors; unset fields keep the assembler defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TemplateStyles {
    #[serde(default)]
    pub heading_style: Option<String>,
    #[serde(default)]
    pub bullet_style: Option<String>,
    #[serde(default)]
    pub bullet_num_id: Option<u32>,
    #[serde(default)]
    pub table_style: Option<String>,
    #[serde(default)]
    pub header_fill: Option<String>,
    #[serde(default)]
    pub header_text_color: Option<String>,
    #[serde(default)]
    pub row_fill: Option<String>,
    #[serde(default)]
    pub border_color: Option<String>,
    #[serde(default)]
    pub column_width_twips: Option<u32>,
}

impl TemplateStyles {
    #[must_use]
    pub fn to_style_sheet(&self) -> StyleSheet {
        let mut sheet = StyleSheet::default();
        let overrides = [
            (&self.heading_style, &mut sheet.heading_style),
            (&self.bullet_style, &mut sheet.bullet_style),
            (&self.table_style, &mut sheet.table_style),
            (&self.header_fill, &mut sheet.header_fill),
            (&self.header_text_color, &mut sheet.header_text_color),
            (&self.row_fill, &mut sheet.row_fill),
            (&self.border_color, &mut sheet.border_color),
        ];
        for (value, slot) in overrides {
            if let Some(v) = value {
                slot.clone_from(v);
            }
        }
        if self.bullet_num_id.is_some() {
            sheet.bullet_num_id = self.bullet_num_id;
        }
        if let Some(width) = self.column_width_twips {
            sheet.column_width_twips = width;
        }
        sheet
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatewayConfig {
    #[serde(default = "default_gateway_bind")]
    pub bind: String,
    #[serde(default = "default_gateway_port")]
    pub port: u16,
    /// Requests per minute per client address on the upload routes; 0 disables.
    #[serde(default = "default_gateway_rate_limit")]
    pub rate_limit: u32,
    #[serde(default = "default_gateway_max_body")]
    pub max_body_size: usize,
}

fn default_gateway_bind() -> String {
    "127.0.0.1".into()
}

fn default_gateway_port() -> u16 {
    8090
}

fn default_gateway_rate_limit() -> u32 {
    30
}

fn default_gateway_max_body() -> usize {
    52_428_800
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: default_gateway_bind(),
            port: default_gateway_port(),
            rate_limit: default_gateway_rate_limit(),
            max_body_size: default_gateway_max_body(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// `"otlp"` enables span export when built with the `otel` feature.
    #[serde(default)]
    pub exporter: String,
    #[serde(default = "default_otlp_endpoint")]
    pub endpoint: String,
}

fn default_otlp_endpoint() -> String {
    "http://localhost:4317".into()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            exporter: String::new(),
            endpoint: default_otlp_endpoint(),
        }
    }
}
