use std::sync::Arc;
use std::time::Instant;

use rfpgen_core::config::GenerationConfig;
use rfpgen_core::pipeline::PipelineOptions;
use rfpgen_core::{Orchestrator, SectionGenerator};
use rfpgen_document::DocumentAssembler;
use rfpgen_document::fixture::{docx_with_paragraphs, proposal_template};
use rfpgen_index::{InMemoryVectorStore, ReferenceStore, ReferenceStoreConfig};
use rfpgen_llm::AnyProvider;
use rfpgen_llm::mock::MockProvider;

use crate::server::AppState;

pub(crate) const RFP: &str = "Request for Proposal: migrate our SAP PI/PO 7.5 landscape with \
    about 120 interfaces to SAP Integration Suite. Describe scope, team, commercials and governance.";

/// Corpus, template and a mock-backed orchestrator in a temp directory.
pub(crate) struct Fixture {
    pub dir: tempfile::TempDir,
    state: AppState,
}

impl Fixture {
    pub fn new(responses: Vec<String>) -> Self {
        Self::with_chat(MockProvider::with_responses(responses))
    }

    pub fn with_chat(chat: MockProvider) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let corpus = dir.path().join("Knowledge_Repo");
        std::fs::create_dir_all(&corpus).unwrap();
        std::fs::write(
            corpus.join("prior.docx"),
            docx_with_paragraphs(&["Earlier PI/PO to Integration Suite proposal"]),
        )
        .unwrap();
        let template_path = dir.path().join("template.docx");
        std::fs::write(&template_path, proposal_template()).unwrap();

        let embedder = AnyProvider::Mock(MockProvider::default().with_hashed_embeddings(16));
        let references = ReferenceStore::new(
            Arc::new(InMemoryVectorStore::new()),
            Box::new(embedder.embed_fn()),
            ReferenceStoreConfig {
                corpus_dir: corpus,
                persist_dir: dir.path().join("chroma_db"),
                collection: "rfp_responses".into(),
                embed_max_chars: 0,
            },
        );
        let orchestrator = Orchestrator::new(
            SectionGenerator::new(AnyProvider::Mock(chat), GenerationConfig::default()),
            Arc::new(references),
            DocumentAssembler::default(),
            PipelineOptions {
                template_path,
                ..PipelineOptions::default()
            },
        );
        Self {
            dir,
            state: AppState {
                orchestrator: Arc::new(orchestrator),
                started_at: Instant::now(),
            },
        }
    }

    pub fn state(&self) -> AppState {
        self.state.clone()
    }
}

pub(crate) fn section_responses() -> Vec<String> {
    vec![
        "**Executive Summary**\nWe propose a phased migration.\n**Objective**\nMove all 120 interfaces."
            .into(),
        "### In Scope\n- Migrate 120 interfaces".into(),
        "| Role | Count |\n|---|---|\n| Architect | 1 |".into(),
        "Weekly status calls with the client PMO.".into(),
    ]
}

pub(crate) fn rfp_docx() -> Vec<u8> {
    docx_with_paragraphs(&[RFP])
}
