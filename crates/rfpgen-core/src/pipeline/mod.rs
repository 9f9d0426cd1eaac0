pub mod orchestrator;
pub mod progress;

use std::path::PathBuf;

use rfpgen_document::DocumentError;
use rfpgen_index::IndexError;
use rfpgen_llm::LlmError;

use crate::sections::{GeneratedSection, Section};

pub use orchestrator::{Orchestrator, PipelineOptions, ProposalRun, output_file_name};
pub use progress::{ProgressEvent, ProgressTx, Stage};

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("cannot read uploaded file: {0}")]
    UnreadableInput(String),

    #[error("could not extract enough text from the document ({chars} characters, need {min})")]
    ExtractionInsufficient { chars: usize, min: usize },

    #[error(transparent)]
    Corpus(#[from] IndexError),

    #[error("generation failed for {section}: {source}")]
    Generation { section: Section, source: LlmError },

    /// The sections were generated; only the DOCX could not be produced.
    #[error("template not found at {}", .path.display())]
    TemplateMissing {
        path: PathBuf,
        sections: Vec<GeneratedSection>,
    },

    #[error("document assembly failed: {0}")]
    Assembly(#[from] DocumentError),
}

impl PipelineError {
    /// Stage at which the run halted.
    #[must_use]
    pub fn stage(&self) -> Stage {
        match self {
            Self::UnreadableInput(_) | Self::ExtractionInsufficient { .. } => Stage::Extract,
            Self::Corpus(_) => Stage::Retrieve,
            Self::Generation { .. } => Stage::GenerateSections,
            Self::TemplateMissing { .. } | Self::Assembly(_) => Stage::Assemble,
        }
    }

    /// True when the failure came from an external service and may succeed on a later attempt.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Generation { source, .. } | Self::Corpus(IndexError::Embedding(source)) => {
                source.is_transient()
            }
            _ => false,
        }
    }
}
