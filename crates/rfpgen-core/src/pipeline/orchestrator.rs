use std::path::{Path, PathBuf};
use std::sync::Arc;

use rfpgen_document::{Binding, DocumentAssembler, DocumentError, SourceDocument, SourceFormat};
use rfpgen_index::{IndexManifest, ReferenceStore};
use rfpgen_llm::LlmProvider;
use serde::Serialize;

use super::PipelineError;
use super::progress::{ProgressTx, Reporter, Stage};
use crate::detect::{DetectedParameter, detect_parameter};
use crate::generator::{SectionGenerator, SectionInputs};
use crate::sections::{GeneratedSection, Section};

/// Run-independent knobs of the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub min_text_chars: usize,
    pub top_k: usize,
    pub rebuild_on_request: bool,
    pub template_path: PathBuf,
    pub output_prefix: String,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            min_text_chars: 100,
            top_k: 3,
            rebuild_on_request: true,
            template_path: PathBuf::from("Template/PIPO TO IS Response Template.docx"),
            output_prefix: "RFP_Response_".into(),
        }
    }
}

/// Result of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct ProposalRun {
    /// All five sections in document order, for preview.
    pub sections: Vec<GeneratedSection>,
    #[serde(skip)]
    pub document: Vec<u8>,
    pub file_name: String,
    pub detected: Option<DetectedParameter>,
    /// Corpus documents used as style reference, best match first.
    pub references: Vec<String>,
}

impl ProposalRun {
    #[must_use]
    pub fn section(&self, section: Section) -> Option<&GeneratedSection> {
        self.sections.iter().find(|s| s.section == section)
    }
}

/// `RFP_Response_<upload name up to its first '.'>.docx`.
#[must_use]
pub fn output_file_name(prefix: &str, upload_name: &str) -> String {
    let base = Path::new(upload_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(upload_name);
    let stem = base.split('.').next().unwrap_or_default();
    format!("{prefix}{stem}.docx")
}

/// Sequences extraction, detection, retrieval, generation, and assembly.
///
/// Each stage either completes or halts the run; nothing is retried here and
/// no partial document is produced.
pub struct Orchestrator<P> {
    generator: SectionGenerator<P>,
    references: Arc<ReferenceStore>,
    assembler: DocumentAssembler,
    options: PipelineOptions,
}

impl<P: LlmProvider> Orchestrator<P> {
    #[must_use]
    pub fn new(
        generator: SectionGenerator<P>,
        references: Arc<ReferenceStore>,
        assembler: DocumentAssembler,
        options: PipelineOptions,
    ) -> Self {
        Self {
            generator,
            references,
            assembler,
            options,
        }
    }

    #[must_use]
    pub fn references(&self) -> &Arc<ReferenceStore> {
        &self.references
    }

    #[must_use]
    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Rebuild the reference index explicitly.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Corpus` if the corpus cannot be indexed.
    pub async fn rebuild_index(&self) -> Result<IndexManifest, PipelineError> {
        Ok(self.references.rebuild().await?)
    }

    /// Turn one uploaded RFP into a proposal document.
    ///
    /// # Errors
    ///
    /// Returns the first stage failure; see [`PipelineError`].
    pub async fn run(
        &self,
        source: SourceDocument,
        progress: Option<&ProgressTx>,
    ) -> Result<ProposalRun, PipelineError> {
        let report = Reporter(progress);
        let result = self.run_stages(source, report).await;
        if let Err(e) = &result {
            tracing::warn!(stage = %e.stage(), "proposal run failed: {e}");
            report.send(super::ProgressEvent::Failed {
                stage: e.stage(),
                message: e.to_string(),
            });
        }
        result
    }

    async fn run_stages(
        &self,
        source: SourceDocument,
        report: Reporter<'_>,
    ) -> Result<ProposalRun, PipelineError> {
        let file_name = output_file_name(&self.options.output_prefix, &source.file_name);

        report.started(1, Stage::Extract, "Extracting RFP content...");
        let text = extract(source).await?;

        let detected = detect_parameter(&text);
        report.notice(Stage::DetectParameter, DetectedParameter::notice(detected.as_ref()));

        let chars = text.trim().chars().count();
        if chars < self.options.min_text_chars {
            return Err(PipelineError::ExtractionInsufficient {
                chars,
                min: self.options.min_text_chars,
            });
        }
        report.completed(1, Stage::Extract, "RFP content extracted", 20);

        report.started(
            2,
            Stage::Retrieve,
            "Loading knowledge base and retrieving reference documents...",
        );
        if self.options.rebuild_on_request || self.references.current().await.is_none() {
            self.references.rebuild().await?;
        }
        let context = self.references.query(&text, self.options.top_k).await?;
        let reference_text = context.joined();
        report.completed(
            2,
            Stage::Retrieve,
            format!(
                "Retrieved {} relevant reference documents",
                context.entries.len()
            ),
            40,
        );

        let inputs = SectionInputs {
            reference_text: &reference_text,
            source_text: &text,
            interface_count: detected.map(|d| d.count),
        };
        let stage = Stage::GenerateSections;

        report.started(3, stage, "Generating Executive Summary and Objective...");
        let [exec, objective] = self.generator.executive_summary_and_objective(&inputs).await?;
        report.completed(3, stage, "Executive Summary & Objective generated", 60);

        report.started(4, stage, "Generating Scope, Assumptions, and Prerequisites...");
        let scope = self.generator.scope_and_assumptions(&inputs).await?;
        report.completed(4, stage, "Scope and Assumptions section generated", 75);

        report.started(5, stage, "Generating Resource Schedule and Commercials...");
        let resources = self.generator.resource_schedule(&inputs).await?;
        report.completed(5, stage, "Resource Schedule and Commercials generated", 85);

        report.started(6, stage, "Generating Communication Plan...");
        let comms = self.generator.communication_plan(&inputs).await?;
        report.completed(6, stage, "Communication Plan generated", 100);

        let sections = vec![exec, objective, scope, resources, comms];

        report.notice(Stage::Assemble, "Compiling content into DOCX template...");
        let (sections, document) = self.assemble(sections).await?;

        report.notice(Stage::Done, "Proposal response generated successfully");
        Ok(ProposalRun {
            sections,
            document,
            file_name,
            detected,
            references: context.entries.into_iter().map(|e| e.source_id).collect(),
        })
    }

    async fn assemble(
        &self,
        sections: Vec<GeneratedSection>,
    ) -> Result<(Vec<GeneratedSection>, Vec<u8>), PipelineError> {
        let path = &self.options.template_path;
        let template = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(PipelineError::TemplateMissing {
                    path: path.clone(),
                    sections,
                });
            }
            Err(e) => return Err(PipelineError::Assembly(DocumentError::Io(e))),
        };
        let bindings: Vec<Binding<'_>> = sections
            .iter()
            .map(|s| Binding::new(s.section.placeholder(), &s.text))
            .collect();
        let document = self.assembler.render(&template, &bindings)?;
        Ok((sections, document))
    }
}

async fn extract(source: SourceDocument) -> Result<String, PipelineError> {
    if source.format == SourceFormat::Unsupported {
        return Err(PipelineError::UnreadableInput(format!(
            "{}: only PDF and DOCX uploads are supported",
            source.file_name
        )));
    }
    let name = source.file_name.clone();
    tokio::task::spawn_blocking(move || source.extract_text())
        .await
        .map_err(|e| PipelineError::UnreadableInput(format!("{name}: {e}")))?
        .map_err(|e| PipelineError::UnreadableInput(format!("{name}: {e}")))
}
