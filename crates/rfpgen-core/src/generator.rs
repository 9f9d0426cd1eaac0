use rfpgen_llm::{GenerationParams, LlmProvider, Message};

use crate::config::GenerationConfig;
use crate::pipeline::PipelineError;
use crate::prompts::{self, PromptContext};
use crate::sections::{GeneratedSection, Section, split_summary_objective};

/// Request-scoped inputs shared by all section prompts.
#[derive(Debug, Clone, Copy)]
pub struct SectionInputs<'a> {
    pub reference_text: &'a str,
    pub source_text: &'a str,
    pub interface_count: Option<u32>,
}

/// Builds the section prompts and calls the text-generation service, one
/// call at a time.
pub struct SectionGenerator<P> {
    provider: P,
    config: GenerationConfig,
}

impl<P: LlmProvider> SectionGenerator<P> {
    #[must_use]
    pub fn new(provider: P, config: GenerationConfig) -> Self {
        Self { provider, config }
    }

    #[must_use]
    pub fn provider(&self) -> &P {
        &self.provider
    }

    fn context<'a>(&'a self, inputs: &SectionInputs<'a>, condensed: &'a str) -> PromptContext<'a> {
        PromptContext {
            vendor: &self.config.vendor_name,
            partner_since: Some(self.config.partner_since).filter(|y| *y > 0),
            reference_text: inputs.reference_text,
            source_text: condensed,
            // A quoted count of zero reads as "no count" in prose.
            interface_count: inputs.interface_count.filter(|n| *n > 0),
        }
    }

    async fn call(
        &self,
        section: Section,
        prompt: String,
        max_tokens: u32,
    ) -> Result<String, PipelineError> {
        let params = GenerationParams {
            temperature: self.config.temperature,
            max_tokens,
        };
        tracing::debug!(%section, max_tokens, prompt_chars = prompt.len(), "generating section");
        let text = self
            .provider
            .chat(&[Message::user(prompt)], params)
            .await
            .map_err(|source| PipelineError::Generation { section, source })?;
        Ok(text.trim().to_owned())
    }

    /// One call producing both the executive summary and the objective.
    ///
    /// # Errors
    ///
    /// Returns `PipelineError::Generation` if the service call fails.
    pub async fn executive_summary_and_objective(
        &self,
        inputs: &SectionInputs<'_>,
    ) -> Result<[GeneratedSection; 2], PipelineError> {
        let condensed = condense(inputs.source_text, self.config.max_source_chars);
        let prompt = prompts::executive_summary_and_objective(&self.context(inputs, &condensed));
        let response = self
            .call(
                Section::ExecutiveSummary,
                prompt,
                self.config.max_tokens.executive_objective,
            )
            .await?;
        let (exec, objective) = split_summary_objective(&response);
        if objective.is_empty() {
            tracing::warn!("no Objective header in response, objective left empty");
        }
        Ok([
            GeneratedSection::new(Section::ExecutiveSummary, exec),
            GeneratedSection::new(Section::Objective, objective),
        ])
    }

    /// # Errors
    ///
    /// Returns `PipelineError::Generation` if the service call fails.
    pub async fn scope_and_assumptions(
        &self,
        inputs: &SectionInputs<'_>,
    ) -> Result<GeneratedSection, PipelineError> {
        let condensed = condense(inputs.source_text, self.config.max_source_chars);
        let prompt = prompts::scope_and_assumptions(&self.context(inputs, &condensed));
        let section = Section::ScopeAndAssumptions;
        let text = self
            .call(section, prompt, self.config.max_tokens.scope)
            .await?;
        Ok(GeneratedSection::new(section, text))
    }

    /// # Errors
    ///
    /// Returns `PipelineError::Generation` if the service call fails.
    pub async fn resource_schedule(
        &self,
        inputs: &SectionInputs<'_>,
    ) -> Result<GeneratedSection, PipelineError> {
        let condensed = condense(inputs.source_text, self.config.max_source_chars);
        let prompt = prompts::resource_schedule_and_commercials(&self.context(inputs, &condensed));
        let section = Section::ResourceSchedule;
        let text = self
            .call(section, prompt, self.config.max_tokens.resource_schedule)
            .await?;
        Ok(GeneratedSection::new(section, text))
    }

    /// # Errors
    ///
    /// Returns `PipelineError::Generation` if the service call fails.
    pub async fn communication_plan(
        &self,
        inputs: &SectionInputs<'_>,
    ) -> Result<GeneratedSection, PipelineError> {
        let condensed = condense(inputs.source_text, self.config.max_source_chars);
        let prompt = prompts::communication_plan(&self.context(inputs, &condensed));
        let section = Section::CommunicationPlan;
        let text = self
            .call(section, prompt, self.config.max_tokens.communication_plan)
            .await?;
        Ok(GeneratedSection::new(section, text))
    }
}

/// Collapse runs of blank lines and cap the length at `max_chars` characters
/// (0 keeps everything).
#[must_use]
pub fn condense(text: &str, max_chars: usize) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = false;
    for line in text.lines().map(str::trim_end) {
        if line.trim().is_empty() {
            if !blank_run && !out.is_empty() {
                out.push('\n');
            }
            blank_run = true;
            continue;
        }
        blank_run = false;
        out.push_str(line);
        out.push('\n');
    }
    let trimmed_len = out.trim_end().len();
    out.truncate(trimmed_len);

    if max_chars > 0
        && let Some((idx, _)) = out.char_indices().nth(max_chars)
    {
        out.truncate(idx);
    }
    out
}
