//! Configuration, parameter detection, section generation, and the proposal pipeline.

pub mod bootstrap;
pub mod config;
pub mod detect;
pub mod generator;
pub mod pipeline;
pub mod prompts;
pub mod sections;

pub use config::Config;
pub use detect::{DetectedParameter, ParameterKind, detect_parameter};
pub use generator::SectionGenerator;
pub use pipeline::{Orchestrator, PipelineError, ProgressEvent, ProposalRun, Stage};
pub use sections::{GeneratedSection, Section};
