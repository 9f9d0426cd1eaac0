use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use rfpgen_core::bootstrap::AppBuilder;
use rfpgen_core::config::resolve_config_path;
#[cfg(feature = "otel")]
use rfpgen_core::Config;
use rfpgen_core::{GeneratedSection, Orchestrator, PipelineError, ProgressEvent};
use rfpgen_document::SourceDocument;
use rfpgen_gateway::GatewayServer;
use rfpgen_llm::AnyProvider;
use tokio::sync::{mpsc, watch};

#[derive(Debug, Parser)]
#[command(name = "rfpgen", version, about = "Draft SAP migration proposals from RFP documents")]
struct Cli {
    /// Path to the TOML config (defaults to RFPGEN_CONFIG, then config/default.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Generate a proposal DOCX from an RFP (PDF or DOCX).
    Generate {
        file: PathBuf,
        /// Directory the proposal is written to.
        #[arg(long, default_value = ".")]
        out: PathBuf,
        /// Print the generated sections.
        #[arg(long)]
        preview: bool,
    },
    /// Rebuild the reference index from the corpus folder.
    Index,
    /// Serve the HTTP upload gateway.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_subscriber(&resolve_config_path(cli.config.as_deref()));

    let app = AppBuilder::load(cli.config.as_deref())?;
    tracing::debug!(path = %app.config_path().display(), "configuration loaded");

    let (provider, status_rx) = app.build_provider()?;
    tokio::spawn(forward_status_to_stderr(status_rx));
    let orchestrator = app.build_orchestrator(provider).await?;

    match cli.command {
        Command::Generate { file, out, preview } => {
            generate(&orchestrator, &file, &out, preview).await
        }
        Command::Index => index(&orchestrator).await,
        Command::Serve => serve(&app, orchestrator).await,
    }
}

async fn generate(
    orchestrator: &Orchestrator<AnyProvider>,
    file: &Path,
    out: &Path,
    preview: bool,
) -> anyhow::Result<()> {
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let file_name = file
        .file_name()
        .map_or_else(|| file.display().to_string(), |n| n.to_string_lossy().into_owned());

    let (progress_tx, progress_rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(print_progress(progress_rx));
    let result = orchestrator
        .run(SourceDocument::new(file_name, bytes), Some(&progress_tx))
        .await;
    drop(progress_tx);
    let _ = printer.await;

    let run = match result {
        Ok(run) => run,
        Err(PipelineError::TemplateMissing { path, sections }) => {
            print_sections(&sections);
            anyhow::bail!(
                "template not found at {}; the generated sections are shown above",
                path.display()
            );
        }
        Err(e) => return Err(e.into()),
    };

    if preview {
        print_sections(&run.sections);
    }

    tokio::fs::create_dir_all(out)
        .await
        .with_context(|| format!("failed to create {}", out.display()))?;
    let path = out.join(&run.file_name);
    tokio::fs::write(&path, &run.document)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!("Proposal written to {}", path.display());
    if !run.references.is_empty() {
        println!("Style references: {}", run.references.join(", "));
    }
    Ok(())
}

async fn index(orchestrator: &Orchestrator<AnyProvider>) -> anyhow::Result<()> {
    let manifest = orchestrator.rebuild_index().await?;
    println!(
        "Indexed {} documents into {} (version {})",
        manifest.documents.len(),
        manifest.collection,
        manifest.version
    );
    for doc in &manifest.documents {
        println!("  {doc}");
    }
    Ok(())
}

async fn serve(app: &AppBuilder, orchestrator: Orchestrator<AnyProvider>) -> anyhow::Result<()> {
    let config = app.config();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {e}");
            return;
        }
        tracing::info!("received shutdown signal");
        let _ = shutdown_tx.send(true);
    });

    let token = config
        .secrets
        .gateway_token
        .as_ref()
        .map(|t| t.expose().to_owned());
    GatewayServer::from_config(&config.gateway, token, Arc::new(orchestrator), shutdown_rx)
        .serve()
        .await?;
    Ok(())
}

async fn print_progress(mut rx: mpsc::UnboundedReceiver<ProgressEvent>) {
    while let Some(event) = rx.recv().await {
        match event {
            ProgressEvent::Failed { .. } => eprintln!("{event}"),
            _ => println!("{event}"),
        }
    }
}

fn print_sections(sections: &[GeneratedSection]) {
    for section in sections {
        println!("\n=== {} ===\n{}", section.section.title(), section.text);
    }
}

async fn forward_status_to_stderr(mut rx: mpsc::UnboundedReceiver<String>) {
    while let Some(msg) = rx.recv().await {
        eprintln!("[status] {msg}");
    }
}

fn init_subscriber(config_path: &Path) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    #[cfg(feature = "otel")]
    {
        let config = Config::load(config_path).ok();
        let use_otlp = config
            .as_ref()
            .is_some_and(|c| c.observability.exporter == "otlp");

        if use_otlp {
            let endpoint = config
                .as_ref()
                .map_or("http://localhost:4317", |c| &c.observability.endpoint);

            match setup_otel_tracer(endpoint) {
                Ok(tracer) => {
                    let otel_layer = tracing_opentelemetry::layer().with_tracer(tracer);
                    tracing_subscriber::registry()
                        .with(filter)
                        .with(fmt_layer)
                        .with(otel_layer)
                        .init();
                    return;
                }
                Err(e) => {
                    eprintln!("OTel initialization failed, falling back to fmt: {e}");
                }
            }
        }
    }

    #[cfg(not(feature = "otel"))]
    let _ = config_path;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

#[cfg(feature = "otel")]
fn setup_otel_tracer(endpoint: &str) -> anyhow::Result<opentelemetry_sdk::trace::SdkTracer> {
    use opentelemetry::trace::TracerProvider;
    use opentelemetry_otlp::WithExportConfig;

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()?;

    let provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .build();

    let tracer = provider.tracer("rfpgen");
    opentelemetry::global::set_tracer_provider(provider);

    Ok(tracer)
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn generate_defaults() {
        let cli = Cli::try_parse_from(["rfpgen", "generate", "tender.pdf"]).unwrap();
        match cli.command {
            Command::Generate { file, out, preview } => {
                assert_eq!(file, Path::new("tender.pdf"));
                assert_eq!(out, Path::new("."));
                assert!(!preview);
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(cli.config.is_none());
    }

    #[test]
    fn global_config_flag_after_subcommand() {
        let cli = Cli::try_parse_from([
            "rfpgen",
            "generate",
            "rfp.docx",
            "--preview",
            "--out",
            "proposals",
            "--config",
            "local.toml",
        ])
        .unwrap();
        assert_eq!(cli.config.as_deref(), Some(Path::new("local.toml")));
        assert!(matches!(
            cli.command,
            Command::Generate { preview: true, .. }
        ));
    }

    #[test]
    fn generate_requires_file() {
        assert!(Cli::try_parse_from(["rfpgen", "generate"]).is_err());
    }

    #[test]
    fn serve_and_index_parse() {
        assert!(matches!(
            Cli::try_parse_from(["rfpgen", "serve"]).unwrap().command,
            Command::Serve
        ));
        assert!(matches!(
            Cli::try_parse_from(["rfpgen", "index"]).unwrap().command,
            Command::Index
        ));
    }
}
