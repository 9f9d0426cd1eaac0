use axum::Json;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use rfpgen_core::{ProgressEvent, ProposalRun};
use rfpgen_document::SourceDocument;
use rfpgen_index::IndexManifest;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::error::ApiError;
use super::server::AppState;

pub(crate) const DOCX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ResponseFormat {
    #[default]
    Docx,
    Json,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProposalQuery {
    pub filename: Option<String>,
    #[serde(default)]
    pub format: ResponseFormat,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    index_version: Option<u64>,
}

#[derive(Serialize)]
struct PreviewResponse<'a> {
    #[serde(flatten)]
    run: &'a ProposalRun,
    progress: Vec<ProgressEvent>,
}

/// `Content-Disposition` value with characters outside printable ASCII, quotes
/// and backslashes replaced.
pub(crate) fn attachment_disposition(file_name: &str) -> String {
    let safe: String = file_name
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("attachment; filename=\"{safe}\"")
}

pub(crate) async fn proposal_handler(
    State(state): State<AppState>,
    Query(query): Query<ProposalQuery>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let file_name = query
        .filename
        .filter(|n| !n.trim().is_empty())
        .ok_or(ApiError::MissingFileName)?;
    if body.is_empty() {
        return Err(ApiError::EmptyBody);
    }
    tracing::info!(file = %file_name, bytes = body.len(), "proposal request");

    let (tx, mut rx) = mpsc::unbounded_channel();
    let source = SourceDocument::new(file_name, body.to_vec());
    let result = state.orchestrator.run(source, Some(&tx)).await;
    drop(tx);
    let run = result?;

    match query.format {
        ResponseFormat::Docx => Ok((
            [
                (header::CONTENT_TYPE, DOCX_CONTENT_TYPE.to_owned()),
                (
                    header::CONTENT_DISPOSITION,
                    attachment_disposition(&run.file_name),
                ),
            ],
            run.document,
        )
            .into_response()),
        ResponseFormat::Json => {
            let mut progress = Vec::new();
            while let Ok(event) = rx.try_recv() {
                progress.push(event);
            }
            Ok(Json(PreviewResponse {
                run: &run,
                progress,
            })
            .into_response())
        }
    }
}

pub(crate) async fn index_handler(
    State(state): State<AppState>,
) -> Result<Json<IndexManifest>, ApiError> {
    let manifest = state.orchestrator.rebuild_index().await?;
    tracing::info!(
        version = manifest.version,
        documents = manifest.documents.len(),
        "reference index rebuilt via gateway"
    );
    Ok(Json(manifest))
}

pub(crate) async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let index_version = state
        .orchestrator
        .references()
        .current()
        .await
        .map(|m| m.version);
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.started_at.elapsed().as_secs(),
        index_version,
    })
}
