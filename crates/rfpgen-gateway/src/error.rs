use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rfpgen_core::{GeneratedSection, PipelineError, Stage};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("failed to bind {0}: {1}")]
    Bind(String, std::io::Error),
    #[error("server error: {0}")]
    Server(String),
}

/// Request-level failure rendered as a JSON body.
#[derive(Debug, Error)]
pub(crate) enum ApiError {
    #[error("missing `filename` query parameter")]
    MissingFileName,
    #[error("request body is empty")]
    EmptyBody,
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    stage: Option<Stage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sections: Option<&'a [GeneratedSection]>,
}

impl ApiError {
    pub(crate) fn status(&self) -> StatusCode {
        match self {
            Self::MissingFileName | Self::EmptyBody => StatusCode::BAD_REQUEST,
            Self::Pipeline(e) => match e {
                PipelineError::UnreadableInput(_) => StatusCode::BAD_REQUEST,
                PipelineError::ExtractionInsufficient { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                PipelineError::Corpus(_) => StatusCode::SERVICE_UNAVAILABLE,
                PipelineError::Generation { .. } => StatusCode::BAD_GATEWAY,
                PipelineError::TemplateMissing { .. } | PipelineError::Assembly(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (stage, sections) = match &self {
            Self::Pipeline(e) => {
                let sections = match e {
                    PipelineError::TemplateMissing { sections, .. } => Some(sections.as_slice()),
                    _ => None,
                };
                (Some(e.stage()), sections)
            }
            _ => (None, None),
        };
        let body = ErrorBody {
            error: self.to_string(),
            stage,
            sections,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use http_body_util::BodyExt;
    use rfpgen_core::Section;
    use rfpgen_index::IndexError;

    use super::*;

    async fn json_of(err: ApiError) -> (StatusCode, serde_json::Value) {
        let resp = err.into_response();
        let status = resp.status();
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn short_text_is_unprocessable() {
        let (status, json) = json_of(ApiError::Pipeline(PipelineError::ExtractionInsufficient {
            chars: 12,
            min: 100,
        }))
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["stage"], "extract");
        assert!(json["error"].as_str().unwrap().contains("12 characters"));
        assert!(json.get("sections").is_none());
    }

    #[tokio::test]
    async fn empty_corpus_is_unavailable() {
        let err = PipelineError::Corpus(IndexError::EmptyCorpus(PathBuf::from("Knowledge_Repo")));
        let (status, json) = json_of(err.into()).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(json["stage"], "retrieve");
    }

    #[tokio::test]
    async fn missing_template_carries_sections() {
        let err = PipelineError::TemplateMissing {
            path: PathBuf::from("tpl.docx"),
            sections: vec![GeneratedSection {
                section: Section::ScopeAndAssumptions,
                text: "- Migrate 150 ICOs".into(),
            }],
        };
        let (status, json) = json_of(err.into()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["stage"], "assemble");
        assert_eq!(json["sections"][0]["text"], "- Migrate 150 ICOs");
    }

    #[tokio::test]
    async fn missing_file_name_is_bad_request() {
        let (status, json) = json_of(ApiError::MissingFileName).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json.get("stage").is_none());
    }
}
