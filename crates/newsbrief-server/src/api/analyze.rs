use std::path::Path;

use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use newsbrief_pipeline::{AnalysisRun, PipelineError};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct AnalyzeCompanyRequest {
    pub company_name: String,
}

/// Route under which [`super::build_app`] serves the audio directory.
const AUDIO_ROUTE: &str = "/audio";

/// Map a synthesized file path to the URL this server serves it from.
///
/// Synthesis writes flat into the audio directory, so the file name is
/// enough. A reference without a file name is passed through unchanged.
pub(super) fn audio_url(reference: String) -> String {
    match Path::new(&reference).file_name().and_then(|n| n.to_str()) {
        Some(name) => format!("{AUDIO_ROUTE}/{name}"),
        None => reference,
    }
}

/// Run the pipeline for one company. The fallback state is a normal 200.
pub(super) async fn analyze_company(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    payload: Result<Json<AnalyzeCompanyRequest>, JsonRejection>,
) -> Result<Json<AnalysisRun>, ApiError> {
    let Json(body) = payload.map_err(|rejection| {
        tracing::debug!(request_id = %req_id.0, error = %rejection, "rejected analyze-company body");
        ApiError::new(
            req_id.0.clone(),
            "validation_error",
            format!("invalid request body: {}", rejection.body_text()),
        )
    })?;
    tracing::info!(request_id = %req_id.0, company = %body.company_name, "analyze-company request");

    match state.orchestrator.run(&body.company_name).await {
        Ok(mut run) => {
            run.audio_reference = run.audio_reference.map(audio_url);
            Ok(Json(run))
        }
        Err(PipelineError::EmptyCompanyName) => Err(ApiError::new(
            req_id.0,
            "validation_error",
            "company_name must not be empty",
        )),
        Err(e @ PipelineError::Internal(_)) => {
            tracing::error!(request_id = %req_id.0, error = %e, "analysis run failed");
            Err(ApiError::new(req_id.0, "internal_error", e.to_string()))
        }
    }
}
