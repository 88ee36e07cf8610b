//! Axum route handlers for the Analysis API.

use std::time::Duration;

use axum::{
    extract::{multipart::MultipartRejection, rejection::JsonRejection, Multipart, State},
    Json,
};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::analysis::models::AnalysisResult;
use crate::analysis::pdf::extract_pdf_text;
use crate::errors::AppError;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

/// Body of `POST /analyze`. Missing fields count as empty; non-string scalars
/// are taken as their JSON text.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest {
    #[serde(default, deserialize_with = "lenient_text")]
    pub text: Option<String>,
    /// Raw résumé text. Browser clients send it next to `text`, which may already
    /// hold a client-built prompt; when present it wins.
    #[serde(default, deserialize_with = "lenient_text")]
    pub resume_text: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub job_description: Option<String>,
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

impl AnalyzeRequest {
    fn resume_text(&self) -> &str {
        self.resume_text
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .or(self.text.as_deref())
            .unwrap_or_default()
    }
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub success: bool,
    pub analysis: AnalysisResult,
    /// Copy of `analysis` for clients of the older envelope; only sent when enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<AnalysisResult>,
}

impl AnalyzeResponse {
    fn new(analysis: AnalysisResult, emit_legacy_data_field: bool) -> Self {
        let data = emit_legacy_data_field.then(|| analysis.clone());
        Self {
            success: true,
            analysis,
            data,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /analyze (also mounted at /api/analyze)
///
/// Analyzes résumé text, optionally against a job description.
pub async fn handle_analyze(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let analysis = run_analysis(
        &state,
        request.resume_text(),
        request.job_description.as_deref(),
    )
    .await?;

    Ok(Json(AnalyzeResponse::new(
        analysis,
        state.config.emit_legacy_data_field,
    )))
}

/// POST /analyze/pdf
///
/// Multipart upload: `file` (the PDF résumé) and optional `jobDescription`.
/// Extracts the text server-side, then runs the same analysis as `/analyze`.
pub async fn handle_analyze_pdf(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let mut multipart = multipart.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let mut pdf_bytes: Option<Vec<u8>> = None;
    let mut job_description: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                pdf_bytes = Some(bytes.to_vec());
            }
            "jobDescription" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                job_description = Some(text);
            }
            _ => {}
        }
    }

    let pdf_bytes =
        pdf_bytes.ok_or_else(|| AppError::BadRequest("No PDF file provided".to_string()))?;
    let resume_text = extract_pdf_text(pdf_bytes).await?;

    let analysis = run_analysis(&state, &resume_text, job_description.as_deref()).await?;

    Ok(Json(AnalyzeResponse::new(
        analysis,
        state.config.emit_legacy_data_field,
    )))
}

/// Runs one analysis under the configured overall deadline. Hitting the deadline
/// drops the in-flight model call and any pending backoff.
async fn run_analysis(
    state: &AppState,
    resume_text: &str,
    job_description: Option<&str>,
) -> Result<AnalysisResult, AppError> {
    let deadline = Duration::from_secs(state.config.analyze_timeout_secs);
    match tokio::time::timeout(deadline, state.analyzer.analyze(resume_text, job_description)).await
    {
        Ok(result) => Ok(result?),
        Err(_) => Err(AppError::Timeout(state.config.analyze_timeout_secs)),
    }
}
