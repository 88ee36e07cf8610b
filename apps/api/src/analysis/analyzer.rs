//! Analysis orchestration: validate → build prompt → fetch with retry → extract → normalise.
//!
//! All-or-nothing per request: any failure after validation becomes
//! `AnalysisError::Unavailable` with the underlying cause, never a partial result.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, error, info, info_span, Instrument};
use uuid::Uuid;

use crate::analysis::extract::extract_json;
use crate::analysis::models::{AnalysisRequest, AnalysisResult};
use crate::analysis::prompts::build_analysis_prompt;
use crate::llm_client::retry::{fetch_completion, RetryPolicy};
use crate::llm_client::CompletionModel;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("No resume text provided")]
    EmptyInput,

    #[error("Analysis unavailable: {0}")]
    Unavailable(String),
}

/// Runs résumé analyses against one shared model client.
#[derive(Clone)]
pub struct Analyzer {
    model: Arc<dyn CompletionModel>,
    policy: RetryPolicy,
}

impl Analyzer {
    pub fn new(model: Arc<dyn CompletionModel>, policy: RetryPolicy) -> Self {
        Self { model, policy }
    }

    /// Analyzes one résumé, optionally against a job description.
    ///
    /// Blank résumé text fails with `EmptyInput` before the model is contacted.
    pub async fn analyze(
        &self,
        resume_text: &str,
        job_description: Option<&str>,
    ) -> Result<AnalysisResult, AnalysisError> {
        let request = AnalysisRequest::new(resume_text, job_description)?;
        let span = info_span!("analyze", request_id = %Uuid::new_v4());
        self.run(&request).instrument(span).await
    }

    async fn run(&self, request: &AnalysisRequest) -> Result<AnalysisResult, AnalysisError> {
        info!(
            resume_chars = request.resume_text.chars().count(),
            has_job_description = request.has_job_description(),
            "Sending analysis request to model"
        );

        let prompt = build_analysis_prompt(request);

        let raw = fetch_completion(self.model.as_ref(), &prompt, self.policy)
            .await
            .map_err(|e| {
                error!("Model call failed: {e}");
                AnalysisError::Unavailable(e.to_string())
            })?;
        debug!("Model raw response received ({} bytes)", raw.len());

        let object = extract_json(&raw).map_err(|e| {
            error!(raw_output = %raw, "Failed to parse model JSON: {e}");
            AnalysisError::Unavailable(format!("Invalid JSON received from model ({e})"))
        })?;

        let result = AnalysisResult::from_object(object);
        info!(
            overall_score = result.overall_score,
            ats_score = ?result.ats_score,
            "Analysis complete"
        );
        Ok(result)
    }
}
