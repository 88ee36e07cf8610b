use serde::Serialize;
use serde_json::{Map, Value};

use crate::analysis::analyzer::AnalysisError;

/// Hard ceiling on résumé text sent to the model, in characters.
pub const MAX_RESUME_CHARS: usize = 12_000;
/// Hard ceiling on job-description text sent to the model, in characters.
pub const MAX_JOB_DESCRIPTION_CHARS: usize = 8_000;

/// Validated, size-bounded input for one analysis. Built per call and dropped after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub resume_text: String,
    /// Empty when no job description was supplied.
    pub job_description: String,
}

impl AnalysisRequest {
    /// Truncates both inputs to their ceilings (overflow is dropped silently) and
    /// rejects a résumé that is blank.
    pub fn new(resume_text: &str, job_description: Option<&str>) -> Result<Self, AnalysisError> {
        let resume_text = truncate_chars(resume_text, MAX_RESUME_CHARS);
        if resume_text.trim().is_empty() {
            return Err(AnalysisError::EmptyInput);
        }
        let job_description =
            truncate_chars(job_description.unwrap_or_default(), MAX_JOB_DESCRIPTION_CHARS);

        Ok(Self {
            resume_text: resume_text.to_string(),
            job_description: job_description.to_string(),
        })
    }

    pub fn has_job_description(&self) -> bool {
        !self.job_description.trim().is_empty()
    }
}

/// Returns the first `max_chars` characters of `text`.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Structured feedback returned to clients.
///
/// Built from whatever object the model produced: every known field is defaulted
/// or coerced, unknown fields are passed through untouched in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub summary: String,
    /// 1-10; 0 means the model gave no usable score.
    pub overall_score: u8,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
    pub keywords: Vec<String>,
    /// 0-100; omitted when the model gave none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ats_score: Option<u8>,
    pub matched_keywords: Vec<String>,
    pub missing_keywords: Vec<String>,
    pub job_fit_insights: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AnalysisResult {
    pub fn from_object(mut object: Map<String, Value>) -> Self {
        let mut take = |key: &str| object.remove(key).unwrap_or(Value::Null);

        let summary = coerce_string(take("summary"));
        let overall_score = coerce_score(&take("overallScore"), 1, 10).unwrap_or(0);
        let strengths = coerce_list(take("strengths"));
        let improvements = coerce_list(take("improvements"));
        let keywords = coerce_list(take("keywords"));
        let ats_score = coerce_score(&take("atsScore"), 0, 100);
        let matched_keywords = coerce_list(take("matchedKeywords"));
        let missing_keywords = coerce_list(take("missingKeywords"));
        let job_fit_insights = coerce_list(take("jobFitInsights"));

        Self {
            summary,
            overall_score,
            strengths,
            improvements,
            keywords,
            ats_score,
            matched_keywords,
            missing_keywords,
            job_fit_insights,
            extra: object,
        }
    }
}

fn coerce_string(value: Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Accepts an array (non-string items are stringified) or a lone string.
fn coerce_list(value: Value) -> Vec<String> {
    let items = match value {
        Value::Array(items) => items,
        Value::Null => return Vec::new(),
        single => vec![single],
    };
    items
        .into_iter()
        .filter(|v| !v.is_null())
        .map(coerce_string)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Reads a number or a numeric prefix of a string ("7", "7/10", "85%", "-3") and clamps it.
fn coerce_score(value: &Value, min: u8, max: u8) -> Option<u8> {
    let raw = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => {
            let s = s.trim();
            let (sign, digits) = match s.strip_prefix('-') {
                Some(rest) => (-1.0, rest),
                None => (1.0, s),
            };
            let end = digits
                .find(|c: char| !(c.is_ascii_digit() || c == '.'))
                .unwrap_or(digits.len());
            sign * digits[..end].parse::<f64>().ok()?
        }
        _ => return None,
    };
    Some(raw.round().clamp(f64::from(min), f64::from(max)) as u8)
}
