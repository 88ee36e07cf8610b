// Prompt template for résumé analysis. Placeholders are filled by `build_analysis_prompt`.

use crate::analysis::models::AnalysisRequest;

/// Shown in place of a missing job description.
pub const NO_JOB_DESCRIPTION: &str = "Not provided";

/// Résumé analysis prompt. Placeholders: `{resume_text}`, `{job_description}`.
pub const ANALYSIS_PROMPT_TEMPLATE: &str = r#"You are an ATS (Applicant Tracking System) and Resume Reviewer.

Analyze the following resume and job description and provide JSON only.

=======================
Resume:
{resume_text}

=======================
Job Description:
{job_description}

=======================
Generate JSON using EXACT format:

{
  "summary": "",
  "overallScore": 1-10,
  "strengths": [],
  "improvements": [],
  "keywords": [],
  "atsScore": 0-100,
  "matchedKeywords": [],
  "missingKeywords": [],
  "jobFitInsights": []
}

No extra words, no markdown, only raw JSON."#;

/// Fills the analysis template in a single pass, so placeholder-looking text inside
/// the résumé or job description is never substituted again.
pub fn build_analysis_prompt(request: &AnalysisRequest) -> String {
    let job_description = if request.has_job_description() {
        request.job_description.as_str()
    } else {
        NO_JOB_DESCRIPTION
    };

    fill_template(
        ANALYSIS_PROMPT_TEMPLATE,
        &[
            ("{resume_text}", request.resume_text.as_str()),
            ("{job_description}", job_description),
        ],
    )
}

fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let extra: usize = values.iter().map(|(_, v)| v.len()).sum();
    let mut out = String::with_capacity(template.len() + extra);
    let mut rest = template;

    loop {
        let next = values
            .iter()
            .filter_map(|(key, value)| rest.find(key).map(|pos| (pos, *key, *value)))
            .min_by_key(|(pos, _, _)| *pos);

        match next {
            Some((pos, key, value)) => {
                out.push_str(&rest[..pos]);
                out.push_str(value);
                rest = &rest[pos + key.len()..];
            }
            None => {
                out.push_str(rest);
                return out;
            }
        }
    }
}
