//! Narrative analysis of a graded test, written by the text provider.

use super::metrics;
use super::providers::{GenerationParams, ProviderError, TextProvider};
use crate::models::{AiAnalysis, TestResults};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Message shown to clients whenever the analysis cannot be produced.
pub const ANALYSIS_UNAVAILABLE: &str =
    "The AI analysis service is currently unavailable. Please try again later.";

const ANALYSIS_TEMPERATURE: f32 = 0.5;
const ANALYSIS_MAX_TOKENS: i32 = 1024;

const SYSTEM_PROMPT: &str = r#"You are an expert cognitive skills coach and analyst. Your tone is professional,
encouraging, insightful, and positive. You are NOT a doctor and you MUST NOT
provide any medical diagnosis or advice.

You will be given a JSON object containing a user's performance on a cognitive
skills quiz. The user is looking for an analysis of their strengths and
potential areas for practice.

Analyze their performance and return a single, valid JSON object containing
your analysis. The object MUST have exactly this structure:
{
  "title": "Your Profile Analysis",
  "overall_summary": "A 2-3 sentence overview of their performance.",
  "strengths_analysis": "A paragraph identifying their strongest category, explaining what that skill means and mentioning their score.",
  "growth_analysis": "A friendly paragraph identifying their lowest-performing category, framed as an area for practice or a new challenge to explore.",
  "action_item": "A single, simple, real-world action the user can take to practice their growth area."
}"#;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Provider failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("Malformed analysis: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryScoreInput {
    pub category: String,
    pub score: String,
}

/// Score summary handed to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisRequest {
    pub overall_score: String,
    pub category_scores: Vec<CategoryScoreInput>,
}

impl AnalysisRequest {
    pub fn from_results(results: &TestResults) -> Self {
        Self {
            overall_score: format!("{}/{}", results.total_correct, results.total_questions),
            category_scores: results
                .category_results
                .iter()
                .filter(|(_, r)| r.total > 0)
                .map(|(category, r)| CategoryScoreInput {
                    category: category.clone(),
                    score: format!("{}/{}", r.correct, r.total),
                })
                .collect(),
        }
    }
}

/// Parse the model's reply, tolerating a Markdown code fence around it.
pub fn parse_analysis(text: &str) -> Result<AiAnalysis, AnalysisError> {
    let trimmed = text.trim();
    let body = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.trim_end().strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    serde_json::from_str(body).map_err(|e| AnalysisError::Malformed(e.to_string()))
}

#[derive(Clone)]
pub struct Analyst {
    provider: Arc<dyn TextProvider>,
}

impl Analyst {
    pub fn new(provider: Arc<dyn TextProvider>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &Arc<dyn TextProvider> {
        &self.provider
    }

    #[tracing::instrument(skip(self, results), fields(provider = self.provider.name()))]
    pub async fn analyze(&self, results: &TestResults) -> Result<AiAnalysis, AnalysisError> {
        let request = AnalysisRequest::from_results(results);
        let prompt = serde_json::to_string(&request)
            .map_err(|e| AnalysisError::Malformed(e.to_string()))?;

        let params = GenerationParams {
            temperature: Some(ANALYSIS_TEMPERATURE),
            max_tokens: Some(ANALYSIS_MAX_TOKENS),
            json_output: true,
        };

        let provider = self.provider.name();
        let model = self.provider.model().to_string();
        let start = Instant::now();
        let outcome = self.provider.generate(SYSTEM_PROMPT, &prompt, &params).await;
        metrics::record_provider_latency(provider, &model, start.elapsed().as_secs_f64());

        let response = outcome.map_err(|e| {
            metrics::record_provider_error(provider, e.kind());
            e
        })?;

        metrics::record_genai_request(&model, response.finish_reason.as_str());
        metrics::record_tokens(&model, response.input_tokens, response.output_tokens);

        parse_analysis(&response.text).map_err(|e| {
            metrics::record_provider_error(provider, "malformed_output");
            tracing::warn!(error = %e, "Model returned an unusable analysis");
            e
        })
    }
}
