use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryResult {
    pub correct: u32,
    pub total: u32,
}

/// Graded outcome of one submission. Per-category figures always add up
/// to the totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResults {
    pub total_correct: u32,
    pub total_questions: u32,
    /// Keyed by category title.
    pub category_results: BTreeMap<String, CategoryResult>,
}

/// Narrative written by the text model. Field names are the JSON contract
/// given to the model and passed through to clients unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiAnalysis {
    pub title: String,
    pub overall_summary: String,
    pub strengths_analysis: String,
    pub growth_analysis: String,
    pub action_item: String,
}
