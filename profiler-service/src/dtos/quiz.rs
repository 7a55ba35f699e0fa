use crate::models::{AiAnalysis, QuestionView, TestResults};
use crate::services::SubmittedAnswer;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct StartTestRequest {
    /// Category ids, e.g. `["memory", "verbal-logic"]`.
    #[validate(length(min = 1, message = "Select at least one category"))]
    pub categories: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartTestResponse {
    pub test_id: Uuid,
    pub questions: Vec<QuestionView>,
    pub time_limit_seconds: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerDto {
    pub question_id: u32,
    /// `null` when the question was left unanswered.
    #[serde(default)]
    pub selected_option: Option<usize>,
}

impl From<AnswerDto> for SubmittedAnswer {
    fn from(dto: AnswerDto) -> Self {
        Self {
            question_id: dto.question_id,
            selected_option: dto.selected_option,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmitTestRequest {
    /// Test returned by `/start-test`. Without it the answers are graded
    /// against the bank alone.
    #[serde(default)]
    pub test_id: Option<Uuid>,
    // A quiz never exceeds 30 questions
    #[validate(length(max = 100, message = "Too many answers"))]
    pub answers: Vec<AnswerDto>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitTestResponse {
    pub results: TestResults,
    pub analysis: AiAnalysis,
}
