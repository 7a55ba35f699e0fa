use serde::{Deserialize, Serialize};

/// A question as stored in the bank, including its answer key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: u32,
    /// Category title, e.g. "Memory".
    pub category: String,
    pub question_text: String,
    pub options: Vec<String>,
    pub correct_answer_index: usize,
}

/// What a test taker sees: everything but the answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionView {
    pub id: u32,
    pub category: String,
    pub question_text: String,
    pub options: Vec<String>,
}

impl From<&Question> for QuestionView {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id,
            category: q.category.clone(),
            question_text: q.question_text.clone(),
            options: q.options.clone(),
        }
    }
}

impl Question {
    pub fn is_valid_option(&self, index: usize) -> bool {
        index < self.options.len()
    }

    pub fn is_correct(&self, selected: Option<usize>) -> bool {
        selected == Some(self.correct_answer_index)
    }
}
