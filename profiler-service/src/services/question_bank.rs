//! In-memory question bank loaded from a JSON file.

use crate::models::{CategoryMeta, Question, CATEGORY_CATALOGUE};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuestionBankError {
    #[error("Failed to read question bank {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse question bank: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Duplicate question id {0}")]
    DuplicateId(u32),

    #[error("Question {0} has no options")]
    NoOptions(u32),

    #[error("Question {id} has correctAnswerIndex {index} but only {options} options")]
    AnswerOutOfRange { id: u32, index: usize, options: usize },
}

/// Immutable question store with the answer key indexed by id.
#[derive(Debug, Default)]
pub struct QuestionBank {
    questions: Vec<Question>,
    by_id: HashMap<u32, usize>,
    by_category: HashMap<String, Vec<usize>>,
}

impl QuestionBank {
    /// Load and validate a bank from a JSON array of questions.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, QuestionBankError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| QuestionBankError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let questions: Vec<Question> = serde_json::from_str(&raw)?;
        let bank = Self::from_questions(questions)?;

        tracing::info!(
            path = %path.display(),
            questions = bank.len(),
            categories = bank.categories().len(),
            "Loaded question bank"
        );

        Ok(bank)
    }

    pub fn from_questions(questions: Vec<Question>) -> Result<Self, QuestionBankError> {
        let mut by_id = HashMap::with_capacity(questions.len());
        let mut by_category: HashMap<String, Vec<usize>> = HashMap::new();

        for (idx, q) in questions.iter().enumerate() {
            if q.options.is_empty() {
                return Err(QuestionBankError::NoOptions(q.id));
            }
            if !q.is_valid_option(q.correct_answer_index) {
                return Err(QuestionBankError::AnswerOutOfRange {
                    id: q.id,
                    index: q.correct_answer_index,
                    options: q.options.len(),
                });
            }
            if by_id.insert(q.id, idx).is_some() {
                return Err(QuestionBankError::DuplicateId(q.id));
            }
            if CategoryMeta::by_title(&q.category).is_none() {
                tracing::warn!(
                    question_id = q.id,
                    category = %q.category,
                    "Question has an unknown category and will never be served"
                );
            }
            by_category.entry(q.category.clone()).or_default().push(idx);
        }

        Ok(Self {
            questions,
            by_id,
            by_category,
        })
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn question(&self, id: u32) -> Option<&Question> {
        self.by_id.get(&id).map(|&idx| &self.questions[idx])
    }

    /// All questions filed under a category title.
    pub fn pool(&self, title: &str) -> Vec<&Question> {
        self.by_category
            .get(title)
            .map(|idxs| idxs.iter().map(|&i| &self.questions[i]).collect())
            .unwrap_or_default()
    }

    /// Catalogue entries that have at least one question, in catalogue order.
    pub fn categories(&self) -> Vec<&'static CategoryMeta> {
        CATEGORY_CATALOGUE
            .iter()
            .filter(|c| self.by_category.contains_key(c.title))
            .collect()
    }
}
