//! Quiz assembly: spread a fixed question budget over the selected
//! categories, sample each category's pool and shuffle the result.

use super::question_bank::QuestionBank;
use crate::models::{CategoryMeta, QuestionView};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

const SINGLE_CATEGORY_QUESTIONS: usize = 15;
const SINGLE_CATEGORY_TIME_LIMIT: Duration = Duration::from_secs(15 * 60);
const MULTI_CATEGORY_QUESTIONS: usize = 30;
const MULTI_CATEGORY_TIME_LIMIT: Duration = Duration::from_secs(30 * 60);

#[derive(Error, Debug, PartialEq, Eq)]
pub enum QuizError {
    #[error("At least one category must be selected")]
    NoCategories,

    #[error("Invalid category ID: {0}")]
    UnknownCategory(String),

    #[error("Category selected more than once: {0}")]
    DuplicateCategory(String),

    #[error("No questions available for the selected categories")]
    NoQuestionsAvailable,
}

/// Question budget and time limit for a quiz.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizPlan {
    pub total_questions: usize,
    pub time_limit: Duration,
}

impl QuizPlan {
    pub fn for_category_count(count: usize) -> Self {
        if count == 1 {
            Self {
                total_questions: SINGLE_CATEGORY_QUESTIONS,
                time_limit: SINGLE_CATEGORY_TIME_LIMIT,
            }
        } else {
            Self {
                total_questions: MULTI_CATEGORY_QUESTIONS,
                time_limit: MULTI_CATEGORY_TIME_LIMIT,
            }
        }
    }

    /// Even split of the budget; the first `total % count` categories get
    /// one extra question.
    pub fn per_category(&self, count: usize) -> Vec<usize> {
        if count == 0 {
            return Vec::new();
        }
        let base = self.total_questions / count;
        let remainder = self.total_questions % count;
        (0..count).map(|i| base + usize::from(i < remainder)).collect()
    }
}

#[derive(Debug, Clone)]
pub struct AssembledQuiz {
    pub questions: Vec<QuestionView>,
    pub time_limit: Duration,
}

impl AssembledQuiz {
    pub fn question_ids(&self) -> Vec<u32> {
        self.questions.iter().map(|q| q.id).collect()
    }
}

/// Build a quiz for the given category ids, in request order.
///
/// A category whose pool is smaller than its share contributes everything
/// it has; the shortfall is not redistributed.
pub fn assemble_quiz<R: Rng + ?Sized>(
    bank: &QuestionBank,
    category_ids: &[String],
    rng: &mut R,
) -> Result<AssembledQuiz, QuizError> {
    if category_ids.is_empty() {
        return Err(QuizError::NoCategories);
    }

    let mut seen = HashSet::new();
    let mut categories = Vec::with_capacity(category_ids.len());
    for id in category_ids {
        let meta =
            CategoryMeta::by_id(id).ok_or_else(|| QuizError::UnknownCategory(id.clone()))?;
        if !seen.insert(meta.id) {
            return Err(QuizError::DuplicateCategory(id.clone()));
        }
        categories.push(meta);
    }

    let plan = QuizPlan::for_category_count(categories.len());
    let shares = plan.per_category(categories.len());

    let mut picked: Vec<QuestionView> = Vec::with_capacity(plan.total_questions);
    for (meta, share) in categories.iter().zip(shares) {
        let pool = bank.pool(meta.title);
        let take = share.min(pool.len());
        if take < share {
            tracing::warn!(
                category = meta.id,
                requested = share,
                available = pool.len(),
                "Category pool smaller than its share"
            );
        }
        picked.extend(
            pool.choose_multiple(&mut *rng, take)
                .map(|q| QuestionView::from(*q)),
        );
    }

    if picked.is_empty() {
        return Err(QuizError::NoQuestionsAvailable);
    }

    picked.shuffle(&mut *rng);

    Ok(AssembledQuiz {
        questions: picked,
        time_limit: plan.time_limit,
    })
}
