//! Grading of submitted answers against the bank's answer key.

use super::question_bank::QuestionBank;
use crate::models::TestResults;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum GradeError {
    #[error("No answers provided.")]
    NoAnswers,

    #[error("Question {0} answered more than once")]
    DuplicateAnswer(u32),

    #[error("Question {question_id} has no option {selected}")]
    InvalidOption { question_id: u32, selected: usize },
}

/// One submitted answer. `None` means the question was left unanswered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmittedAnswer {
    pub question_id: u32,
    pub selected_option: Option<usize>,
}

/// Grade a submission.
///
/// Answers for ids the bank does not know are skipped and do not count
/// towards any total. Unanswered questions count as incorrect.
pub fn grade(bank: &QuestionBank, answers: &[SubmittedAnswer]) -> Result<TestResults, GradeError> {
    if answers.is_empty() {
        return Err(GradeError::NoAnswers);
    }

    let mut seen = HashSet::with_capacity(answers.len());
    let mut results = TestResults::default();

    for answer in answers {
        if !seen.insert(answer.question_id) {
            return Err(GradeError::DuplicateAnswer(answer.question_id));
        }

        let Some(question) = bank.question(answer.question_id) else {
            tracing::warn!(question_id = answer.question_id, "Skipping answer for unknown question");
            continue;
        };

        if let Some(selected) = answer.selected_option {
            if !question.is_valid_option(selected) {
                return Err(GradeError::InvalidOption {
                    question_id: question.id,
                    selected,
                });
            }
        }

        let entry = results
            .category_results
            .entry(question.category.clone())
            .or_default();
        entry.total += 1;
        results.total_questions += 1;

        if question.is_correct(answer.selected_option) {
            entry.correct += 1;
            results.total_correct += 1;
        }
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::question_bank::tests::question;

    fn bank() -> QuestionBank {
        QuestionBank::from_questions(vec![
            question(1, "Memory", 0),
            question(2, "Memory", 1),
            question(3, "Verbal Logic", 2),
            question(4, "Verbal Logic", 3),
            question(5, "Numerical Reasoning", 0),
        ])
        .unwrap()
    }

    fn answer(question_id: u32, selected: Option<usize>) -> SubmittedAnswer {
        SubmittedAnswer {
            question_id,
            selected_option: selected,
        }
    }

    #[test]
    fn tallies_per_category() {
        let results = grade(
            &bank(),
            &[
                answer(1, Some(0)),
                answer(2, Some(3)),
                answer(3, Some(2)),
                answer(4, Some(3)),
                answer(5, None),
            ],
        )
        .unwrap();

        assert_eq!(results.total_correct, 3);
        assert_eq!(results.total_questions, 5);
        assert_eq!(results.category_results["Memory"].correct, 1);
        assert_eq!(results.category_results["Memory"].total, 2);
        assert_eq!(results.category_results["Verbal Logic"].correct, 2);
        assert_eq!(results.category_results["Numerical Reasoning"].correct, 0);
        assert_eq!(results.category_results["Numerical Reasoning"].total, 1);
    }

    #[test]
    fn category_sums_match_totals() {
        let results = grade(
            &bank(),
            &[answer(1, Some(0)), answer(3, Some(1)), answer(5, Some(0)), answer(99, Some(0))],
        )
        .unwrap();

        let correct: u32 = results.category_results.values().map(|c| c.correct).sum();
        let total: u32 = results.category_results.values().map(|c| c.total).sum();
        assert_eq!(correct, results.total_correct);
        assert_eq!(total, results.total_questions);
        assert_eq!(results.total_questions, 3);
    }

    #[test]
    fn empty_submission_is_rejected() {
        assert_eq!(grade(&bank(), &[]).unwrap_err(), GradeError::NoAnswers);
    }

    #[test]
    fn out_of_range_option_is_rejected() {
        let err = grade(&bank(), &[answer(1, Some(4))]).unwrap_err();
        assert_eq!(
            err,
            GradeError::InvalidOption {
                question_id: 1,
                selected: 4
            }
        );
    }

    #[test]
    fn duplicate_answer_is_rejected() {
        let err = grade(&bank(), &[answer(2, Some(1)), answer(2, Some(0))]).unwrap_err();
        assert_eq!(err, GradeError::DuplicateAnswer(2));
    }

    #[test]
    fn only_unknown_questions_yields_empty_results() {
        let results = grade(&bank(), &[answer(100, Some(0))]).unwrap();
        assert_eq!(results.total_questions, 0);
        assert!(results.category_results.is_empty());
    }
}
