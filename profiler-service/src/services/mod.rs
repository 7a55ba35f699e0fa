pub mod analysis;
pub mod grader;
pub mod metrics;
pub mod providers;
pub mod question_bank;
pub mod quiz;
pub mod sessions;

pub use analysis::{Analyst, AnalysisError, ANALYSIS_UNAVAILABLE};
pub use grader::{grade, GradeError, SubmittedAnswer};
pub use question_bank::{QuestionBank, QuestionBankError};
pub use quiz::{assemble_quiz, AssembledQuiz, QuizError, QuizPlan};
pub use sessions::{SessionError, SessionSnapshot, SessionStatus, SessionStore, SubmissionClaim};
