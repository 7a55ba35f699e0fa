//! Domain models for the profiler service.

pub mod category;
pub mod question;
pub mod results;

pub use category::{CategoryMeta, CATEGORY_CATALOGUE};
pub use question::{Question, QuestionView};
pub use results::{AiAnalysis, CategoryResult, TestResults};
