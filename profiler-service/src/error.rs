//! Mapping of domain errors onto HTTP errors.

use crate::services::{AnalysisError, GradeError, QuizError, SessionError, ANALYSIS_UNAVAILABLE};
use service_core::error::AppError;

impl From<QuizError> for AppError {
    fn from(err: QuizError) -> Self {
        AppError::BadRequest(anyhow::Error::new(err))
    }
}

impl From<GradeError> for AppError {
    fn from(err: GradeError) -> Self {
        AppError::BadRequest(anyhow::Error::new(err))
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound(_) => AppError::NotFound(anyhow::Error::new(err)),
            SessionError::ForeignQuestion { .. } => AppError::BadRequest(anyhow::Error::new(err)),
            SessionError::AlreadySubmitted(_)
            | SessionError::SubmissionInProgress(_)
            | SessionError::Expired(_) => AppError::Conflict(anyhow::Error::new(err)),
            SessionError::AtCapacity(_) => {
                tracing::warn!(error = %err, "Refusing to start a test");
                AppError::ServiceUnavailable
            }
        }
    }
}

impl From<AnalysisError> for AppError {
    fn from(err: AnalysisError) -> Self {
        tracing::error!(error = %err, "Analysis failed");
        AppError::BadGateway(ANALYSIS_UNAVAILABLE.to_string())
    }
}
