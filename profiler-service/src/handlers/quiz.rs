//! Test lifecycle endpoints: start, inspect, submit.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use std::collections::HashSet;
use rand::rngs::StdRng;
use rand::SeedableRng;
use uuid::Uuid;
use validator::Validate;

use crate::dtos::{StartTestRequest, StartTestResponse, SubmitTestRequest, SubmitTestResponse};
use crate::services::{
    assemble_quiz, grade, metrics, GradeError, SessionSnapshot, SubmittedAnswer,
};
use crate::startup::AppState;
use service_core::error::AppError;

#[tracing::instrument(skip(state, request), fields(categories = request.categories.len()))]
pub async fn start_test(
    State(state): State<AppState>,
    Json(request): Json<StartTestRequest>,
) -> Result<Json<StartTestResponse>, AppError> {
    request.validate()?;

    let mut rng = StdRng::from_entropy();
    let quiz = assemble_quiz(&state.bank, &request.categories, &mut rng)?;

    let test_id = state
        .sessions
        .start(quiz.question_ids(), quiz.time_limit, Utc::now())?;

    metrics::record_quiz_started(request.categories.len());
    metrics::set_active_sessions(state.sessions.len());

    tracing::info!(
        test_id = %test_id,
        questions = quiz.questions.len(),
        time_limit_secs = quiz.time_limit.as_secs(),
        "Test started"
    );

    Ok(Json(StartTestResponse {
        test_id,
        questions: quiz.questions,
        time_limit_seconds: quiz.time_limit.as_secs(),
    }))
}

pub async fn get_test(
    State(state): State<AppState>,
    Path(test_id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    state
        .sessions
        .snapshot(test_id, Utc::now())
        .map(Json)
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Test {} not found", test_id)))
}

#[tracing::instrument(skip(state, request), fields(test_id = ?request.test_id, answers = request.answers.len()))]
pub async fn submit_test(
    State(state): State<AppState>,
    Json(request): Json<SubmitTestRequest>,
) -> Result<Json<SubmitTestResponse>, AppError> {
    let outcome = grade_and_analyze(&state, request).await;
    metrics::record_submission(match &outcome {
        Ok(_) => "graded",
        Err(AppError::BadGateway(_)) => "analysis_failed",
        Err(_) => "rejected",
    });
    outcome.map(Json)
}

async fn grade_and_analyze(
    state: &AppState,
    request: SubmitTestRequest,
) -> Result<SubmitTestResponse, AppError> {
    request.validate()?;
    if request.answers.is_empty() {
        return Err(GradeError::NoAnswers.into());
    }

    let mut answers: Vec<SubmittedAnswer> =
        request.answers.iter().copied().map(Into::into).collect();

    // Held until the analysis succeeds; dropping it on any error reopens
    // the test for another attempt.
    let claim = match request.test_id {
        Some(test_id) => Some(state.sessions.claim(
            test_id,
            answers.iter().map(|a| a.question_id),
            Utc::now(),
        )?),
        None => None,
    };

    // Served questions left out of the submission count as unanswered.
    if let Some(claim) = &claim {
        let answered: HashSet<u32> = answers.iter().map(|a| a.question_id).collect();
        let mut missing: Vec<u32> = claim
            .served_questions()
            .difference(&answered)
            .copied()
            .collect();
        missing.sort_unstable();
        answers.extend(missing.into_iter().map(|question_id| SubmittedAnswer {
            question_id,
            selected_option: None,
        }));
    }

    let results = grade(&state.bank, &answers)?;
    if results.total_questions == 0 {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "None of the submitted answers match a known question."
        )));
    }

    let analysis = state.analyst.analyze(&results).await?;

    if let Some(claim) = claim {
        claim.complete();
    }

    tracing::info!(
        total_correct = results.total_correct,
        total_questions = results.total_questions,
        "Test graded"
    );

    Ok(SubmitTestResponse { results, analysis })
}
