//! Router-level tests for the start → submit flow.

mod common;

use axum::{
    body::{to_bytes, Body},
    extract::ConnectInfo,
    http::{header, Request, StatusCode},
    Router,
};
use common::{correct_option, failing_router, router_with_limits, test_config, test_router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use tower::util::ServiceExt;

const CLIENT: &str = "203.0.113.7:51000";

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    post_json_from(CLIENT, uri, body)
}

fn post_json_from(peer: &str, uri: &str, body: Value) -> Request<Body> {
    let peer: SocketAddr = peer.parse().unwrap();
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .extension(ConnectInfo(peer))
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn start(app: &Router, categories: &[&str]) -> Value {
    let (status, body) = send(app, post_json("/start-test", json!({ "categories": categories }))).await;
    assert_eq!(status, StatusCode::OK, "start-test failed: {body}");
    body
}

fn question_ids(quiz: &Value) -> Vec<u64> {
    quiz["questions"]
        .as_array()
        .unwrap()
        .iter()
        .map(|q| q["id"].as_u64().unwrap())
        .collect()
}

#[tokio::test]
async fn categories_lists_only_populated_categories() {
    let app = test_router();
    let (status, body) = send(&app, get("/categories")).await;

    assert_eq!(status, StatusCode::OK);
    let ids: Vec<_> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["verbal-logic", "memory", "numerical-reasoning"]);
    assert_eq!(body[1]["title"], "Memory");
    assert_eq!(body[1]["icon"], "brain");
}

#[tokio::test]
async fn single_category_quiz_has_fifteen_questions_and_fifteen_minutes() {
    let app = test_router();
    let quiz = start(&app, &["memory"]).await;

    assert_eq!(quiz["timeLimitSeconds"], 900);
    assert_eq!(question_ids(&quiz).len(), 15);
    for q in quiz["questions"].as_array().unwrap() {
        assert_eq!(q["category"], "Memory");
        assert!(q.get("correctAnswerIndex").is_none());
    }
}

#[tokio::test]
async fn multi_category_quiz_has_thirty_questions() {
    let app = test_router();
    let quiz = start(&app, &["memory", "verbal-logic", "numerical-reasoning"]).await;

    assert_eq!(quiz["timeLimitSeconds"], 1800);
    assert_eq!(question_ids(&quiz).len(), 30);
}

#[tokio::test]
async fn start_test_rejects_bad_selections() {
    let app = test_router();

    let (status, body) = send(&app, post_json("/start-test", json!({ "categories": ["telepathy"] }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid category ID: telepathy");

    let (status, _) = send(&app, post_json("/start-test", json!({ "categories": [] }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = send(&app, post_json("/start-test", json!({ "categories": ["memory", "memory"] }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn full_flow_grades_and_returns_analysis() {
    let app = test_router();
    let quiz = start(&app, &["memory", "verbal-logic"]).await;
    let test_id = quiz["testId"].as_str().unwrap().to_string();
    let ids = question_ids(&quiz);

    // Answer the first ten correctly, leave the rest unanswered.
    let answers: Vec<Value> = ids
        .iter()
        .enumerate()
        .map(|(i, id)| {
            let selected = (i < 10).then(|| correct_option(*id as u32));
            json!({ "questionId": id, "selectedOption": selected })
        })
        .collect();

    let (status, body) = send(
        &app,
        post_json("/submit-test", json!({ "testId": test_id, "answers": answers })),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "submit failed: {body}");
    assert_eq!(body["results"]["totalCorrect"], 10);
    assert_eq!(body["results"]["totalQuestions"], 30);

    let categories = body["results"]["categoryResults"].as_object().unwrap();
    let correct: u64 = categories.values().map(|c| c["correct"].as_u64().unwrap()).sum();
    let total: u64 = categories.values().map(|c| c["total"].as_u64().unwrap()).sum();
    assert_eq!(correct, 10);
    assert_eq!(total, 30);

    assert_eq!(body["analysis"]["title"], "Your Profile Analysis");
    assert!(body["analysis"]["action_item"].is_string());

    let (status, session) = send(&app, get(&format!("/tests/{}", test_id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["status"], "submitted");
    assert_eq!(session["questionCount"], 30);
}

#[tokio::test]
async fn test_cannot_be_submitted_twice() {
    let app = test_router();
    let quiz = start(&app, &["memory"]).await;
    let test_id = quiz["testId"].clone();
    let first = question_ids(&quiz)[0];
    let submission = json!({
        "testId": test_id,
        "answers": [{ "questionId": first, "selectedOption": 0 }]
    });

    let (status, _) = send(&app, post_json("/submit-test", submission.clone())).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, post_json("/submit-test", submission)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn answers_outside_the_test_are_rejected() {
    let app = test_router();
    let quiz = start(&app, &["memory"]).await;
    let served = question_ids(&quiz);
    let foreign = (1..=60u64).find(|id| !served.contains(id)).unwrap();

    let (status, _) = send(
        &app,
        post_json(
            "/submit-test",
            json!({
                "testId": quiz["testId"],
                "answers": [{ "questionId": foreign, "selectedOption": 0 }]
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_test_id_is_not_found() {
    let app = test_router();

    let (status, _) = send(
        &app,
        post_json(
            "/submit-test",
            json!({
                "testId": "00000000-0000-4000-8000-000000000000",
                "answers": [{ "questionId": 1, "selectedOption": 0 }]
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, get("/tests/00000000-0000-4000-8000-000000000000")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn submission_without_test_id_is_graded_against_the_bank() {
    let app = test_router();

    let (status, body) = send(
        &app,
        post_json(
            "/submit-test",
            json!({
                "answers": [
                    { "questionId": 1, "selectedOption": correct_option(1) },
                    { "questionId": 21, "selectedOption": (correct_option(21) + 1) % 4 },
                    { "questionId": 9999, "selectedOption": 0 }
                ]
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"]["totalCorrect"], 1);
    assert_eq!(body["results"]["totalQuestions"], 2);
    assert_eq!(body["results"]["categoryResults"]["Memory"]["correct"], 1);
    assert_eq!(body["results"]["categoryResults"]["Verbal Logic"]["total"], 1);
}

#[tokio::test]
async fn empty_or_invalid_answers_are_rejected() {
    let app = test_router();

    let (status, body) = send(&app, post_json("/submit-test", json!({ "answers": [] }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "No answers provided.");

    let (status, _) = send(
        &app,
        post_json(
            "/submit-test",
            json!({ "answers": [{ "questionId": 1, "selectedOption": 7 }] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        post_json(
            "/submit-test",
            json!({ "answers": [{ "questionId": 9999, "selectedOption": 0 }] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn analysis_failure_is_bad_gateway_and_test_stays_open() {
    let app = failing_router();
    let quiz = start(&app, &["memory"]).await;
    let test_id = quiz["testId"].as_str().unwrap().to_string();
    let first = question_ids(&quiz)[0];

    let (status, body) = send(
        &app,
        post_json(
            "/submit-test",
            json!({
                "testId": test_id,
                "answers": [{ "questionId": first, "selectedOption": 0 }]
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(
        body["error"],
        "The AI analysis service is currently unavailable. Please try again later."
    );

    let (_, session) = send(&app, get(&format!("/tests/{}", test_id))).await;
    assert_eq!(session["status"], "in_progress");
    assert!(session["remainingSeconds"].as_u64().unwrap() <= 900);
}

#[tokio::test]
async fn served_questions_left_out_count_as_unanswered() {
    let app = test_router();
    let quiz = start(&app, &["memory"]).await;
    let first = question_ids(&quiz)[0];

    let (status, body) = send(
        &app,
        post_json(
            "/submit-test",
            json!({
                "testId": quiz["testId"],
                "answers": [{ "questionId": first, "selectedOption": correct_option(first as u32) }]
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "submit failed: {body}");
    assert_eq!(body["results"]["totalCorrect"], 1);
    assert_eq!(body["results"]["totalQuestions"], 15);
    assert_eq!(body["results"]["categoryResults"]["Memory"]["total"], 15);
}

#[tokio::test]
async fn submit_is_rate_limited_per_client() {
    let mut limits = test_config().limits;
    limits.submit_rate_limit_per_min = 2;
    let app = router_with_limits(limits);
    let submission = json!({ "answers": [{ "questionId": 1, "selectedOption": 0 }] });

    for _ in 0..2 {
        let (status, _) = send(&app, post_json("/submit-test", submission.clone())).await;
        assert_eq!(status, StatusCode::OK);
    }

    let response = app
        .clone()
        .oneshot(post_json("/submit-test", submission.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key(header::RETRY_AFTER));

    // Rotating x-forwarded-for does not buy a fresh budget.
    let spoofed = Request::builder()
        .method("POST")
        .uri("/submit-test")
        .header("content-type", "application/json")
        .header("x-forwarded-for", "198.51.100.99")
        .extension(ConnectInfo(CLIENT.parse::<SocketAddr>().unwrap()))
        .body(Body::from(submission.to_string()))
        .unwrap();
    let (status, _) = send(&app, spoofed).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    let (status, _) = send(&app, post_json_from("203.0.113.8:51000", "/submit-test", submission)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn start_is_rate_limited_per_client() {
    let mut limits = test_config().limits;
    limits.start_rate_limit_per_min = 2;
    let app = router_with_limits(limits);
    let body = json!({ "categories": ["memory"] });

    for _ in 0..2 {
        let (status, _) = send(&app, post_json("/start-test", body.clone())).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, _) = send(&app, post_json("/start-test", body)).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn start_is_refused_when_session_store_is_full() {
    let mut limits = test_config().limits;
    limits.max_active_sessions = 2;
    let app = router_with_limits(limits);
    let body = json!({ "categories": ["memory"] });

    for i in 0..2 {
        let peer = format!("203.0.113.{}:51000", 10 + i);
        let (status, _) = send(&app, post_json_from(&peer, "/start-test", body.clone())).await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, response) = send(&app, post_json_from("203.0.113.20:51000", "/start-test", body)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response["error"], "Service unavailable");
}

#[tokio::test]
async fn cors_allows_any_origin() {
    let app = test_router();
    let request = Request::builder()
        .uri("/categories")
        .header("origin", "https://quiz.example")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.headers()["access-control-allow-origin"], "*");
}
