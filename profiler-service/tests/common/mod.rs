#![allow(dead_code)]

use profiler_service::config::{
    GenaiConfig, LimitsConfig, ProfilerConfig, ProviderKind, QuestionBankConfig,
    DEFAULT_GENAI_API_BASE,
};
use profiler_service::models::Question;
use profiler_service::services::providers::mock::{MockBehavior, MockTextProvider};
use profiler_service::services::providers::TextProvider;
use profiler_service::services::QuestionBank;
use profiler_service::startup::{build_router, AppState, Application};
use service_core::config::Config as CoreConfig;
use std::sync::Arc;

pub const CATEGORIES: &[&str] = &["Memory", "Verbal Logic", "Numerical Reasoning"];

pub fn test_config() -> ProfilerConfig {
    ProfilerConfig {
        common: CoreConfig { port: 0 },
        question_bank: QuestionBankConfig {
            path: "data/questions.json".to_string(),
        },
        genai: GenaiConfig {
            provider: ProviderKind::Mock,
            api_key: None,
            text_model: "gemini-2.0-flash".to_string(),
            api_base: DEFAULT_GENAI_API_BASE.to_string(),
            timeout_secs: 5,
        },
        limits: LimitsConfig {
            submit_rate_limit_per_min: 1000,
            start_rate_limit_per_min: 1000,
            max_active_sessions: 1000,
            session_grace_secs: 30,
            trust_forwarded_for: false,
        },
        otlp_endpoint: None,
    }
}

/// 20 questions per category in [`CATEGORIES`]; the correct option of
/// question `id` is `id % 4`.
pub fn test_bank() -> QuestionBank {
    let mut questions = Vec::new();
    let mut id = 1;
    for category in CATEGORIES {
        for _ in 0..20 {
            questions.push(Question {
                id,
                category: category.to_string(),
                question_text: format!("{} question {}", category, id),
                options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                correct_answer_index: (id % 4) as usize,
            });
            id += 1;
        }
    }
    QuestionBank::from_questions(questions).expect("test bank is valid")
}

pub fn correct_option(question_id: u32) -> usize {
    (question_id % 4) as usize
}

pub fn test_state(provider: Arc<dyn TextProvider>) -> AppState {
    AppState::new(&test_config(), test_bank(), provider)
}

pub fn test_router() -> axum::Router {
    build_router(test_state(Arc::new(MockTextProvider::default())))
}

/// Router over the test bank with the given limits and the mock provider.
pub fn router_with_limits(limits: LimitsConfig) -> axum::Router {
    let mut config = test_config();
    config.limits = limits;
    build_router(AppState::new(
        &config,
        test_bank(),
        Arc::new(MockTextProvider::default()),
    ))
}

pub fn failing_router() -> axum::Router {
    build_router(test_state(Arc::new(MockTextProvider::new(MockBehavior::Fail))))
}

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
}

impl TestApp {
    /// Spawn a server on a random port with the given config and provider.
    pub async fn spawn_with(config: ProfilerConfig, provider: Arc<dyn TextProvider>) -> Self {
        Self::spawn_with_bank(config, test_bank(), provider).await
    }

    pub async fn spawn_with_bank(
        config: ProfilerConfig,
        bank: QuestionBank,
        provider: Arc<dyn TextProvider>,
    ) -> Self {
        let app = Application::build_with(config, bank, provider)
            .await
            .expect("Failed to build test application");
        Self::run(app).await
    }

    /// Spawn a server that loads the bundled question bank from disk.
    pub async fn spawn_default() -> Self {
        let app = Application::build(test_config())
            .await
            .expect("Failed to build test application");
        Self::run(app).await
    }

    async fn run(app: Application) -> Self {
        let address = format!("http://127.0.0.1:{}", app.http_port());

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for HTTP server to be ready by polling health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        Self { address, client }
    }
}
