//! Application startup and lifecycle management.
//!
//! Builds shared state from configuration, wires the HTTP router and runs
//! the server until a shutdown signal arrives.

use crate::config::{ProfilerConfig, ProviderKind};
use crate::handlers::{
    get_test, health_check, list_categories, metrics, readiness_check, start_test, submit_test,
};
use crate::middleware::metrics_middleware;
use crate::services::providers::gemini::{GeminiConfig, GeminiTextProvider};
use crate::services::providers::mock::MockTextProvider;
use crate::services::providers::TextProvider;
use crate::services::{metrics as service_metrics, Analyst, QuestionBank, SessionStore};
use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use service_core::error::AppError;
use service_core::middleware::{
    ip_rate_limit_middleware, request_id_middleware, security_headers_middleware, IpRateLimit,
    REQUEST_ID_HEADER,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub bank: Arc<QuestionBank>,
    pub sessions: SessionStore,
    pub analyst: Analyst,
    pub start_limit: IpRateLimit,
    pub submit_limit: IpRateLimit,
}

impl AppState {
    pub fn new(
        config: &ProfilerConfig,
        bank: QuestionBank,
        provider: Arc<dyn TextProvider>,
    ) -> Self {
        let limits = &config.limits;
        let sessions = SessionStore::new(
            Duration::from_secs(limits.session_grace_secs),
            limits.max_active_sessions,
        );

        Self {
            bank: Arc::new(bank),
            sessions,
            analyst: Analyst::new(provider),
            start_limit: IpRateLimit::new(
                limits.start_rate_limit_per_min,
                60,
                limits.trust_forwarded_for,
            ),
            submit_limit: IpRateLimit::new(
                limits.submit_rate_limit_per_min,
                60,
                limits.trust_forwarded_for,
            ),
        }
    }
}

/// Build the text provider selected by configuration.
pub fn build_provider(config: &ProfilerConfig) -> Result<Arc<dyn TextProvider>, AppError> {
    match config.genai.provider {
        ProviderKind::Mock => {
            tracing::info!("Using mock analysis provider");
            Ok(Arc::new(MockTextProvider::default()))
        }
        ProviderKind::Gemini => {
            let gemini_config = GeminiConfig {
                api_key: config.genai.api_key.clone().unwrap_or_default(),
                model: config.genai.text_model.clone(),
                api_base: config.genai.api_base.clone(),
                timeout: Duration::from_secs(config.genai.timeout_secs),
            };
            let provider = GeminiTextProvider::new(gemini_config)
                .map_err(|e| AppError::ConfigError(anyhow::anyhow!(e)))?;

            tracing::info!(
                model = %config.genai.text_model,
                "Initialized Gemini text provider"
            );
            Ok(Arc::new(provider))
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let start_route = post(start_test).layer(from_fn_with_state(
        state.start_limit.clone(),
        ip_rate_limit_middleware,
    ));
    let submit_route = post(submit_test).layer(from_fn_with_state(
        state.submit_limit.clone(),
        ip_rate_limit_middleware,
    ));

    // Browser clients are served from arbitrary origins
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics))
        .route("/categories", get(list_categories))
        .route("/start-test", start_route)
        .route("/submit-test", submit_route)
        .route("/tests/:id", get(get_test))
        .layer(from_fn(metrics_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get(REQUEST_ID_HEADER)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(cors)
        .with_state(state)
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

/// Application container for managing server lifecycle.
pub struct Application {
    http_port: u16,
    http_listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: ProfilerConfig) -> Result<Self, AppError> {
        let bank = QuestionBank::load(&config.question_bank.path).map_err(|e| {
            tracing::error!("Failed to load question bank: {}", e);
            AppError::ConfigError(anyhow::anyhow!(e))
        })?;

        let provider = build_provider(&config)?;
        // A bad key or model should not stop quizzes from being served
        if let Err(e) = provider.health_check().await {
            tracing::warn!(
                provider = provider.name(),
                error = %e,
                "Analysis provider health check failed"
            );
        }
        Self::build_with(config, bank, provider).await
    }

    /// Build with an explicit bank and provider (used by tests).
    pub async fn build_with(
        config: ProfilerConfig,
        bank: QuestionBank,
        provider: Arc<dyn TextProvider>,
    ) -> Result<Self, AppError> {
        service_metrics::init_metrics();

        // Bind HTTP listener (port 0 = random port for testing)
        let http_addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let http_listener = TcpListener::bind(http_addr).await.map_err(|e| {
            tracing::error!("Failed to bind HTTP listener to {}: {}", http_addr, e);
            AppError::from(e)
        })?;
        let http_port = http_listener.local_addr()?.port();

        tracing::info!("Profiler service: HTTP on port {}", http_port);

        Ok(Self {
            http_port,
            http_listener,
            state: AppState::new(&config, bank, provider),
        })
    }

    /// Get the HTTP port the server is listening on.
    pub fn http_port(&self) -> u16 {
        self.http_port
    }

    /// Run the application until a shutdown signal is received.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let sweeper = self.state.sessions.spawn_sweeper(SESSION_SWEEP_INTERVAL);
        let router = build_router(self.state);

        let result = axum::serve(
            self.http_listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await;

        sweeper.abort();

        result.map_err(|e| {
            tracing::error!("HTTP server error: {}", e);
            std::io::Error::other(format!("HTTP server error: {}", e))
        })
    }
}
