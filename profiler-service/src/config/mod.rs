use serde::Deserialize;
use service_core::config::{self as core_config, get_env, get_optional_env, is_production};
use service_core::error::AppError;

/// Default Gemini REST endpoint.
pub const DEFAULT_GENAI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

const DEFAULT_GENAI_TIMEOUT_SECS: u64 = 60;
const DEFAULT_SUBMIT_RATE_LIMIT_PER_MIN: u32 = 30;
const DEFAULT_START_RATE_LIMIT_PER_MIN: u32 = 20;
const DEFAULT_MAX_ACTIVE_SESSIONS: usize = 10_000;
const DEFAULT_SESSION_GRACE_SECS: u64 = 30;

#[derive(Debug, Clone, Deserialize)]
pub struct ProfilerConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub question_bank: QuestionBankConfig,
    pub genai: GenaiConfig,
    pub limits: LimitsConfig,
    pub otlp_endpoint: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuestionBankConfig {
    /// Path to the JSON question bank.
    pub path: String,
}

/// Which text generation backend writes the analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gemini,
    Mock,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GenaiConfig {
    pub provider: ProviderKind,
    /// Required for [`ProviderKind::Gemini`].
    pub api_key: Option<String>,
    pub text_model: String,
    pub api_base: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Per-IP budget for `/submit-test`; each submission costs one model call.
    pub submit_rate_limit_per_min: u32,
    /// Per-IP budget for `/start-test`.
    pub start_rate_limit_per_min: u32,
    /// Live test sessions held at once; further starts get 503.
    pub max_active_sessions: usize,
    /// Extra time accepted after a test's deadline before it is refused.
    pub session_grace_secs: u64,
    /// Key rate limits on `x-forwarded-for` instead of the socket peer.
    /// Only safe behind a proxy that sets the header itself.
    pub trust_forwarded_for: bool,
}

impl ProfilerConfig {
    pub fn load() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;
        let is_prod = is_production();

        let api_key = match get_optional_env("GOOGLE_API_KEY", false)? {
            Some(key) => Some(key),
            None => get_optional_env("GEMINI_API_KEY", false)?,
        };
        let provider = select_provider(
            &get_env("GENAI_PROVIDER", Some("gemini"), is_prod)?,
            api_key.as_deref(),
        )?;

        Ok(ProfilerConfig {
            common: common_config,
            question_bank: QuestionBankConfig {
                path: get_env("QUESTION_BANK_PATH", Some("data/questions.json"), false)?,
            },
            genai: GenaiConfig {
                provider,
                api_key,
                text_model: get_env("GENAI_TEXT_MODEL", Some("gemini-2.0-flash"), false)?,
                api_base: get_env("GENAI_API_BASE", Some(DEFAULT_GENAI_API_BASE), false)?,
                timeout_secs: parse_or(
                    "GENAI_TIMEOUT_SECS",
                    DEFAULT_GENAI_TIMEOUT_SECS,
                )?,
            },
            limits: LimitsConfig {
                submit_rate_limit_per_min: parse_or(
                    "SUBMIT_RATE_LIMIT_PER_MIN",
                    DEFAULT_SUBMIT_RATE_LIMIT_PER_MIN,
                )?,
                start_rate_limit_per_min: parse_or(
                    "START_RATE_LIMIT_PER_MIN",
                    DEFAULT_START_RATE_LIMIT_PER_MIN,
                )?,
                max_active_sessions: parse_or(
                    "MAX_ACTIVE_SESSIONS",
                    DEFAULT_MAX_ACTIVE_SESSIONS,
                )?,
                session_grace_secs: parse_or("SESSION_GRACE_SECS", DEFAULT_SESSION_GRACE_SECS)?,
                trust_forwarded_for: parse_or("TRUST_FORWARDED_FOR", false)?,
            },
            otlp_endpoint: get_optional_env("OTLP_ENDPOINT", false)?,
        })
    }
}

/// The mock provider is only used when asked for by name.
fn select_provider(requested: &str, api_key: Option<&str>) -> Result<ProviderKind, AppError> {
    match requested {
        "mock" => {
            tracing::warn!("GENAI_PROVIDER=mock, analyses will be canned text");
            Ok(ProviderKind::Mock)
        }
        "gemini" if api_key.is_some() => Ok(ProviderKind::Gemini),
        "gemini" => Err(AppError::ConfigError(anyhow::anyhow!(
            "GENAI_PROVIDER=gemini requires GOOGLE_API_KEY or GEMINI_API_KEY"
        ))),
        other => Err(AppError::ConfigError(anyhow::anyhow!(
            "Unknown GENAI_PROVIDER '{}', expected 'gemini' or 'mock'",
            other
        ))),
    }
}

fn parse_or<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr + ToString,
    T::Err: std::fmt::Display,
{
    let raw = get_env(key, Some(&default.to_string()), false)?;
    raw.parse().map_err(|e: T::Err| {
        AppError::ConfigError(anyhow::anyhow!("{} has invalid value '{}': {}", key, raw, e))
    })
}
