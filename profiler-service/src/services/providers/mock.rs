//! Mock provider implementation for development and tests.

use super::{FinishReason, GenerationParams, ProviderError, ProviderResponse, TextProvider};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

/// What the mock provider answers with.
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// A well-formed analysis document.
    Analysis,
    /// Fixed text, returned verbatim.
    Text(String),
    /// Always fail as if the upstream API errored.
    Fail,
}

/// Mock text provider.
pub struct MockTextProvider {
    behavior: MockBehavior,
    calls: AtomicUsize,
}

impl MockTextProvider {
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `generate` calls seen so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockTextProvider {
    fn default() -> Self {
        Self::new(MockBehavior::Analysis)
    }
}

const MOCK_ANALYSIS: &str = r#"{
  "title": "Your Profile Analysis",
  "overall_summary": "You showed steady reasoning across the selected skills.",
  "strengths_analysis": "Your strongest area reflects quick, accurate thinking.",
  "growth_analysis": "Your lowest-scoring area is a new challenge worth exploring.",
  "action_item": "Try a short logic puzzle each day this week."
}"#;

#[async_trait]
impl TextProvider for MockTextProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock"
    }

    async fn generate(
        &self,
        _system_prompt: &str,
        prompt: &str,
        _params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let text = match &self.behavior {
            MockBehavior::Analysis => MOCK_ANALYSIS.to_string(),
            MockBehavior::Text(text) => text.clone(),
            MockBehavior::Fail => {
                return Err(ProviderError::ApiError("Mock provider failure".to_string()))
            }
        };

        Ok(ProviderResponse {
            text,
            input_tokens: prompt.len() as i32 / 4,
            output_tokens: 64,
            finish_reason: FinishReason::Complete,
        })
    }

    async fn health_check(&self) -> Result<(), ProviderError> {
        match self.behavior {
            MockBehavior::Fail => Err(ProviderError::NotConfigured(
                "Mock provider set to fail".to_string(),
            )),
            _ => Ok(()),
        }
    }
}
