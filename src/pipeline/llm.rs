//! Completion collaborators: the estimator and the instructions writer.
//!
//! Both are plain text-in, text-out calls behind [`CompletionClient`], so the
//! pipeline can be driven by a fake in tests and by any edgequake-llm
//! provider in production.
//!
//! ## Retry Strategy
//!
//! Provider errors and timeouts are usually transient (429, 503, slow cold
//! starts). [`complete_with_retry`] bounds each attempt with a timeout and
//! retries with exponential backoff (`backoff_ms * 2^(attempt-1)`): with the
//! default 500 ms and one retry the worst case is one timeout, a 500 ms
//! pause and a second timeout.

use crate::config::ServiceConfig;
use crate::error::{CompletionError, PatternError};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, warn};

/// Text returned by one successful completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
}

impl Completion {
    /// A completion with no token accounting.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            input_tokens: 0,
            output_tokens: 0,
        }
    }
}

/// A single-prompt completion backend.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// One attempt. Retries and timeouts are applied by the caller.
    async fn complete(&self, prompt: &str) -> Result<Completion, CompletionError>;
}

/// [`CompletionClient`] backed by an edgequake-llm provider.
pub struct ProviderClient {
    provider: Arc<dyn LLMProvider>,
    label: String,
    options: CompletionOptions,
}

impl ProviderClient {
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        label: impl Into<String>,
        temperature: f32,
        max_tokens: usize,
    ) -> Self {
        Self {
            provider,
            label: label.into(),
            options: CompletionOptions {
                temperature: Some(temperature),
                max_tokens: Some(max_tokens),
                ..Default::default()
            },
        }
    }

    /// The estimator client: low temperature, short answers.
    pub fn estimator(provider: Arc<dyn LLMProvider>, config: &ServiceConfig) -> Self {
        Self::new(
            provider,
            "estimator",
            config.temperature,
            config.estimator_max_tokens,
        )
    }

    /// The instructions client: room for a few hundred words.
    pub fn instructions(provider: Arc<dyn LLMProvider>, config: &ServiceConfig) -> Self {
        Self::new(
            provider,
            "instructions",
            config.temperature,
            config.instructions_max_tokens,
        )
    }
}

#[async_trait]
impl CompletionClient for ProviderClient {
    fn name(&self) -> &str {
        &self.label
    }

    async fn complete(&self, prompt: &str) -> Result<Completion, CompletionError> {
        let messages = vec![ChatMessage::user(prompt)];
        let response = self
            .provider
            .chat(&messages, Some(&self.options))
            .await
            .map_err(|e| CompletionError::Provider(e.to_string()))?;
        Ok(Completion {
            text: response.content,
            input_tokens: response.prompt_tokens as usize,
            output_tokens: response.completion_tokens as usize,
        })
    }
}

/// Timeout and retry bounds for one logical completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub backoff: Duration,
    /// Per-attempt limit.
    pub timeout: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff: Duration::from_millis(config.retry_backoff_ms),
            timeout: Duration::from_secs(config.api_timeout_secs),
        }
    }

    /// Delay before retry number `attempt` (1-based).
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.backoff
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

/// Run `prompt` through `client`, bounded by `policy`.
///
/// An empty answer counts as a failed attempt. After the last attempt the
/// most recent failure is returned as [`PatternError::EstimatorFailed`].
pub async fn complete_with_retry(
    client: &dyn CompletionClient,
    prompt: &str,
    policy: &RetryPolicy,
) -> Result<Completion, PatternError> {
    let start = Instant::now();
    let mut last_err: Option<CompletionError> = None;

    for attempt in 0..=policy.max_retries {
        if attempt > 0 {
            let backoff = policy.backoff_for(attempt);
            warn!(
                "{}: retry {}/{} after {:?}",
                client.name(),
                attempt,
                policy.max_retries,
                backoff
            );
            sleep(backoff).await;
        }

        let outcome = match timeout(policy.timeout, client.complete(prompt)).await {
            Ok(Ok(c)) if c.text.trim().is_empty() => Err(CompletionError::Empty),
            Ok(result) => result,
            Err(_) => Err(CompletionError::Timeout {
                secs: policy.timeout.as_secs(),
            }),
        };

        match outcome {
            Ok(completion) => {
                debug!(
                    "{}: {} input tokens, {} output tokens, {:?}",
                    client.name(),
                    completion.input_tokens,
                    completion.output_tokens,
                    start.elapsed()
                );
                return Ok(completion);
            }
            Err(e) => {
                warn!("{}: attempt {} failed: {}", client.name(), attempt + 1, e);
                last_err = Some(e);
            }
        }
    }

    Err(PatternError::EstimatorFailed {
        attempts: policy.max_retries + 1,
        detail: last_err
            .map(|e| e.to_string())
            .unwrap_or_else(|| "unknown error".to_string()),
    })
}

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, PatternError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        PatternError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most to least specific:
///
/// 1. `config.provider`, used as-is;
/// 2. `config.provider_name` with `config.model` (or the default model);
/// 3. `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`, when both are set;
/// 4. OpenAI, when `OPENAI_API_KEY` is set;
/// 5. [`ProviderFactory::from_env`] auto-detection.
pub fn resolve_provider(config: &ServiceConfig) -> Result<Arc<dyn LLMProvider>, PatternError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        return create_provider(name, config.model_or_default());
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    if let Ok(key) = std::env::var("OPENAI_API_KEY") {
        if !key.is_empty() {
            return create_provider("openai", config.model_or_default());
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| PatternError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}
