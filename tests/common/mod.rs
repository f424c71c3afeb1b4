//! Shared fakes for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tailorfit::{Completion, CompletionClient, CompletionError, PatternService, ServiceConfig};

/// Answers every prompt with the same text and records the prompts.
pub struct Scripted {
    answer: Result<String, CompletionError>,
    pub prompts: Mutex<Vec<String>>,
}

impl Scripted {
    pub fn answering(text: &str) -> Arc<Self> {
        Arc::new(Self {
            answer: Ok(text.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            answer: Err(CompletionError::Provider("503 Service Unavailable".into())),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn last_prompt(&self) -> String {
        self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl CompletionClient for Scripted {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, prompt: &str) -> Result<Completion, CompletionError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.answer.clone().map(Completion::text)
    }
}

/// Route library logs to the test harness; `RUST_LOG` picks the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// Config rooted at `root` with fast retries.
pub fn test_config(root: &Path) -> ServiceConfig {
    ServiceConfig::builder()
        .output_dir(root)
        .retry_backoff_ms(1)
        .api_timeout_secs(5)
        .build()
        .unwrap()
}

pub fn service_with(
    config: ServiceConfig,
    estimator: Arc<Scripted>,
    instructions: Arc<Scripted>,
) -> PatternService {
    PatternService::new(config, estimator, instructions)
}

pub const DRESS_SVG: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" width="60cm" height="90cm" viewBox="0 0 600 900">
  <g id="front"><path id="front-outline" d="M0 0 L100 0 L100 200 Z"/><text x="10" y="20">Front bodice</text></g>
  <g id="back"><path d="M200 0 L300 0 L300 200 Z"/><text x="210" y="20">Back</text></g>
</svg>"#;
